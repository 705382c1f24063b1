//! VolunteerHub backend
//!
//! Main application entry point

use std::sync::Arc;
use std::time::Duration;
use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, error};

use volunteer_hub::{
    config::Settings,
    utils::logging,
    database::{DatabaseService, create_pool, run_migrations},
    services::ServiceFactory,
    handlers::{AppState, router},
    i18n::I18n,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("loading configuration")?;
    settings.validate()?;

    // Held until exit so buffered log lines are flushed
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", volunteer_hub::info());

    info!("Connecting to database...");
    let pool = create_pool(&settings.database).await?;
    run_migrations(&pool).await?;
    let database = DatabaseService::new(pool);

    info!("Loading translations...");
    let i18n = Arc::new(I18n::load(&settings.i18n).await?);

    info!("Initializing services...");
    let (services, side_effects) = ServiceFactory::new(&settings, &database, i18n.clone())?;
    let cancel = CancellationToken::new();

    let dispatcher = tokio::spawn(services.dispatcher.clone().run(side_effects, cancel.clone()));
    let reminders = if settings.reminders.enabled {
        let interval = Duration::from_secs(settings.reminders.interval_seconds);
        Some(tokio::spawn(services.reminders.clone().run(interval, cancel.clone())))
    } else {
        info!("Reminder sweep disabled");
        None
    };

    let address = settings.bind_address();
    let state = AppState {
        settings: Arc::new(settings),
        database,
        services,
        i18n,
    };

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {}", address))?;
    info!("Listening on {}", address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
        })
        .await?;

    // In-flight requests are done; their side effects are queued for the drain
    cancel.cancel();
    if let Err(e) = dispatcher.await {
        error!(error = %e, "Notification dispatcher task failed");
    }
    if let Some(reminders) = reminders {
        if let Err(e) = reminders.await {
            error!(error = %e, "Reminder task failed");
        }
    }

    info!("VolunteerHub has been shut down.");
    Ok(())
}
