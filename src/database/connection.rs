//! Database connection management

use sqlx::{Pool, Postgres};
use std::time::{Duration, Instant};
use crate::config::DatabaseConfig;
use crate::utils::errors::VolunteerHubError;
use crate::utils::logging::log_database_operation;

pub type DatabasePool = Pool<Postgres>;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);
const MAX_LIFETIME: Duration = Duration::from_secs(1800);

/// Create a new database connection pool
pub async fn create_pool(config: &DatabaseConfig) -> Result<DatabasePool, VolunteerHubError> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(Some(IDLE_TIMEOUT))
        .max_lifetime(Some(MAX_LIFETIME))
        .connect(&config.url)
        .await?;

    // Test the connection
    health_check(&pool).await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Run database migrations
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), VolunteerHubError> {
    tracing::info!("Running database migrations...");

    let started = Instant::now();
    let result = sqlx::migrate!("./migrations").run(pool).await;
    log_database_operation("migrate", "_sqlx_migrations", started.elapsed().as_millis() as u64, result.is_ok());
    result?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// Check database health
pub async fn health_check(pool: &DatabasePool) -> Result<(), VolunteerHubError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await?;

    Ok(())
}
