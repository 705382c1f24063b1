//! Test context for unified test setup
//!
//! Builds the full service graph over an in-memory store with a recording
//! push transport, so scenarios run without PostgreSQL or a push service.
//! Event storage goes through a [`FaultyEventStore`] so tests can break
//! single events or participants.

use std::sync::Arc;
use tokio::sync::mpsc;
use volunteer_hub::config::Settings;
use volunteer_hub::database::{DatabaseService, MemoryStore, NotificationStore};
use volunteer_hub::handlers::AppState;
use volunteer_hub::i18n::I18n;
use volunteer_hub::models::{Actor, CreateEventRequest, CreateUserRequest, Event, Role, User};
use volunteer_hub::services::{PushService, ServiceFactory, SideEffect};

use super::faulty_store::FaultyEventStore;
use super::push_mock::RecordingPushTransport;
use super::test_data::{event_request, subscription, test_push_config, test_settings};

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    /// Event store the services use; healthy until faults are injected
    pub faults: Arc<FaultyEventStore>,
    pub database: DatabaseService,
    pub services: ServiceFactory,
    pub side_effects: mpsc::UnboundedReceiver<SideEffect>,
    pub push: Arc<RecordingPushTransport>,
    pub settings: Settings,
    pub i18n: Arc<I18n>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Context whose inbox writes go to `notifications` instead of the memory store
    pub fn with_notification_store(notifications: Arc<dyn NotificationStore>) -> Self {
        Self::build(Some(notifications))
    }

    fn build(notifications: Option<Arc<dyn NotificationStore>>) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let settings = test_settings();
        let store = Arc::new(MemoryStore::new());
        let faults = Arc::new(FaultyEventStore::new(store.clone()));
        let mut database = DatabaseService::in_memory(store.clone());
        database.events = faults.clone();
        if let Some(notifications) = notifications {
            database = database.with_notification_store(notifications);
        }

        let i18n = Arc::new(I18n::new(&settings.i18n).expect("Failed to load translations"));
        let push = Arc::new(RecordingPushTransport::new());
        let push_service = PushService::new(database.users.clone(), push.clone(), &test_push_config());
        let (services, side_effects) = ServiceFactory::with_push(&settings, &database, i18n.clone(), push_service);

        Self {
            store,
            faults,
            database,
            services,
            side_effects,
            push,
            settings,
            i18n,
        }
    }

    pub async fn create_user(&self, name: &str, role: Role, language: &str) -> User {
        self.database
            .users
            .create_user(CreateUserRequest {
                name: name.to_string(),
                email: format!("{}@volunteerhub.test", name.to_lowercase()),
                role: Some(role),
                language_code: Some(language.to_string()),
            })
            .await
            .expect("Failed to create user")
    }

    pub async fn volunteer(&self, name: &str) -> User {
        self.create_user(name, Role::Volunteer, "en").await
    }

    pub async fn manager(&self, name: &str) -> User {
        self.create_user(name, Role::EventManager, "en").await
    }

    pub async fn create_event(&self, creator: &User, max_participants: i32) -> Event {
        self.create_event_from(creator, event_request(max_participants)).await
    }

    pub async fn create_event_from(&self, creator: &User, request: CreateEventRequest) -> Event {
        self.services
            .events
            .create(&actor(creator), request)
            .await
            .expect("Failed to create event")
    }

    /// Rewrite a stored event in place, bypassing validation
    pub async fn alter_event(&self, event_id: i64, change: impl FnOnce(&mut Event)) -> Event {
        let mut event = self.event(event_id).await;
        change(&mut event);
        self.store.put_event(event.clone()).await;
        event
    }

    pub async fn event(&self, event_id: i64) -> Event {
        self.database
            .events
            .find_event(event_id)
            .await
            .expect("Failed to load event")
            .expect("Event missing")
    }

    /// Give the user one push subscription and return its endpoint
    pub async fn subscribe(&self, user: &User) -> String {
        let endpoint = format!("https://push.volunteerhub.test/{}", user.id);
        self.services
            .push
            .subscribe(&actor(user), subscription(&endpoint))
            .await
            .expect("Failed to subscribe");
        endpoint
    }

    /// Deliver every queued side effect, returning how many there were
    pub async fn dispatch_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(effect) = self.side_effects.try_recv() {
            self.services.dispatcher.handle(effect).await;
            handled += 1;
        }
        handled
    }

    /// Drop queued side effects without delivering them
    pub fn discard_pending(&mut self) -> Vec<SideEffect> {
        let mut effects = Vec::new();
        while let Ok(effect) = self.side_effects.try_recv() {
            effects.push(effect);
        }
        effects
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            settings: Arc::new(self.settings.clone()),
            database: self.database.clone(),
            services: self.services.clone(),
            i18n: self.i18n.clone(),
        }
    }
}

pub fn actor(user: &User) -> Actor {
    Actor::new(user.id, user.role)
}
