//! Services module
//!
//! This module contains business logic services

pub mod dispatcher;
pub mod event;
pub mod notification;
pub mod participation;
pub mod push;
pub mod push_encryption;
pub mod reminder;
pub mod web_push;

// Re-export commonly used services
pub use dispatcher::{Notifier, NotificationDispatcher, SideEffect, Delivery};
pub use event::{EventService, EventUpdate};
pub use notification::NotificationService;
pub use participation::{ParticipationService, BulkCompletion};
pub use push::{PushService, PushTransport, PushPayload, PushReport, DeliveryError};
pub use reminder::{ReminderService, SweepReport};
pub use web_push::WebPushTransport;

use std::sync::Arc;
use tokio::sync::mpsc;
use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::i18n::I18n;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub events: EventService,
    pub participation: ParticipationService,
    pub notifications: NotificationService,
    pub push: PushService,
    pub reminders: ReminderService,
    pub dispatcher: NotificationDispatcher,
}

impl ServiceFactory {
    /// Wire services over the given stores. Push uses the Web Push transport when enabled.
    pub fn new(settings: &Settings, database: &DatabaseService, i18n: Arc<I18n>) -> Result<(Self, mpsc::UnboundedReceiver<SideEffect>)> {
        let push = if settings.push.enabled {
            let transport = Arc::new(WebPushTransport::new(&settings.push)?);
            PushService::new(database.users.clone(), transport, &settings.push)
        } else {
            PushService::disabled(database.users.clone())
        };
        Ok(Self::with_push(settings, database, i18n, push))
    }

    /// Wire services with an explicit push service
    pub fn with_push(
        settings: &Settings,
        database: &DatabaseService,
        i18n: Arc<I18n>,
        push: PushService,
    ) -> (Self, mpsc::UnboundedReceiver<SideEffect>) {
        let (notifier, receiver) = Notifier::channel();
        let notifications = NotificationService::new(database.notifications.clone());
        let participation = ParticipationService::new(database.events.clone(), notifier);
        let events = EventService::new(database.events.clone(), participation.clone());
        let reminders = ReminderService::new(database.events.clone(), push.clone(), i18n.clone(), &settings.reminders);
        let dispatcher = NotificationDispatcher::new(notifications.clone(), push.clone(), database.users.clone(), i18n);

        let factory = Self {
            events,
            participation,
            notifications,
            push,
            reminders,
            dispatcher,
        };
        (factory, receiver)
    }
}
