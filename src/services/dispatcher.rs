//! Notification dispatcher
//!
//! The participation engine publishes [`SideEffect`] messages through a
//! [`Notifier`] and never waits for them. A background
//! [`NotificationDispatcher`] renders localized text for each recipient,
//! persists the inbox record and sends the push message. Failures are logged
//! and dropped.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use crate::database::UserStore;
use crate::i18n::{I18n, TranslationParams};
use crate::models::{Event, NewNotification, NotificationType, ReviewDecision};
use crate::services::notification::NotificationService;
use crate::services::push::PushService;
use crate::utils::helpers::{event_link, registrations_link};
use crate::utils::logging::log_delivery_failure;

/// A participant transition whose recipients must be told about it
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    Registered { event: Event, volunteer_id: i64 },
    Unregistered { event: Event, volunteer_id: i64 },
    Reviewed { event: Event, volunteer_id: i64, decision: ReviewDecision },
    CheckedIn { event: Event, volunteer_id: i64 },
    Completed { event: Event, volunteer_id: i64 },
}

impl SideEffect {
    pub fn event(&self) -> &Event {
        match self {
            SideEffect::Registered { event, .. }
            | SideEffect::Unregistered { event, .. }
            | SideEffect::Reviewed { event, .. }
            | SideEffect::CheckedIn { event, .. }
            | SideEffect::Completed { event, .. } => event,
        }
    }

    pub fn volunteer_id(&self) -> i64 {
        match self {
            SideEffect::Registered { volunteer_id, .. }
            | SideEffect::Unregistered { volunteer_id, .. }
            | SideEffect::Reviewed { volunteer_id, .. }
            | SideEffect::CheckedIn { volunteer_id, .. }
            | SideEffect::Completed { volunteer_id, .. } => *volunteer_id,
        }
    }

    /// Everything to deliver for this side effect
    pub fn deliveries(&self) -> Vec<Delivery> {
        let event = self.event();
        let volunteer_id = self.volunteer_id();
        let to_volunteer = |notification_type: NotificationType, push: bool| Delivery {
            recipient: volunteer_id,
            template: format!("notifications.{}", notification_type.key()),
            record: Some(notification_type),
            push,
            link: event_link(event.id),
            related_user_id: None,
        };

        match self {
            SideEffect::Registered { .. } => vec![
                to_volunteer(NotificationType::RegistrationPending, false),
                Delivery {
                    recipient: event.created_by,
                    template: format!("notifications.{}", NotificationType::RegistrationReceived.key()),
                    record: Some(NotificationType::RegistrationReceived),
                    push: true,
                    link: registrations_link(event.id),
                    related_user_id: Some(volunteer_id),
                },
            ],
            SideEffect::Unregistered { .. } => vec![Delivery {
                recipient: volunteer_id,
                template: "push.registration_cancelled".to_string(),
                record: None,
                push: true,
                link: event_link(event.id),
                related_user_id: None,
            }],
            SideEffect::Reviewed { decision: ReviewDecision::Approve, .. } => {
                vec![to_volunteer(NotificationType::RegistrationApproved, true)]
            }
            SideEffect::Reviewed { decision: ReviewDecision::Reject, .. } => {
                vec![to_volunteer(NotificationType::RegistrationRejected, true)]
            }
            SideEffect::CheckedIn { .. } => vec![to_volunteer(NotificationType::CheckedIn, false)],
            SideEffect::Completed { .. } => vec![to_volunteer(NotificationType::Completed, true)],
        }
    }
}

/// One message to one recipient
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub recipient: i64,
    /// Translation key prefix holding `title` and `message`
    pub template: String,
    /// Inbox record type; `None` for push-only messages
    pub record: Option<NotificationType>,
    pub push: bool,
    pub link: String,
    pub related_user_id: Option<i64>,
}

/// Sending half of the side-effect queue
#[derive(Clone)]
pub struct Notifier {
    sender: mpsc::UnboundedSender<SideEffect>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SideEffect>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Fire and forget
    pub fn publish(&self, effect: SideEffect) {
        if let Err(e) = self.sender.send(effect) {
            warn!(effect = ?e.0, "Notification dispatcher is gone, dropping side effect");
        }
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    notifications: NotificationService,
    push: PushService,
    users: Arc<dyn UserStore>,
    i18n: Arc<I18n>,
}

impl NotificationDispatcher {
    pub fn new(notifications: NotificationService, push: PushService, users: Arc<dyn UserStore>, i18n: Arc<I18n>) -> Self {
        Self { notifications, push, users, i18n }
    }

    /// Consume side effects until cancelled, then drain what is already queued
    pub async fn run(self, mut receiver: mpsc::UnboundedReceiver<SideEffect>, cancel: CancellationToken) {
        info!("Notification dispatcher started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    receiver.close();
                    while let Some(effect) = receiver.recv().await {
                        self.handle(effect).await;
                    }
                    break;
                }
                effect = receiver.recv() => match effect {
                    Some(effect) => self.handle(effect).await,
                    None => break,
                },
            }
        }

        info!("Notification dispatcher stopped");
    }

    /// Deliver every message of one side effect
    pub async fn handle(&self, effect: SideEffect) {
        let event = effect.event();
        let volunteer_name = self.display_name(effect.volunteer_id()).await;

        for delivery in effect.deliveries() {
            let lang = self.language_of(delivery.recipient).await;
            let mut params = TranslationParams::new();
            params.insert("event_title".to_string(), event.title.clone());
            params.insert("volunteer".to_string(), volunteer_name.clone());
            params.insert("hours".to_string(), event.hours.to_string());

            let title = self.i18n.t(&format!("{}.title", delivery.template), &lang, Some(&params));
            let message = self.i18n.t(&format!("{}.message", delivery.template), &lang, Some(&params));

            if let Some(notification_type) = delivery.record {
                let record = NewNotification {
                    user_id: delivery.recipient,
                    notification_type,
                    title: title.clone(),
                    message: message.clone(),
                    event_id: Some(event.id),
                    related_user_id: delivery.related_user_id,
                    post_id: None,
                    link: Some(delivery.link.clone()),
                };
                if let Err(e) = self.notifications.emit(record).await {
                    log_delivery_failure("notification", delivery.recipient, &e.to_string(), Some(notification_type.key()));
                }
            }

            if delivery.push {
                let report = self.push.send_to_user(delivery.recipient, &title, &message, Some(&delivery.link)).await;
                debug!(
                    user_id = delivery.recipient,
                    sent = report.sent,
                    failed = report.failed,
                    pruned = report.pruned,
                    "Push delivered"
                );
            }
        }
    }

    async fn language_of(&self, user_id: i64) -> String {
        match self.users.find_user(user_id).await {
            Ok(user) => self.i18n.resolve_language(user.as_ref().map(|u| u.language_code.as_str())),
            Err(e) => {
                log_delivery_failure("notification", user_id, &e.to_string(), Some("loading language"));
                self.i18n.default_language().to_string()
            }
        }
    }

    async fn display_name(&self, user_id: i64) -> String {
        match self.users.find_user(user_id).await {
            Ok(Some(user)) => user.name,
            _ => format!("#{}", user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use crate::models::{EventCategory, EventStatus};

    fn event() -> Event {
        let now = Utc::now();
        Event {
            id: 4,
            title: "River cleanup".to_string(),
            organization: "Blue Water".to_string(),
            description: "Clean the river bank".to_string(),
            location: "Hue".to_string(),
            event_date: now + Duration::days(1),
            category: EventCategory::Environment,
            status: EventStatus::Upcoming,
            max_participants: 20,
            registered: 1,
            hours: 5,
            image_url: None,
            created_by: 1,
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_registration_fans_out_to_volunteer_and_creator() {
        let deliveries = SideEffect::Registered { event: event(), volunteer_id: 9 }.deliveries();
        assert_eq!(deliveries.len(), 2);
        assert_eq!(deliveries[0].recipient, 9);
        assert_eq!(deliveries[0].record, Some(NotificationType::RegistrationPending));
        assert!(!deliveries[0].push);
        assert_eq!(deliveries[1].recipient, 1);
        assert_eq!(deliveries[1].record, Some(NotificationType::RegistrationReceived));
        assert!(deliveries[1].push);
        assert_eq!(deliveries[1].related_user_id, Some(9));
        assert_eq!(deliveries[1].link, "/manage/events/4/registrations");
    }

    #[test]
    fn test_push_coverage_per_transition() {
        let unregistered = SideEffect::Unregistered { event: event(), volunteer_id: 9 }.deliveries();
        assert_eq!(unregistered[0].record, None);
        assert!(unregistered[0].push);

        let checked_in = SideEffect::CheckedIn { event: event(), volunteer_id: 9 }.deliveries();
        assert!(!checked_in[0].push);

        let rejected = SideEffect::Reviewed { event: event(), volunteer_id: 9, decision: ReviewDecision::Reject }.deliveries();
        assert_eq!(rejected[0].record, Some(NotificationType::RegistrationRejected));
        assert!(rejected[0].push);
    }

    #[tokio::test]
    async fn test_publish_after_receiver_dropped_does_not_panic() {
        let (notifier, receiver) = Notifier::channel();
        drop(receiver);
        notifier.publish(SideEffect::CheckedIn { event: event(), volunteer_id: 9 });
    }
}
