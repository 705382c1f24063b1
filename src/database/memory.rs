//! In-memory store
//!
//! Implements every store trait over plain collections behind one async lock.
//! Each trait method holds the lock for its whole body, which gives the same
//! atomicity the PostgreSQL repositories get from conditional statements.

use std::collections::{BTreeMap, HashMap};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use crate::database::store::{EventStore, InsertOutcome, NotificationStore, UserStore};
use crate::models::*;
use crate::utils::errors::Result;

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    subscriptions: BTreeMap<i64, PushSubscription>,
    events: BTreeMap<i64, Event>,
    participants: HashMap<(i64, i64), Participant>,
    notifications: BTreeMap<i64, Notification>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of participant rows of an event
    pub async fn participant_count(&self, event_id: i64) -> usize {
        let tables = self.tables.lock().await;
        tables.participants.keys().filter(|(event, _)| *event == event_id).count()
    }

    /// Overwrite a stored event, for arranging test scenarios
    pub async fn put_event(&self, event: Event) {
        let mut tables = self.tables.lock().await;
        tables.events.insert(event.id, event);
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn create_event(&self, request: CreateEventRequest, created_by: i64) -> Result<Event> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let event = Event {
            id: tables.next_id(),
            title: request.title,
            organization: request.organization,
            description: request.description,
            location: request.location,
            event_date: request.event_date,
            category: request.category,
            status: EventStatus::Upcoming,
            max_participants: request.max_participants,
            registered: 0,
            hours: request.hours,
            image_url: request.image_url,
            created_by,
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        };
        tables.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn find_event(&self, event_id: i64) -> Result<Option<Event>> {
        Ok(self.tables.lock().await.events.get(&event_id).cloned())
    }

    async fn update_event(&self, event_id: i64, request: UpdateEventRequest) -> Result<Option<Event>> {
        let mut tables = self.tables.lock().await;
        let Some(event) = tables.events.get_mut(&event_id) else {
            return Ok(None);
        };
        if request.max_participants.is_some_and(|max| max < event.registered) {
            return Ok(None);
        }

        if let Some(title) = request.title {
            event.title = title;
        }
        if let Some(organization) = request.organization {
            event.organization = organization;
        }
        if let Some(description) = request.description {
            event.description = description;
        }
        if let Some(location) = request.location {
            event.location = location;
        }
        if let Some(date) = request.event_date {
            if date != event.event_date {
                event.reminder_sent = false;
            }
            event.event_date = date;
        }
        if let Some(category) = request.category {
            event.category = category;
        }
        if let Some(status) = request.status {
            event.status = status;
        }
        if let Some(max) = request.max_participants {
            event.max_participants = max;
        }
        if let Some(hours) = request.hours {
            event.hours = hours;
        }
        if let Some(url) = request.image_url {
            event.image_url = Some(url);
        }
        event.updated_at = Utc::now();
        Ok(Some(event.clone()))
    }

    async fn delete_event(&self, event_id: i64) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        if tables.events.remove(&event_id).is_none() {
            return Ok(false);
        }
        tables.participants.retain(|(event, _), _| *event != event_id);
        for notification in tables.notifications.values_mut() {
            if notification.event_id == Some(event_id) {
                notification.event_id = None;
            }
        }
        Ok(true)
    }

    async fn list_events(&self, filter: &EventFilter, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let tables = self.tables.lock().await;
        let mut events: Vec<Event> = tables
            .events
            .values()
            .filter(|e| filter.category.map_or(true, |c| e.category == c))
            .filter(|e| filter.status.map_or(true, |s| e.status == s))
            .filter(|e| !filter.upcoming_only || (e.status == EventStatus::Upcoming && e.event_date > now))
            .filter(|e| filter.created_by.map_or(true, |id| e.created_by == id))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.event_date.cmp(&b.event_date).then(a.id.cmp(&b.id)));

        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let limit = filter.limit.unwrap_or(20).max(0) as usize;
        Ok(events.into_iter().skip(offset).take(limit).collect())
    }

    async fn participants(&self, event_id: i64) -> Result<Vec<Participant>> {
        let tables = self.tables.lock().await;
        let mut participants: Vec<Participant> = tables
            .participants
            .values()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect();
        participants.sort_by(|a, b| a.registered_at.cmp(&b.registered_at).then(a.user_id.cmp(&b.user_id)));
        Ok(participants)
    }

    async fn find_participant(&self, event_id: i64, user_id: i64) -> Result<Option<Participant>> {
        Ok(self.tables.lock().await.participants.get(&(event_id, user_id)).cloned())
    }

    async fn participations_for_user(&self, user_id: i64, event_ids: &[i64]) -> Result<Vec<Participant>> {
        let tables = self.tables.lock().await;
        Ok(event_ids
            .iter()
            .filter_map(|event_id| tables.participants.get(&(*event_id, user_id)).cloned())
            .collect())
    }

    async fn insert_participant(&self, event_id: i64, user_id: i64, now: DateTime<Utc>) -> Result<InsertOutcome> {
        let mut tables = self.tables.lock().await;
        let Some(event) = tables.events.get(&event_id) else {
            return Ok(InsertOutcome::Rejected);
        };
        if event.check_registration_open(user_id, now).is_err() {
            return Ok(InsertOutcome::Rejected);
        }
        if tables.participants.contains_key(&(event_id, user_id)) {
            return Ok(InsertOutcome::Duplicate);
        }

        let participant = Participant::pending(event_id, user_id, now);
        tables.participants.insert((event_id, user_id), participant.clone());
        if let Some(event) = tables.events.get_mut(&event_id) {
            event.registered += 1;
            event.updated_at = now;
        }
        Ok(InsertOutcome::Inserted(participant))
    }

    async fn remove_participant(&self, event_id: i64, user_id: i64) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        if tables.participants.remove(&(event_id, user_id)).is_none() {
            return Ok(false);
        }
        if let Some(event) = tables.events.get_mut(&event_id) {
            event.registered = (event.registered - 1).max(0);
            event.updated_at = Utc::now();
        }
        Ok(true)
    }

    async fn apply_transition(
        &self,
        event_id: i64,
        user_id: i64,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<Option<Participant>> {
        let mut tables = self.tables.lock().await;
        let Some(participant) = tables.participants.get_mut(&(event_id, user_id)) else {
            return Ok(None);
        };
        if transition.check(participant).is_err() {
            return Ok(None);
        }
        transition.apply(participant, now);
        Ok(Some(participant.clone()))
    }

    async fn events_due_for_reminder(&self, now: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<Event>> {
        let tables = self.tables.lock().await;
        let mut due: Vec<Event> = tables
            .events
            .values()
            .filter(|e| e.status == EventStatus::Upcoming && !e.reminder_sent)
            .filter(|e| e.event_date > now && e.event_date <= until)
            .cloned()
            .collect();
        due.sort_by_key(|e| e.event_date);
        Ok(due)
    }

    async fn mark_reminder_sent(&self, event_id: i64) -> Result<()> {
        if let Some(event) = self.tables.lock().await.events.get_mut(&event_id) {
            event.reminder_sent = true;
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, request: CreateUserRequest) -> Result<User> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let user = User {
            id: tables.next_id(),
            name: request.name,
            email: request.email,
            role: request.role.unwrap_or(Role::Volunteer),
            language_code: request.language_code.unwrap_or_else(|| "en".to_string()),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        Ok(self.tables.lock().await.users.get(&user_id).cloned())
    }

    async fn push_subscriptions(&self, user_id: i64) -> Result<Vec<PushSubscription>> {
        let tables = self.tables.lock().await;
        Ok(tables.subscriptions.values().filter(|s| s.user_id == user_id).cloned().collect())
    }

    async fn save_push_subscription(&self, user_id: i64, subscription: NewPushSubscription) -> Result<PushSubscription> {
        let mut tables = self.tables.lock().await;
        let existing = tables
            .subscriptions
            .values()
            .find(|s| s.endpoint == subscription.endpoint)
            .map(|s| (s.id, s.created_at));
        let (id, created_at) = match existing {
            Some(found) => found,
            None => (tables.next_id(), Utc::now()),
        };

        let saved = PushSubscription {
            id,
            user_id,
            endpoint: subscription.endpoint,
            p256dh: subscription.keys.p256dh,
            auth: subscription.keys.auth,
            created_at,
        };
        tables.subscriptions.insert(id, saved.clone());
        Ok(saved)
    }

    async fn remove_push_subscription(&self, user_id: i64, endpoint: &str) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.subscriptions.len();
        tables.subscriptions.retain(|_, s| !(s.user_id == user_id && s.endpoint == endpoint));
        Ok(tables.subscriptions.len() < before)
    }

    async fn prune_push_subscription(&self, subscription_id: i64) -> Result<()> {
        self.tables.lock().await.subscriptions.remove(&subscription_id);
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification> {
        let mut tables = self.tables.lock().await;
        let created = Notification {
            id: tables.next_id(),
            user_id: notification.user_id,
            notification_type: notification.notification_type,
            title: notification.title,
            message: notification.message,
            event_id: notification.event_id,
            related_user_id: notification.related_user_id,
            post_id: notification.post_id,
            is_read: false,
            link: notification.link,
            created_at: Utc::now(),
        };
        tables.notifications.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_notification(&self, notification_id: i64) -> Result<Option<Notification>> {
        Ok(self.tables.lock().await.notifications.get(&notification_id).cloned())
    }

    async fn latest_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<Notification>> {
        let tables = self.tables.lock().await;
        // Ids grow monotonically, so reverse id order is newest first
        Ok(tables
            .notifications
            .values()
            .rev()
            .filter(|n| n.user_id == user_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn unread_count(&self, user_id: i64) -> Result<i64> {
        let tables = self.tables.lock().await;
        Ok(tables.notifications.values().filter(|n| n.user_id == user_id && !n.is_read).count() as i64)
    }

    async fn mark_read(&self, notification_id: i64) -> Result<()> {
        if let Some(notification) = self.tables.lock().await.notifications.get_mut(&notification_id) {
            notification.is_read = true;
        }
        Ok(())
    }

    async fn mark_all_read(&self, user_id: i64) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        let mut updated = 0;
        for notification in tables.notifications.values_mut() {
            if notification.user_id == user_id && !notification.is_read {
                notification.is_read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete_notification(&self, notification_id: i64) -> Result<()> {
        self.tables.lock().await.notifications.remove(&notification_id);
        Ok(())
    }
}
