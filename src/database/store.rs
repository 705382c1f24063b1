//! Storage traits
//!
//! Services depend on these traits rather than on concrete repositories so the
//! PostgreSQL repositories and the in-memory store are interchangeable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::models::*;
use crate::utils::errors::Result;

/// Outcome of the atomic capacity-checked participant insert
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(Participant),
    /// A row for (event, user) already exists
    Duplicate,
    /// The guarded counter update matched nothing: the event is missing, full,
    /// not upcoming, already started, or owned by the registrant
    Rejected,
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn create_event(&self, request: CreateEventRequest, created_by: i64) -> Result<Event>;

    async fn find_event(&self, event_id: i64) -> Result<Option<Event>>;

    async fn update_event(&self, event_id: i64, request: UpdateEventRequest) -> Result<Option<Event>>;

    async fn delete_event(&self, event_id: i64) -> Result<bool>;

    async fn list_events(&self, filter: &EventFilter, now: DateTime<Utc>) -> Result<Vec<Event>>;

    async fn participants(&self, event_id: i64) -> Result<Vec<Participant>>;

    async fn find_participant(&self, event_id: i64, user_id: i64) -> Result<Option<Participant>>;

    /// Registrations of one user across the given events
    async fn participations_for_user(&self, user_id: i64, event_ids: &[i64]) -> Result<Vec<Participant>>;

    /// Insert a pending participant and increment `registered` as one unit
    async fn insert_participant(&self, event_id: i64, user_id: i64, now: DateTime<Utc>) -> Result<InsertOutcome>;

    /// Delete a participant and decrement `registered` as one unit
    async fn remove_participant(&self, event_id: i64, user_id: i64) -> Result<bool>;

    /// Apply `transition` only if its precondition still holds.
    ///
    /// Returns `None` when the participant is missing or no longer satisfies the
    /// precondition at write time.
    async fn apply_transition(
        &self,
        event_id: i64,
        user_id: i64,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<Option<Participant>>;

    /// Upcoming events starting in `(now, until]` whose reminder is not sent
    async fn events_due_for_reminder(&self, now: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<Event>>;

    async fn mark_reminder_sent(&self, event_id: i64) -> Result<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, request: CreateUserRequest) -> Result<User>;

    async fn find_user(&self, user_id: i64) -> Result<Option<User>>;

    async fn push_subscriptions(&self, user_id: i64) -> Result<Vec<PushSubscription>>;

    /// Insert or re-assign a subscription by endpoint
    async fn save_push_subscription(&self, user_id: i64, subscription: NewPushSubscription) -> Result<PushSubscription>;

    async fn remove_push_subscription(&self, user_id: i64, endpoint: &str) -> Result<bool>;

    /// Remove a subscription reported gone by the push service
    async fn prune_push_subscription(&self, subscription_id: i64) -> Result<()>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification>;

    async fn find_notification(&self, notification_id: i64) -> Result<Option<Notification>>;

    /// Newest first
    async fn latest_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<Notification>>;

    async fn unread_count(&self, user_id: i64) -> Result<i64>;

    async fn mark_read(&self, notification_id: i64) -> Result<()>;

    async fn mark_all_read(&self, user_id: i64) -> Result<u64>;

    async fn delete_notification(&self, notification_id: i64) -> Result<()>;
}
