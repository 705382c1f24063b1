//! Event store with injectable faults
//!
//! Delegates to the memory store until told to fail a specific event or
//! participant, or to stall the reminder query.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use volunteer_hub::database::{EventStore, InsertOutcome, MemoryStore};
use volunteer_hub::models::{CreateEventRequest, Event, EventFilter, Participant, Transition, UpdateEventRequest};
use volunteer_hub::{Result, VolunteerHubError};

pub struct FaultyEventStore {
    inner: Arc<MemoryStore>,
    broken_events: Mutex<HashSet<i64>>,
    broken_participants: Mutex<HashSet<i64>>,
    reminder_delay: Mutex<Option<Duration>>,
}

fn broken<T>(what: &str) -> Result<T> {
    Err(VolunteerHubError::DependencyFailure(format!("{} unavailable", what)))
}

impl FaultyEventStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            broken_events: Mutex::new(HashSet::new()),
            broken_participants: Mutex::new(HashSet::new()),
            reminder_delay: Mutex::new(None),
        }
    }

    /// Fail every participant read of this event
    pub fn break_event(&self, event_id: i64) {
        self.broken_events.lock().unwrap().insert(event_id);
    }

    /// Fail every transition of this user
    pub fn break_participant(&self, user_id: i64) {
        self.broken_participants.lock().unwrap().insert(user_id);
    }

    /// Hold the reminder query for `delay` before answering
    pub fn stall_reminder_query(&self, delay: Duration) {
        *self.reminder_delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl EventStore for FaultyEventStore {
    async fn create_event(&self, request: CreateEventRequest, created_by: i64) -> Result<Event> {
        self.inner.create_event(request, created_by).await
    }

    async fn find_event(&self, event_id: i64) -> Result<Option<Event>> {
        self.inner.find_event(event_id).await
    }

    async fn update_event(&self, event_id: i64, request: UpdateEventRequest) -> Result<Option<Event>> {
        self.inner.update_event(event_id, request).await
    }

    async fn delete_event(&self, event_id: i64) -> Result<bool> {
        self.inner.delete_event(event_id).await
    }

    async fn list_events(&self, filter: &EventFilter, now: DateTime<Utc>) -> Result<Vec<Event>> {
        self.inner.list_events(filter, now).await
    }

    async fn participants(&self, event_id: i64) -> Result<Vec<Participant>> {
        if self.broken_events.lock().unwrap().contains(&event_id) {
            return broken("participants");
        }
        self.inner.participants(event_id).await
    }

    async fn find_participant(&self, event_id: i64, user_id: i64) -> Result<Option<Participant>> {
        self.inner.find_participant(event_id, user_id).await
    }

    async fn participations_for_user(&self, user_id: i64, event_ids: &[i64]) -> Result<Vec<Participant>> {
        self.inner.participations_for_user(user_id, event_ids).await
    }

    async fn insert_participant(&self, event_id: i64, user_id: i64, now: DateTime<Utc>) -> Result<InsertOutcome> {
        self.inner.insert_participant(event_id, user_id, now).await
    }

    async fn remove_participant(&self, event_id: i64, user_id: i64) -> Result<bool> {
        self.inner.remove_participant(event_id, user_id).await
    }

    async fn apply_transition(
        &self,
        event_id: i64,
        user_id: i64,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<Option<Participant>> {
        if self.broken_participants.lock().unwrap().contains(&user_id) {
            return broken("participant write");
        }
        self.inner.apply_transition(event_id, user_id, transition, now).await
    }

    async fn events_due_for_reminder(&self, now: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<Event>> {
        let delay = *self.reminder_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.events_due_for_reminder(now, until).await
    }

    async fn mark_reminder_sent(&self, event_id: i64) -> Result<()> {
        self.inner.mark_reminder_sent(event_id).await
    }
}
