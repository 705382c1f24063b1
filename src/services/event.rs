//! Event management service

use std::sync::Arc;
use chrono::Utc;
use serde::Serialize;
use crate::database::EventStore;
use crate::models::*;
use crate::services::participation::{BulkCompletion, ParticipationService};
use crate::utils::errors::{ConflictReason, Result, VolunteerHubError};
use crate::utils::helpers::clamp_limit;
use crate::utils::logging::log_event_action;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Updated event plus the outcome of closing it, if the update closed it
#[derive(Debug, Clone, Serialize)]
pub struct EventUpdate {
    #[serde(flatten)]
    pub event: Event,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bulk_completion: Option<BulkCompletion>,
}

#[derive(Clone)]
pub struct EventService {
    events: Arc<dyn EventStore>,
    participation: ParticipationService,
}

impl EventService {
    pub fn new(events: Arc<dyn EventStore>, participation: ParticipationService) -> Self {
        Self { events, participation }
    }

    pub async fn create(&self, actor: &Actor, request: CreateEventRequest) -> Result<Event> {
        if !actor.role.can_create_events() {
            return Err(VolunteerHubError::Unauthorized("only event managers can create events".to_string()));
        }
        request.validate(Utc::now())?;

        let event = self.events.create_event(request, actor.user_id).await?;
        log_event_action(event.id, "create", actor.user_id, Some(&event.title));
        Ok(event)
    }

    /// Partial update. Closing the event completes its checked-in participants.
    pub async fn update(&self, actor: &Actor, event_id: i64, request: UpdateEventRequest) -> Result<EventUpdate> {
        let current = self.managed_event(actor, event_id).await?;
        request.validate(&current, Utc::now())?;
        let closes = request.closes_event(&current);

        let event = match self.events.update_event(event_id, request).await? {
            Some(event) => event,
            None => {
                // Registrations grew past the requested capacity meanwhile, or the event vanished
                self.load_event(event_id).await?;
                return Err(VolunteerHubError::Conflict(ConflictReason::CapacityBelowRegistered));
            }
        };
        log_event_action(event_id, "update", actor.user_id, None);

        let bulk_completion = if closes {
            Some(self.participation.complete_checked_in(&event, actor).await?)
        } else {
            None
        };

        Ok(EventUpdate { event, bulk_completion })
    }

    pub async fn delete(&self, actor: &Actor, event_id: i64) -> Result<()> {
        self.managed_event(actor, event_id).await?;
        if !self.events.delete_event(event_id).await? {
            return Err(VolunteerHubError::EventNotFound { event_id });
        }
        log_event_action(event_id, "delete", actor.user_id, None);
        Ok(())
    }

    pub async fn get(&self, actor: &Actor, event_id: i64) -> Result<EventDetails> {
        let event = self.load_event(event_id).await?;
        self.participation.details(event, Some(actor.user_id)).await
    }

    pub async fn list(&self, actor: &Actor, mut filter: EventFilter) -> Result<Vec<EventSummary>> {
        filter.limit = Some(clamp_limit(filter.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE));
        filter.offset = Some(filter.offset.unwrap_or(0).max(0));

        let events = self.events.list_events(&filter, Utc::now()).await?;
        self.participation.summaries(events, actor.user_id).await
    }

    async fn managed_event(&self, actor: &Actor, event_id: i64) -> Result<Event> {
        let event = self.load_event(event_id).await?;
        if !event.is_managed_by(actor) {
            return Err(VolunteerHubError::Unauthorized("not allowed to manage this event".to_string()));
        }
        Ok(event)
    }

    async fn load_event(&self, event_id: i64) -> Result<Event> {
        self.events
            .find_event(event_id)
            .await?
            .ok_or(VolunteerHubError::EventNotFound { event_id })
    }
}
