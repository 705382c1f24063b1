//! Event participation engine
//!
//! Owns the participants of an event and every transition between their
//! states. Each mutation is a conditional write in the store; when such a
//! write matches nothing the participant is re-read and the precise failed
//! precondition is reported. Notifications are published on the
//! [`Notifier`] after the write and never awaited.

use std::sync::Arc;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use crate::database::{EventStore, InsertOutcome};
use crate::models::*;
use crate::services::dispatcher::{Notifier, SideEffect};
use crate::utils::errors::{ConflictReason, Result, VolunteerHubError};
use crate::utils::logging::{log_admin_action, log_participant_action};

/// Result of completing every checked-in participant of an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkCompletion {
    pub completed: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct ParticipationService {
    events: Arc<dyn EventStore>,
    notifier: Notifier,
}

impl ParticipationService {
    pub fn new(events: Arc<dyn EventStore>, notifier: Notifier) -> Self {
        Self { events, notifier }
    }

    /// Register the actor for an event as a pending participant
    pub async fn register(&self, actor: &Actor, event_id: i64) -> Result<EventDetails> {
        let now = Utc::now();
        let event = self.load_event(event_id).await?;

        if self.events.find_participant(event_id, actor.user_id).await?.is_some() {
            return Err(VolunteerHubError::Conflict(ConflictReason::AlreadyRegistered));
        }
        event.check_registration_open(actor.user_id, now)?;

        match self.events.insert_participant(event_id, actor.user_id, now).await? {
            InsertOutcome::Inserted(_) => {}
            InsertOutcome::Duplicate => {
                return Err(VolunteerHubError::Conflict(ConflictReason::AlreadyRegistered));
            }
            InsertOutcome::Rejected => {
                // Lost a race for the last seat or the event changed underneath us
                let current = self.load_event(event_id).await?;
                current.check_registration_open(actor.user_id, now)?;
                return Err(VolunteerHubError::Conflict(ConflictReason::ConcurrentModification));
            }
        }

        let event = self.load_event(event_id).await?;
        log_participant_action(event_id, actor.user_id, "register", actor.user_id);
        self.notifier.publish(SideEffect::Registered { event: event.clone(), volunteer_id: actor.user_id });

        self.details(event, Some(actor.user_id)).await
    }

    /// Withdraw the actor's own registration
    pub async fn unregister(&self, actor: &Actor, event_id: i64) -> Result<EventDetails> {
        self.load_event(event_id).await?;

        if !self.events.remove_participant(event_id, actor.user_id).await? {
            return Err(VolunteerHubError::ParticipantNotFound { event_id, user_id: actor.user_id });
        }

        let event = self.load_event(event_id).await?;
        log_participant_action(event_id, actor.user_id, "unregister", actor.user_id);
        self.notifier.publish(SideEffect::Unregistered { event: event.clone(), volunteer_id: actor.user_id });

        self.details(event, Some(actor.user_id)).await
    }

    /// Approve or reject a pending registration
    pub async fn review(&self, actor: &Actor, event_id: i64, user_id: i64, decision: ReviewDecision) -> Result<Participant> {
        let transition = Transition::Review { decision, reviewer: actor.user_id };
        let (event, participant) = self.transition(actor, event_id, user_id, transition).await?;
        self.notifier.publish(SideEffect::Reviewed { event, volunteer_id: user_id, decision });
        Ok(participant)
    }

    pub async fn check_in(&self, actor: &Actor, event_id: i64, user_id: i64) -> Result<Participant> {
        let (event, participant) = self.transition(actor, event_id, user_id, Transition::CheckIn).await?;
        self.notifier.publish(SideEffect::CheckedIn { event, volunteer_id: user_id });
        Ok(participant)
    }

    pub async fn undo_check_in(&self, actor: &Actor, event_id: i64, user_id: i64) -> Result<Participant> {
        let (_, participant) = self.transition(actor, event_id, user_id, Transition::UndoCheckIn).await?;
        Ok(participant)
    }

    pub async fn complete(&self, actor: &Actor, event_id: i64, user_id: i64) -> Result<Participant> {
        let (event, participant) = self.transition(actor, event_id, user_id, Transition::Complete).await?;
        self.notifier.publish(SideEffect::Completed { event, volunteer_id: user_id });
        Ok(participant)
    }

    pub async fn undo_complete(&self, actor: &Actor, event_id: i64, user_id: i64) -> Result<Participant> {
        let (_, participant) = self.transition(actor, event_id, user_id, Transition::UndoComplete).await?;
        Ok(participant)
    }

    /// Complete every checked-in participant of an event
    pub async fn complete_all(&self, actor: &Actor, event_id: i64) -> Result<BulkCompletion> {
        let event = self.load_event(event_id).await?;
        self.authorize(&event, actor, "complete_all")?;
        self.complete_checked_in(&event, actor).await
    }

    /// Complete participants one by one; a failure for one does not stop the rest
    pub(crate) async fn complete_checked_in(&self, event: &Event, actor: &Actor) -> Result<BulkCompletion> {
        let now = Utc::now();
        let participants = self.events.participants(event.id).await?;
        let mut result = BulkCompletion::default();

        for participant in participants.into_iter().filter(|p| p.checked_in && !p.completed) {
            match self.events.apply_transition(event.id, participant.user_id, Transition::Complete, now).await {
                Ok(Some(_)) => {
                    result.completed += 1;
                    log_participant_action(event.id, participant.user_id, "complete", actor.user_id);
                    self.notifier.publish(SideEffect::Completed { event: event.clone(), volunteer_id: participant.user_id });
                }
                Ok(None) => {
                    result.failed += 1;
                    warn!(event_id = event.id, user_id = participant.user_id, "Participant changed before bulk completion");
                }
                Err(e) => {
                    result.failed += 1;
                    warn!(event_id = event.id, user_id = participant.user_id, error = %e, "Bulk completion failed for participant");
                }
            }
        }

        info!(event_id = event.id, completed = result.completed, failed = result.failed, "Bulk completion finished");
        Ok(result)
    }

    /// Participants of an event bucketed for review
    pub async fn registrations(&self, actor: &Actor, event_id: i64) -> Result<RegistrationBuckets> {
        let event = self.load_event(event_id).await?;
        self.authorize(&event, actor, "registrations")?;
        let participants = self.events.participants(event_id).await?;
        Ok(RegistrationBuckets::from_participants(participants))
    }

    /// Event with its participants and the viewer's registration status
    pub async fn details(&self, event: Event, viewer: Option<i64>) -> Result<EventDetails> {
        let participants = self.events.participants(event.id).await?;
        let registration_status = viewer.and_then(|viewer| {
            participants.iter().find(|p| p.user_id == viewer).map(|p| p.status)
        });

        Ok(EventDetails { event, participants, registration_status })
    }

    /// Attach the viewer's registration status to each event
    pub async fn summaries(&self, events: Vec<Event>, viewer: i64) -> Result<Vec<EventSummary>> {
        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        let mine = self.events.participations_for_user(viewer, &ids).await?;

        Ok(events
            .into_iter()
            .map(|event| {
                let registration_status = mine.iter().find(|p| p.event_id == event.id).map(|p| p.status);
                EventSummary { event, registration_status }
            })
            .collect())
    }

    async fn transition(&self, actor: &Actor, event_id: i64, user_id: i64, transition: Transition) -> Result<(Event, Participant)> {
        let event = self.load_event(event_id).await?;
        self.authorize(&event, actor, transition.name())?;

        let current = self
            .events
            .find_participant(event_id, user_id)
            .await?
            .ok_or(VolunteerHubError::ParticipantNotFound { event_id, user_id })?;
        transition.check(&current)?;

        let updated = match self.events.apply_transition(event_id, user_id, transition, Utc::now()).await? {
            Some(participant) => participant,
            None => {
                let latest = self
                    .events
                    .find_participant(event_id, user_id)
                    .await?
                    .ok_or(VolunteerHubError::ParticipantNotFound { event_id, user_id })?;
                transition.check(&latest)?;
                return Err(VolunteerHubError::Conflict(ConflictReason::ConcurrentModification));
            }
        };

        log_participant_action(event_id, user_id, transition.name(), actor.user_id);
        Ok((event, updated))
    }

    /// Creator or admin
    fn authorize(&self, event: &Event, actor: &Actor, action: &str) -> Result<()> {
        if !event.is_managed_by(actor) {
            return Err(VolunteerHubError::Unauthorized("not allowed to manage this event".to_string()));
        }
        if event.created_by != actor.user_id {
            log_admin_action(actor.user_id, action, Some(&format!("event:{}", event.id)), None);
        }
        Ok(())
    }

    async fn load_event(&self, event_id: i64) -> Result<Event> {
        self.events
            .find_event(event_id)
            .await?
            .ok_or(VolunteerHubError::EventNotFound { event_id })
    }
}
