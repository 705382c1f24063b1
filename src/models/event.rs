//! Event model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use crate::models::participant::{Participant, ParticipantStatus};
use crate::models::user::Actor;
use crate::utils::errors::{ConflictReason, Result, StateViolation, VolunteerHubError};
use crate::utils::helpers::is_http_url;

pub const MIN_PARTICIPANTS: i32 = 5;
pub const MAX_PARTICIPANTS: i32 = 1000;
pub const MIN_HOURS: i32 = 1;
pub const MAX_HOURS: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Environment,
    Education,
    Youth,
    Elderly,
    Healthcare,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub organization: String,
    pub description: String,
    pub location: String,
    pub event_date: DateTime<Utc>,
    pub category: EventCategory,
    pub status: EventStatus,
    pub max_participants: i32,
    pub registered: i32,
    pub hours: i32,
    pub image_url: Option<String>,
    pub created_by: i64,
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Creator or admin
    pub fn is_managed_by(&self, actor: &Actor) -> bool {
        self.created_by == actor.user_id || actor.is_admin()
    }

    pub fn is_full(&self) -> bool {
        self.registered >= self.max_participants
    }

    /// Preconditions for a new registration by `user_id` at `now`
    pub fn check_registration_open(&self, user_id: i64, now: DateTime<Utc>) -> Result<()> {
        if self.created_by == user_id {
            return Err(VolunteerHubError::Conflict(ConflictReason::CreatorRegistration));
        }
        if self.status != EventStatus::Upcoming {
            return Err(VolunteerHubError::InvalidState(StateViolation::EventNotOpen));
        }
        if self.event_date <= now {
            return Err(VolunteerHubError::InvalidState(StateViolation::EventDatePassed));
        }
        if self.is_full() {
            return Err(VolunteerHubError::Conflict(ConflictReason::EventFull));
        }
        Ok(())
    }
}

/// Event plus its participants and the viewer's own registration status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    pub participants: Vec<Participant>,
    pub registration_status: Option<ParticipantStatus>,
}

/// Event list item carrying the viewer's registration status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    #[serde(flatten)]
    pub event: Event,
    pub registration_status: Option<ParticipantStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub organization: String,
    pub description: String,
    pub location: String,
    pub event_date: DateTime<Utc>,
    pub category: EventCategory,
    pub max_participants: i32,
    pub hours: i32,
    pub image_url: Option<String>,
}

impl CreateEventRequest {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        require_text("title", &self.title)?;
        require_text("organization", &self.organization)?;
        require_text("description", &self.description)?;
        require_text("location", &self.location)?;
        validate_date(self.event_date, now)?;
        validate_capacity(self.max_participants)?;
        validate_hours(self.hours)?;
        if let Some(url) = &self.image_url {
            validate_image_url(url)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub organization: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub category: Option<EventCategory>,
    pub status: Option<EventStatus>,
    pub max_participants: Option<i32>,
    pub hours: Option<i32>,
    pub image_url: Option<String>,
}

impl UpdateEventRequest {
    /// Validate the provided fields against the current event
    pub fn validate(&self, current: &Event, now: DateTime<Utc>) -> Result<()> {
        for (field, value) in [
            ("title", &self.title),
            ("organization", &self.organization),
            ("description", &self.description),
            ("location", &self.location),
        ] {
            if let Some(value) = value {
                require_text(field, value)?;
            }
        }
        if let Some(date) = self.event_date {
            validate_date(date, now)?;
        }
        if let Some(max) = self.max_participants {
            validate_capacity(max)?;
            if max < current.registered {
                return Err(VolunteerHubError::Conflict(ConflictReason::CapacityBelowRegistered));
            }
        }
        if let Some(hours) = self.hours {
            validate_hours(hours)?;
        }
        if let Some(url) = &self.image_url {
            validate_image_url(url)?;
        }
        Ok(())
    }

    /// Whether this update moves the event into the closed `completed` state
    pub fn closes_event(&self, current: &Event) -> bool {
        self.status == Some(EventStatus::Completed) && current.status != EventStatus::Completed
    }
}

/// Filters for event listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    pub category: Option<EventCategory>,
    pub status: Option<EventStatus>,
    #[serde(default)]
    pub upcoming_only: bool,
    pub created_by: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(VolunteerHubError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

fn validate_date(date: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
    if date <= now {
        return Err(VolunteerHubError::InvalidInput("event date must be in the future".to_string()));
    }
    Ok(())
}

fn validate_capacity(max: i32) -> Result<()> {
    if !(MIN_PARTICIPANTS..=MAX_PARTICIPANTS).contains(&max) {
        return Err(VolunteerHubError::InvalidInput(format!(
            "max participants must be between {} and {}",
            MIN_PARTICIPANTS, MAX_PARTICIPANTS
        )));
    }
    Ok(())
}

fn validate_hours(hours: i32) -> Result<()> {
    if !(MIN_HOURS..=MAX_HOURS).contains(&hours) {
        return Err(VolunteerHubError::InvalidInput(format!(
            "hours must be between {} and {}",
            MIN_HOURS, MAX_HOURS
        )));
    }
    Ok(())
}

fn validate_image_url(url: &str) -> Result<()> {
    if !is_http_url(url) {
        return Err(VolunteerHubError::InvalidInput("image URL must be an http(s) URL".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use assert_matches::assert_matches;
    use chrono::Duration;

    fn sample_event(now: DateTime<Utc>) -> Event {
        Event {
            id: 1,
            title: "Beach cleanup".to_string(),
            organization: "Green Coast".to_string(),
            description: "Collect plastic".to_string(),
            location: "Da Nang".to_string(),
            event_date: now + Duration::days(3),
            category: EventCategory::Environment,
            status: EventStatus::Upcoming,
            max_participants: 10,
            registered: 0,
            hours: 4,
            image_url: None,
            created_by: 7,
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_request(now: DateTime<Utc>) -> CreateEventRequest {
        CreateEventRequest {
            title: "Beach cleanup".to_string(),
            organization: "Green Coast".to_string(),
            description: "Collect plastic".to_string(),
            location: "Da Nang".to_string(),
            event_date: now + Duration::days(3),
            category: EventCategory::Environment,
            max_participants: 10,
            hours: 4,
            image_url: Some("https://cdn.example.org/beach.jpg".to_string()),
        }
    }

    #[test]
    fn test_create_validation_bounds() {
        let now = Utc::now();
        assert!(sample_request(now).validate(now).is_ok());

        let mut req = sample_request(now);
        req.max_participants = 4;
        assert_matches!(req.validate(now), Err(VolunteerHubError::InvalidInput(_)));

        let mut req = sample_request(now);
        req.hours = 101;
        assert_matches!(req.validate(now), Err(VolunteerHubError::InvalidInput(_)));

        let mut req = sample_request(now);
        req.event_date = now;
        assert_matches!(req.validate(now), Err(VolunteerHubError::InvalidInput(_)));

        let mut req = sample_request(now);
        req.title = "   ".to_string();
        assert_matches!(req.validate(now), Err(VolunteerHubError::InvalidInput(_)));
    }

    #[test]
    fn test_update_cannot_shrink_below_registered() {
        let now = Utc::now();
        let mut event = sample_event(now);
        event.registered = 8;
        let update = UpdateEventRequest { max_participants: Some(6), ..Default::default() };
        assert_matches!(
            update.validate(&event, now),
            Err(VolunteerHubError::Conflict(ConflictReason::CapacityBelowRegistered))
        );
    }

    #[test]
    fn test_registration_preconditions() {
        let now = Utc::now();
        let mut event = sample_event(now);
        assert!(event.check_registration_open(9, now).is_ok());
        assert_matches!(
            event.check_registration_open(7, now),
            Err(VolunteerHubError::Conflict(ConflictReason::CreatorRegistration))
        );

        event.status = EventStatus::Cancelled;
        assert_matches!(
            event.check_registration_open(9, now),
            Err(VolunteerHubError::InvalidState(StateViolation::EventNotOpen))
        );

        event.status = EventStatus::Upcoming;
        event.registered = event.max_participants;
        assert_matches!(
            event.check_registration_open(9, now),
            Err(VolunteerHubError::Conflict(ConflictReason::EventFull))
        );
    }

    #[test]
    fn test_managed_by_creator_or_admin() {
        let now = Utc::now();
        let event = sample_event(now);
        assert!(event.is_managed_by(&Actor::new(7, Role::EventManager)));
        assert!(event.is_managed_by(&Actor::new(99, Role::Admin)));
        assert!(!event.is_managed_by(&Actor::new(99, Role::EventManager)));
    }

    #[test]
    fn test_closes_event() {
        let now = Utc::now();
        let event = sample_event(now);
        let update = UpdateEventRequest { status: Some(EventStatus::Completed), ..Default::default() };
        assert!(update.closes_event(&event));
        assert!(!UpdateEventRequest::default().closes_event(&event));
    }
}
