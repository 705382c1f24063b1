//! Error handling for VolunteerHub
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for VolunteerHub application
#[derive(Error, Debug)]
pub enum VolunteerHubError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Registration not found: user {user_id} on event {event_id}")]
    ParticipantNotFound { event_id: i64, user_id: i64 },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("Notification not found: {notification_id}")]
    NotificationNotFound { notification_id: i64 },

    #[error("Authentication required: {0}")]
    Authentication(String),

    #[error("Permission denied: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(ConflictReason),

    #[error("Invalid state: {0}")]
    InvalidState(StateViolation),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dependency failure: {0}")]
    DependencyFailure(String),
}

/// Operations blocked by current state that are not hard precondition violations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    AlreadyRegistered,
    CreatorRegistration,
    EventFull,
    AlreadyReviewed,
    CapacityBelowRegistered,
    ConcurrentModification,
}

impl ConflictReason {
    pub fn code(&self) -> &'static str {
        match self {
            ConflictReason::AlreadyRegistered => "already_registered",
            ConflictReason::CreatorRegistration => "creator_registration",
            ConflictReason::EventFull => "event_full",
            ConflictReason::AlreadyReviewed => "already_reviewed",
            ConflictReason::CapacityBelowRegistered => "capacity_below_registered",
            ConflictReason::ConcurrentModification => "concurrent_modification",
        }
    }
}

impl std::fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ConflictReason::AlreadyRegistered => "you are already registered for this event",
            ConflictReason::CreatorRegistration => "you cannot register for an event you created",
            ConflictReason::EventFull => "event is full",
            ConflictReason::AlreadyReviewed => "registration has already been reviewed",
            ConflictReason::CapacityBelowRegistered => "capacity cannot be lower than the number of registrations",
            ConflictReason::ConcurrentModification => "registration was modified concurrently, retry",
        };
        f.write_str(text)
    }
}

/// Entity not in a state compatible with the requested transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateViolation {
    EventNotOpen,
    EventDatePassed,
    NotApproved,
    AlreadyCheckedIn,
    NotCheckedIn,
    AlreadyCompleted,
    NotCompleted,
    CompletedBlocksUndo,
}

impl StateViolation {
    pub fn code(&self) -> &'static str {
        match self {
            StateViolation::EventNotOpen => "event_not_open",
            StateViolation::EventDatePassed => "event_date_passed",
            StateViolation::NotApproved => "not_approved",
            StateViolation::AlreadyCheckedIn => "already_checked_in",
            StateViolation::NotCheckedIn => "not_checked_in",
            StateViolation::AlreadyCompleted => "already_completed",
            StateViolation::NotCompleted => "not_completed",
            StateViolation::CompletedBlocksUndo => "completed_blocks_undo",
        }
    }
}

impl std::fmt::Display for StateViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            StateViolation::EventNotOpen => "event is not open for registration",
            StateViolation::EventDatePassed => "event has already started",
            StateViolation::NotApproved => "registration is not approved",
            StateViolation::AlreadyCheckedIn => "participant is already checked in",
            StateViolation::NotCheckedIn => "participant is not checked in",
            StateViolation::AlreadyCompleted => "participation is already completed",
            StateViolation::NotCompleted => "participation is not completed",
            StateViolation::CompletedBlocksUndo => "completed participation must be undone before check-in",
        };
        f.write_str(text)
    }
}

/// Result type alias for VolunteerHub operations
pub type Result<T> = std::result::Result<T, VolunteerHubError>;

impl VolunteerHubError {
    /// Stable machine-readable code, also the i18n key suffix under `errors.`
    pub fn code(&self) -> &'static str {
        match self {
            VolunteerHubError::EventNotFound { .. } => "event_not_found",
            VolunteerHubError::ParticipantNotFound { .. } => "participant_not_found",
            VolunteerHubError::UserNotFound { .. } => "user_not_found",
            VolunteerHubError::NotificationNotFound { .. } => "notification_not_found",
            VolunteerHubError::Authentication(_) => "authentication_required",
            VolunteerHubError::Unauthorized(_) => "unauthorized",
            VolunteerHubError::Conflict(reason) => reason.code(),
            VolunteerHubError::InvalidState(violation) => violation.code(),
            VolunteerHubError::InvalidInput(_) => "invalid_input",
            VolunteerHubError::Config(_) | VolunteerHubError::ConfigSource(_) => "config",
            _ => "internal",
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            VolunteerHubError::Database(_) => ErrorSeverity::Critical,
            VolunteerHubError::Migration(_) => ErrorSeverity::Critical,
            VolunteerHubError::Config(_) => ErrorSeverity::Critical,
            VolunteerHubError::ConfigSource(_) => ErrorSeverity::Critical,
            VolunteerHubError::Unauthorized(_) => ErrorSeverity::Warning,
            VolunteerHubError::Authentication(_) => ErrorSeverity::Warning,
            VolunteerHubError::EventNotFound { .. }
            | VolunteerHubError::ParticipantNotFound { .. }
            | VolunteerHubError::UserNotFound { .. }
            | VolunteerHubError::NotificationNotFound { .. }
            | VolunteerHubError::Conflict(_)
            | VolunteerHubError::InvalidState(_)
            | VolunteerHubError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
