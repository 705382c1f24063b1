//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod user;
pub mod event;
pub mod participant;
pub mod notification;

// Re-export commonly used models
pub use user::{User, Role, Actor, CreateUserRequest, PushSubscription, NewPushSubscription, PushSubscriptionKeys};
pub use event::{Event, EventCategory, EventStatus, EventDetails, EventSummary, CreateEventRequest, UpdateEventRequest, EventFilter};
pub use participant::{Participant, ParticipantStatus, ReviewDecision, Transition, RegistrationBuckets, RegistrationCounts};
pub use notification::{Notification, NotificationType, NewNotification};
