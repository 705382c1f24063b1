//! Database repositories module
//!
//! PostgreSQL implementations of the store traits

pub mod user;
pub mod event;
pub mod notification;

// Re-export repositories
pub use user::UserRepository;
pub use event::EventRepository;
pub use notification::NotificationRepository;
