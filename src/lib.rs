//! VolunteerHub backend
//!
//! REST backend for volunteer event management: event publishing, the
//! participant registration workflow with its notification fan-out, in-app
//! notifications, Web Push delivery and scheduled event reminders.

pub mod config;
pub mod handlers;
pub mod services;
pub mod models;
pub mod database;
pub mod i18n;
pub mod utils;
pub mod middleware;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{VolunteerHubError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use services::ServiceFactory;
pub use handlers::{AppState, router};
pub use i18n::I18n;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
