//! Middleware module
//!
//! This module contains middleware for request processing

pub mod auth;
pub mod locale;
pub mod logging;

// Re-export commonly used middleware
pub use auth::{AuthUser, Claims, verify_token};
pub use locale::localize_errors;
pub use logging::log_requests;
