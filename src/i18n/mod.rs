//! Internationalization module
//!
//! This module handles multi-language support for VolunteerHub.
//! It provides translation loading, language detection, message formatting,
//! and pluralization support for English and Vietnamese.

pub mod loader;

// Re-export commonly used i18n components
pub use loader::{I18n, TranslationParams};
