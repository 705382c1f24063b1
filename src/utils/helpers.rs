//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use chrono::{DateTime, Utc};

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Whole hours from `now` until `at`, rounded up; never negative
pub fn hours_until(now: DateTime<Utc>, at: DateTime<Utc>) -> i64 {
    let minutes = at.signed_duration_since(now).num_minutes();
    if minutes <= 0 {
        0
    } else {
        (minutes + 59) / 60
    }
}

/// Resolve a page size from an optional request value
pub fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, max)
}

/// Deep link to the public event page
pub fn event_link(event_id: i64) -> String {
    format!("/events/{}", event_id)
}

/// Deep link to the manager's registration review page
pub fn registrations_link(event_id: i64) -> String {
    format!("/manage/events/{}/registrations", event_id)
}

/// Whether a string is an absolute http(s) URL
pub fn is_http_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}
