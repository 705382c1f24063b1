//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{VolunteerHubError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_auth_config(&settings.auth)?;
    validate_push_config(&settings.push)?;
    validate_reminder_config(&settings.reminders)?;
    validate_i18n_config(&settings.i18n)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(VolunteerHubError::Config(
            "Server host is required".to_string()
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(VolunteerHubError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(VolunteerHubError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(VolunteerHubError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.jwt_secret.len() < 32 {
        return Err(VolunteerHubError::Config(
            "JWT secret must be at least 32 characters".to_string()
        ));
    }

    Ok(())
}

/// Validate Web Push configuration; keys are only required when push is enabled
fn validate_push_config(config: &super::PushConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    if config.vapid_public_key.is_empty() || config.vapid_private_key_pem.is_empty() {
        return Err(VolunteerHubError::Config(
            "VAPID public and private keys are required when push is enabled".to_string()
        ));
    }

    if !config.vapid_private_key_pem.contains("BEGIN PRIVATE KEY") {
        return Err(VolunteerHubError::Config(
            "VAPID private key must be a PKCS#8 PEM".to_string()
        ));
    }

    if !(config.subject.starts_with("mailto:") || config.subject.starts_with("https://")) {
        return Err(VolunteerHubError::Config(
            "VAPID subject must be a mailto: or https: URL".to_string()
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(VolunteerHubError::Config(
            "Push timeout must be greater than 0".to_string()
        ));
    }

    if config.concurrency == 0 {
        return Err(VolunteerHubError::Config(
            "Push concurrency must be greater than 0".to_string()
        ));
    }

    Ok(())
}

fn validate_reminder_config(config: &super::ReminderConfig) -> Result<()> {
    if config.interval_seconds == 0 {
        return Err(VolunteerHubError::Config(
            "Reminder interval must be greater than 0".to_string()
        ));
    }

    if config.window_hours <= 0 {
        return Err(VolunteerHubError::Config(
            "Reminder window must be a positive number of hours".to_string()
        ));
    }

    Ok(())
}

/// Validate internationalization configuration
fn validate_i18n_config(config: &super::I18nConfig) -> Result<()> {
    if config.default_language.is_empty() {
        return Err(VolunteerHubError::Config(
            "Default language is required".to_string()
        ));
    }

    if config.supported_languages.is_empty() {
        return Err(VolunteerHubError::Config(
            "At least one supported language is required".to_string()
        ));
    }

    if !config.supported_languages.contains(&config.default_language) {
        return Err(VolunteerHubError::Config(
            "Default language must be in supported languages list".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(VolunteerHubError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(VolunteerHubError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
