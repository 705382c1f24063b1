//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub push: PushConfig,
    pub reminders: ReminderConfig,
    pub i18n: I18nConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Bearer token verification
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Web Push (VAPID) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PushConfig {
    pub enabled: bool,
    /// Uncompressed P-256 public key, base64url without padding
    pub vapid_public_key: String,
    /// PKCS#8 PEM encoded P-256 private key
    pub vapid_private_key_pem: String,
    /// `mailto:` or `https:` contact sent in the VAPID `sub` claim
    pub subject: String,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub ttl_seconds: u32,
    pub timeout_seconds: u64,
    pub concurrency: usize,
}

/// Scheduled reminder sweep configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReminderConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
    pub window_hours: i64,
}

/// Internationalization configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct I18nConfig {
    pub default_language: String,
    pub supported_languages: Vec<String>,
    /// Directory with `<lang>.json` files overriding the built-in translations
    pub translations_dir: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&Settings::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("VOLUNTEERHUB")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("i18n.supported_languages")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::VolunteerHubError> {
        super::validation::validate_settings(self)
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/volunteerhub".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            auth: AuthConfig {
                jwt_secret: String::new(),
            },
            push: PushConfig {
                enabled: false,
                vapid_public_key: String::new(),
                vapid_private_key_pem: String::new(),
                subject: "mailto:admin@volunteerhub.local".to_string(),
                icon: Some("/icons/icon-192x192.png".to_string()),
                badge: Some("/icons/badge-72x72.png".to_string()),
                ttl_seconds: 86_400,
                timeout_seconds: 10,
                concurrency: 8,
            },
            reminders: ReminderConfig {
                enabled: true,
                interval_seconds: 3600,
                window_hours: 24,
            },
            i18n: I18nConfig {
                default_language: "en".to_string(),
                supported_languages: vec!["en".to_string(), "vi".to_string()],
                translations_dir: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "logs".to_string(),
            },
        }
    }
}
