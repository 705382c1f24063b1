//! Translation loader and i18n management
//!
//! Built-in translations are embedded at compile time. A translations
//! directory, when configured, is merged on top key by key.

use std::collections::HashMap;
use std::path::Path;
use serde_json::{Value, Map};
use tokio::fs;
use tracing::{info, warn, debug};
use crate::utils::errors::{VolunteerHubError, Result};
use crate::config::I18nConfig;

const EMBEDDED: &[(&str, &str)] = &[
    ("en", include_str!("../../translations/en.json")),
    ("vi", include_str!("../../translations/vi.json")),
];

/// Main internationalization manager
#[derive(Debug, Clone)]
pub struct I18n {
    /// Loaded translations by language code
    translations: HashMap<String, Map<String, Value>>,
    /// Default language code
    default_language: String,
    /// Supported language codes
    supported_languages: Vec<String>,
}

/// Translation parameters for message formatting
pub type TranslationParams = HashMap<String, String>;

impl I18n {
    /// Create an instance holding the embedded translations
    pub fn new(config: &I18nConfig) -> Result<Self> {
        let mut i18n = Self {
            translations: HashMap::new(),
            default_language: config.default_language.clone(),
            supported_languages: config.supported_languages.clone(),
        };

        for (lang_code, content) in EMBEDDED {
            i18n.merge_language(lang_code, content)?;
        }

        if !i18n.translations.contains_key(&i18n.default_language) {
            return Err(VolunteerHubError::Config(format!(
                "No translations available for default language {}",
                i18n.default_language
            )));
        }

        Ok(i18n)
    }

    /// Embedded translations plus overrides from `config.translations_dir`
    pub async fn load(config: &I18nConfig) -> Result<Self> {
        let mut i18n = Self::new(config)?;
        if let Some(dir) = &config.translations_dir {
            i18n.load_overrides(Path::new(dir)).await?;
        }
        Ok(i18n)
    }

    /// Merge `<lang>.json` files of every supported language found in `dir`
    pub async fn load_overrides(&mut self, dir: &Path) -> Result<()> {
        if !dir.exists() {
            warn!("Translations directory not found: {}", dir.display());
            return Ok(());
        }

        let supported_languages = self.supported_languages.clone();
        for lang_code in &supported_languages {
            let file_path = dir.join(format!("{}.json", lang_code));
            if !file_path.exists() {
                debug!("No translation override for {}", lang_code);
                continue;
            }

            let content = fs::read_to_string(&file_path).await?;
            self.merge_language(lang_code, &content)?;
            info!("Loaded translation overrides for language: {}", lang_code);
        }

        Ok(())
    }

    fn merge_language(&mut self, lang_code: &str, content: &str) -> Result<()> {
        let parsed: Value = serde_json::from_str(content)?;
        let Value::Object(map) = parsed else {
            return Err(VolunteerHubError::Config(
                format!("Invalid translation file format for {}", lang_code)
            ));
        };

        let target = self.translations.entry(lang_code.to_string()).or_default();
        merge_maps(target, map);
        Ok(())
    }

    /// Get a translated message
    pub fn t(&self, key: &str, lang: &str, params: Option<&TranslationParams>) -> String {
        let effective_lang = self.get_effective_language(lang);

        let value = self
            .get_translation_value(key, &effective_lang)
            .or_else(|| self.get_translation_value(key, &self.default_language));

        match value {
            Some(translation) => {
                let text = self.extract_text_from_value(translation);
                self.format_message(&text, params)
            }
            None => {
                warn!("Translation key '{}' not found", key);
                key.to_string()
            }
        }
    }

    /// Get a translated message with pluralization support
    pub fn tp(&self, key: &str, lang: &str, count: i64, params: Option<&TranslationParams>) -> String {
        let effective_lang = self.get_effective_language(lang);
        let plural_key = format!("{}.{}", key, self.get_plural_form(count, &effective_lang));

        let mut final_params = params.cloned().unwrap_or_default();
        final_params.insert("count".to_string(), count.to_string());

        if self.get_translation_value(&plural_key, &effective_lang).is_some() {
            self.t(&plural_key, &effective_lang, Some(&final_params))
        } else {
            // Language without this plural form, fall back to the generic form
            self.t(key, &effective_lang, Some(&final_params))
        }
    }

    /// Check if a language is supported
    pub fn is_language_supported(&self, lang: &str) -> bool {
        self.supported_languages.iter().any(|l| l == lang)
    }

    /// Get the effective language (fallback to default if not supported)
    fn get_effective_language(&self, lang: &str) -> String {
        if self.is_language_supported(lang) && self.translations.contains_key(lang) {
            lang.to_string()
        } else {
            self.default_language.clone()
        }
    }

    /// Get translation value from nested JSON structure
    fn get_translation_value(&self, key: &str, lang: &str) -> Option<&Value> {
        let translations = self.translations.get(lang)?;

        // Nested keys like "notifications.completed.title"
        let mut parts = key.split('.');
        let mut current = translations.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }

        Some(current)
    }

    /// Extract text from JSON value (handle both strings and objects with pluralization)
    fn extract_text_from_value(&self, value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Object(obj) => {
                // For pluralization objects, default to "other" or first available key
                if let Some(other) = obj.get("other") {
                    self.extract_text_from_value(other)
                } else if let Some((_, first_value)) = obj.iter().next() {
                    self.extract_text_from_value(first_value)
                } else {
                    String::new()
                }
            }
            _ => value.to_string(),
        }
    }

    /// Format message with parameters
    fn format_message(&self, template: &str, params: Option<&TranslationParams>) -> String {
        match params {
            Some(params) => params.iter().fold(template.to_string(), |acc, (key, value)| {
                acc.replace(&format!("{{{}}}", key), value)
            }),
            None => template.to_string(),
        }
    }

    /// Determine plural form based on language-specific rules
    fn get_plural_form(&self, count: i64, lang: &str) -> &'static str {
        match lang {
            // Vietnamese has no grammatical plural
            "vi" => "other",
            _ => {
                if count == 1 { "one" } else { "other" }
            }
        }
    }

    /// Get supported languages
    pub fn supported_languages(&self) -> &[String] {
        &self.supported_languages
    }

    /// Get default language
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Normalize a stored language code such as `vi-VN` to a supported one
    pub fn resolve_language(&self, code: Option<&str>) -> String {
        code.and_then(|c| c.split(['-', '_']).next())
            .map(|c| c.trim().to_ascii_lowercase())
            .filter(|c| self.is_language_supported(c))
            .unwrap_or_else(|| self.default_language.clone())
    }

    /// Pick the best supported language from an `Accept-Language` header
    pub fn detect_language(&self, accept_language: Option<&str>) -> String {
        let Some(header) = accept_language else {
            return self.default_language.clone();
        };

        let mut candidates: Vec<(String, f32)> = header
            .split(',')
            .filter_map(|part| {
                let mut pieces = part.trim().split(';');
                let tag = pieces.next()?.trim();
                let quality = pieces
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.parse::<f32>().ok())
                    .unwrap_or(1.0);
                let code = tag.split('-').next()?.to_ascii_lowercase();
                Some((code, quality))
            })
            .filter(|(code, quality)| *quality > 0.0 && self.is_language_supported(code))
            .collect();

        // Stable sort keeps header order among equal weights
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        candidates
            .into_iter()
            .next()
            .map(|(code, _)| code)
            .unwrap_or_else(|| self.default_language.clone())
    }
}

fn merge_maps(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => merge_maps(existing, incoming),
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> I18nConfig {
        I18nConfig {
            default_language: "en".to_string(),
            supported_languages: vec!["en".to_string(), "vi".to_string()],
            translations_dir: None,
        }
    }

    fn params(pairs: &[(&str, &str)]) -> TranslationParams {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_plural_forms() {
        let i18n = I18n::new(&create_test_config()).unwrap();
        let p = params(&[("event_title", "Cleanup"), ("location", "Park")]);

        assert_eq!(i18n.tp("reminders.starts_in", "en", 1, Some(&p)), "\"Cleanup\" starts in 1 hour at Park.");
        assert_eq!(i18n.tp("reminders.starts_in", "en", 5, Some(&p)), "\"Cleanup\" starts in 5 hours at Park.");
        assert!(i18n.tp("reminders.starts_in", "vi", 1, Some(&p)).contains("sau 1 giờ"));
    }

    #[test]
    fn test_language_detection() {
        let i18n = I18n::new(&create_test_config()).unwrap();

        assert_eq!(i18n.detect_language(Some("vi-VN,vi;q=0.9,en;q=0.8")), "vi");
        assert_eq!(i18n.detect_language(Some("fr-FR,en;q=0.5,vi;q=0.7")), "vi");
        assert_eq!(i18n.detect_language(Some("fr")), "en");
        assert_eq!(i18n.detect_language(None), "en");
        assert_eq!(i18n.resolve_language(Some("vi_VN")), "vi");
        assert_eq!(i18n.resolve_language(Some("de")), "en");
    }

    #[test]
    fn test_missing_key_falls_back() {
        let i18n = I18n::new(&create_test_config()).unwrap();

        assert_eq!(i18n.t("errors.event_full", "fr", None), "This event is full.");
        assert_eq!(i18n.t("errors.no_such_code", "en", None), "errors.no_such_code");
    }

    #[test]
    fn test_message_formatting() {
        let i18n = I18n::new(&create_test_config()).unwrap();
        let p = params(&[("event_title", "Tree planting")]);

        assert_eq!(
            i18n.t("notifications.checked_in.message", "en", Some(&p)),
            "You have been checked in at \"Tree planting\"."
        );
    }

    #[tokio::test]
    async fn test_directory_overrides_merge() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en.json"), r#"{"errors": {"event_full": "No seats left."}}"#).unwrap();

        let mut i18n = I18n::new(&create_test_config()).unwrap();
        i18n.load_overrides(dir.path()).await.unwrap();

        assert_eq!(i18n.t("errors.event_full", "en", None), "No seats left.");
        assert_eq!(i18n.t("errors.already_registered", "en", None), "You are already registered for this event.");
    }
}
