use std::collections::BTreeMap;

use serde::Deserialize;

use crate::domain::RoutingRule;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    pub polling: PollingConfig,
    pub providers: ProvidersConfig,
    pub translation: TranslationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Outbound HTTP settings shared by all providers
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

/// Polling budget for job-style providers
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub max_attempts: u32,
}

/// Credentials and endpoint for one provider
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Stored assistant used when a request names none (assistants API only)
    pub default_assistant_id: Option<String>,
}

impl ProviderSettings {
    /// A provider is enabled once it has a non-empty API key
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Provider used by assistants that name none
    pub default: String,
    pub openai: ProviderSettings,
    pub anthropic: ProviderSettings,
    pub openai_assistants: ProviderSettings,
}

/// Enabled languages, routing rules and per-pair translation assistants
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub languages: Vec<String>,
    pub rules: Vec<RoutingRule>,
    /// `"source->target"` to assistant ID
    pub assistants: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 120 }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            max_attempts: 60,
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            default: "openai".to_string(),
            openai: ProviderSettings::default(),
            anthropic: ProviderSettings::default(),
            openai_assistants: ProviderSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.providers.default, "openai");
        assert_eq!(config.polling.max_attempts, 60);
        assert!(config.translation.languages.is_empty());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let source = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [logging]
                format = "json"

                [providers.anthropic]
                api_key = "sk-ant"

                [translation]
                languages = ["en", "fr", "de"]
                rules = [{ source = "en", target = "de", intermediate = "fr" }]

                [translation.assistants]
                "en->fr" = "translator_en_fr"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let config: AppConfig = source.try_deserialize().unwrap();

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.providers.anthropic.api_key(), Some("sk-ant"));
        assert_eq!(config.providers.openai.api_key(), None);
        assert_eq!(config.translation.rules.len(), 1);
        assert_eq!(
            config.translation.assistants.get("en->fr").map(String::as_str),
            Some("translator_en_fr")
        );
    }

    #[test]
    fn test_blank_api_key_is_disabled() {
        let settings = ProviderSettings {
            api_key: Some("  ".to_string()),
            ..ProviderSettings::default()
        };
        assert_eq!(settings.api_key(), None);
    }
}
