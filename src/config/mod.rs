mod app_config;

pub use app_config::{
    AppConfig, HttpConfig, LogFormat, LoggingConfig, PollingConfig, ProviderSettings,
    ProvidersConfig, TranslationConfig,
};
