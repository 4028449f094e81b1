use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::assistants::{OpenAiAssistantsProvider, PollConfig};
use super::http_client::HttpClient;
use super::{AnthropicProvider, OpenAiProvider};
use crate::config::{HttpConfig, PollingConfig, ProviderSettings, ProvidersConfig};
use crate::domain::{ChatProvider, DomainError, RegistryProviderResolver};

pub const OPENAI: &str = "openai";
pub const ANTHROPIC: &str = "anthropic";
pub const OPENAI_ASSISTANTS: &str = "openai_assistants";

/// Factory for creating chat providers from configuration
#[derive(Debug)]
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Build a resolver holding every provider that has an API key.
    ///
    /// Providers without a key are left out; naming one later is a
    /// configuration error at resolve time.
    pub fn build_resolver(
        providers: &ProvidersConfig,
        http: &HttpConfig,
        polling: &PollingConfig,
    ) -> Result<RegistryProviderResolver, DomainError> {
        let client = HttpClient::with_timeout(Duration::from_secs(http.timeout_secs))?;
        let mut resolver = RegistryProviderResolver::new();

        if let Some(provider) = Self::create_openai(&providers.openai, client.clone()) {
            resolver = resolver.with_provider(OPENAI, provider);
        }
        if let Some(provider) = Self::create_anthropic(&providers.anthropic, client.clone()) {
            resolver = resolver.with_provider(ANTHROPIC, provider);
        }
        if let Some(provider) =
            Self::create_openai_assistants(&providers.openai_assistants, client, polling)
        {
            resolver = resolver.with_provider(OPENAI_ASSISTANTS, provider);
        }

        let configured = resolver.provider_names();
        if configured.is_empty() {
            warn!("No chat providers configured; assistant steps will fail");
        } else {
            info!(providers = ?configured, default = %providers.default, "Chat providers configured");
        }

        Ok(resolver.with_default(providers.default.clone()))
    }

    pub fn create_openai(
        settings: &ProviderSettings,
        client: HttpClient,
    ) -> Option<Arc<dyn ChatProvider>> {
        let api_key = settings.api_key()?;
        let provider = match &settings.base_url {
            Some(base_url) => OpenAiProvider::with_base_url(client, api_key, base_url),
            None => OpenAiProvider::new(client, api_key),
        };
        Some(Arc::new(provider))
    }

    pub fn create_anthropic(
        settings: &ProviderSettings,
        client: HttpClient,
    ) -> Option<Arc<dyn ChatProvider>> {
        let api_key = settings.api_key()?;
        let provider = match &settings.base_url {
            Some(base_url) => AnthropicProvider::with_base_url(client, api_key, base_url),
            None => AnthropicProvider::new(client, api_key),
        };
        Some(Arc::new(provider))
    }

    pub fn create_openai_assistants(
        settings: &ProviderSettings,
        client: HttpClient,
        polling: &PollingConfig,
    ) -> Option<Arc<dyn ChatProvider>> {
        let api_key = settings.api_key()?;
        let mut provider = match &settings.base_url {
            Some(base_url) => OpenAiAssistantsProvider::with_base_url(client, api_key, base_url),
            None => OpenAiAssistantsProvider::new(client, api_key),
        }
        .with_poll_config(PollConfig {
            interval: Duration::from_millis(polling.interval_ms),
            max_attempts: polling.max_attempts,
        });

        if let Some(assistant_id) = &settings.default_assistant_id {
            provider = provider.with_default_assistant(assistant_id);
        }

        Some(Arc::new(provider))
    }
}
