//! Provider resolver trait for resolving provider names to chat providers

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

use super::ChatProvider;
use crate::domain::DomainError;

/// Trait for resolving the provider named in an assistant configuration.
///
/// This abstraction lets the assistant executor pick a provider per
/// assistant rather than using a single hardcoded provider.
#[async_trait]
pub trait ProviderResolver: Send + Sync + Debug {
    /// Resolve a provider name to a provider instance.
    ///
    /// # Returns
    /// * `Ok(Arc<dyn ChatProvider>)` - The provider instance
    /// * `Err(DomainError)` - If no provider is registered under that name
    async fn resolve(&self, provider_name: &str) -> Result<Arc<dyn ChatProvider>, DomainError>;
}

/// A simple provider resolver that always returns the same provider.
///
/// Useful for testing or when every assistant uses the same vendor.
#[derive(Debug)]
pub struct StaticProviderResolver {
    provider: Arc<dyn ChatProvider>,
}

impl StaticProviderResolver {
    /// Create a new static provider resolver.
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ProviderResolver for StaticProviderResolver {
    async fn resolve(&self, _provider_name: &str) -> Result<Arc<dyn ChatProvider>, DomainError> {
        Ok(self.provider.clone())
    }
}

/// Name-keyed provider registry with an optional default
#[derive(Debug, Default)]
pub struct RegistryProviderResolver {
    providers: HashMap<String, Arc<dyn ChatProvider>>,
    default_provider: Option<String>,
}

impl RegistryProviderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, name: impl Into<String>, provider: Arc<dyn ChatProvider>) -> Self {
        self.providers.insert(name.into(), provider);
        self
    }

    /// Provider used when an assistant names no provider
    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default_provider = Some(name.into());
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[async_trait]
impl ProviderResolver for RegistryProviderResolver {
    async fn resolve(&self, provider_name: &str) -> Result<Arc<dyn ChatProvider>, DomainError> {
        let name = if provider_name.is_empty() {
            self.default_provider.as_deref().ok_or_else(|| {
                DomainError::configuration("No provider named and no default provider configured")
            })?
        } else {
            provider_name
        };

        debug!(provider = %name, "Resolving chat provider");

        self.providers.get(name).cloned().ok_or_else(|| {
            DomainError::configuration(format!("Provider '{}' is not configured", name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::MockChatProvider;

    #[tokio::test]
    async fn test_static_provider_resolver() {
        let mock_provider = Arc::new(MockChatProvider::new("mock"));
        let resolver = StaticProviderResolver::new(mock_provider.clone());

        let resolved = resolver.resolve("anything").await.unwrap();
        assert_eq!(resolved.provider_name(), "mock");
    }

    #[tokio::test]
    async fn test_registry_resolves_by_name() {
        let resolver = RegistryProviderResolver::new()
            .with_provider("openai", Arc::new(MockChatProvider::new("openai")))
            .with_provider("claude", Arc::new(MockChatProvider::new("claude")));

        let resolved = resolver.resolve("claude").await.unwrap();
        assert_eq!(resolved.provider_name(), "claude");
        assert_eq!(resolver.provider_names(), vec!["claude", "openai"]);
    }

    #[tokio::test]
    async fn test_registry_unknown_provider_is_config_error() {
        let resolver = RegistryProviderResolver::new()
            .with_provider("openai", Arc::new(MockChatProvider::new("openai")));

        let err = resolver.resolve("gemini").await.unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_registry_empty_name_uses_default() {
        let resolver = RegistryProviderResolver::new()
            .with_provider("openai", Arc::new(MockChatProvider::new("openai")))
            .with_default("openai");

        let resolved = resolver.resolve("").await.unwrap();
        assert_eq!(resolved.provider_name(), "openai");
    }
}
