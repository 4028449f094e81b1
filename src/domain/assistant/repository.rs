//! Assistant repository trait

use async_trait::async_trait;

use super::entity::AssistantConfig;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Storage for named assistant configurations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AssistantRepository: Send + Sync + std::fmt::Debug {
    /// Get an assistant by ID
    async fn get_assistant(&self, id: &str) -> Result<Option<AssistantConfig>, DomainError>;

    /// Create or replace an assistant; the config must carry an ID
    async fn save_assistant(&self, assistant: AssistantConfig) -> Result<AssistantConfig, DomainError>;

    /// List all assistants, ordered by ID
    async fn list_assistants(&self) -> Result<Vec<AssistantConfig>, DomainError>;
}
