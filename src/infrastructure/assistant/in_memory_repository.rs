//! In-memory assistant repository implementation

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{AssistantConfig, AssistantRepository, DomainError};

/// In-memory implementation of AssistantRepository, keyed by assistant ID
#[derive(Debug, Default)]
pub struct InMemoryAssistantRepository {
    assistants: Arc<RwLock<HashMap<String, AssistantConfig>>>,
}

impl InMemoryAssistantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with assistants.
    ///
    /// Assistants without an ID cannot be looked up and are rejected.
    pub fn with_assistants(assistants: Vec<AssistantConfig>) -> Result<Self, DomainError> {
        let mut map = HashMap::with_capacity(assistants.len());
        for assistant in assistants {
            let id = Self::require_id(&assistant)?;
            map.insert(id, assistant);
        }

        Ok(Self {
            assistants: Arc::new(RwLock::new(map)),
        })
    }

    fn require_id(assistant: &AssistantConfig) -> Result<String, DomainError> {
        assistant
            .id
            .as_ref()
            .filter(|id| !id.trim().is_empty())
            .cloned()
            .ok_or_else(|| DomainError::validation("Stored assistants need an id"))
    }
}

#[async_trait]
impl AssistantRepository for InMemoryAssistantRepository {
    async fn get_assistant(&self, id: &str) -> Result<Option<AssistantConfig>, DomainError> {
        let assistants = self.assistants.read().await;
        Ok(assistants.get(id).cloned())
    }

    async fn save_assistant(&self, assistant: AssistantConfig) -> Result<AssistantConfig, DomainError> {
        let id = Self::require_id(&assistant)?;
        let mut assistants = self.assistants.write().await;
        assistants.insert(id, assistant.clone());
        Ok(assistant)
    }

    async fn list_assistants(&self) -> Result<Vec<AssistantConfig>, DomainError> {
        let assistants = self.assistants.read().await;
        let mut list: Vec<AssistantConfig> = assistants.values().cloned().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(list)
    }
}
