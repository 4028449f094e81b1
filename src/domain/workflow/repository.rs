//! Workflow repository trait

use async_trait::async_trait;

use super::entity::{Workflow, WorkflowId};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Storage for workflow definitions
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WorkflowRepository: Send + Sync + std::fmt::Debug {
    /// Get a workflow by ID
    async fn get_workflow(&self, id: &WorkflowId) -> Result<Option<Workflow>, DomainError>;

    /// Create or replace a workflow
    async fn save_workflow(&self, workflow: Workflow) -> Result<Workflow, DomainError>;

    /// List all workflows, ordered by ID
    async fn list_workflows(&self) -> Result<Vec<Workflow>, DomainError>;

    /// Delete a workflow, returning whether it existed
    async fn delete_workflow(&self, id: &WorkflowId) -> Result<bool, DomainError>;

    /// Enabled workflows for a content language
    async fn list_enabled_for_language(&self, language: &str) -> Result<Vec<Workflow>, DomainError> {
        Ok(self
            .list_workflows()
            .await?
            .into_iter()
            .filter(|w| w.is_enabled() && w.language() == language)
            .collect())
    }
}
