//! In-memory workflow repository implementation

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{DomainError, Workflow, WorkflowId, WorkflowRepository};

/// In-memory implementation of WorkflowRepository
#[derive(Debug, Default)]
pub struct InMemoryWorkflowRepository {
    workflows: Arc<RwLock<BTreeMap<String, Workflow>>>,
}

impl InMemoryWorkflowRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with workflows
    pub fn with_workflows(workflows: Vec<Workflow>) -> Self {
        let map: BTreeMap<String, Workflow> = workflows
            .into_iter()
            .map(|w| (w.id().as_str().to_string(), w))
            .collect();

        Self {
            workflows: Arc::new(RwLock::new(map)),
        }
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn get_workflow(&self, id: &WorkflowId) -> Result<Option<Workflow>, DomainError> {
        let workflows = self.workflows.read().await;
        Ok(workflows.get(id.as_str()).cloned())
    }

    async fn save_workflow(&self, workflow: Workflow) -> Result<Workflow, DomainError> {
        workflow
            .validate()
            .map_err(|e| DomainError::validation(e.to_string()))?;

        let mut workflows = self.workflows.write().await;
        workflows.insert(workflow.id().as_str().to_string(), workflow.clone());
        Ok(workflow)
    }

    async fn list_workflows(&self) -> Result<Vec<Workflow>, DomainError> {
        let workflows = self.workflows.read().await;
        Ok(workflows.values().cloned().collect())
    }

    async fn delete_workflow(&self, id: &WorkflowId) -> Result<bool, DomainError> {
        let mut workflows = self.workflows.write().await;
        Ok(workflows.remove(id.as_str()).is_some())
    }
}
