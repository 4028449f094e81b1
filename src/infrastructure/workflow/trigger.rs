//! Workflow triggers: translation-completed events and manual runs

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::domain::workflow::ServiceRegistry;
use crate::domain::{
    DomainError, ExecutionContext, LegacyContextAdapter, RunOptions, WorkflowError,
    WorkflowExecutor, WorkflowId, WorkflowRepository, WorkflowResult,
};

#[cfg(test)]
use mockall::automock;

/// A translated post became available
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationCompletedEvent {
    /// The translated post
    pub post_id: u64,

    /// The post it was translated from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_post_id: Option<u64>,

    pub source_language: String,

    pub target_language: String,

    /// Post data; flat legacy keys (`post_title`, `meta_x`) are accepted
    #[serde(default)]
    pub data: Value,
}

/// Builds the context a triggered run starts from
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContextFactory: Send + Sync + std::fmt::Debug {
    async fn for_translation(
        &self,
        event: &TranslationCompletedEvent,
    ) -> Result<ExecutionContext, DomainError>;
}

/// Entity context from the event payload, with a shared service registry
#[derive(Debug, Clone, Default)]
pub struct DefaultContextFactory {
    services: ServiceRegistry,
}

impl DefaultContextFactory {
    pub fn new(services: ServiceRegistry) -> Self {
        Self { services }
    }
}

#[async_trait]
impl ContextFactory for DefaultContextFactory {
    async fn for_translation(
        &self,
        event: &TranslationCompletedEvent,
    ) -> Result<ExecutionContext, DomainError> {
        let data = match &event.data {
            Value::Object(map) => LegacyContextAdapter::from_legacy(map),
            Value::Null => json!({}),
            other => {
                return Err(DomainError::validation(format!(
                    "Event data must be an object, got {}",
                    other
                )))
            }
        };

        let mut context = ExecutionContext::for_entity(event.post_id, data)
            .with_services(self.services.clone());

        context.set("translation.source_language", json!(event.source_language))?;
        context.set("translation.target_language", json!(event.target_language))?;
        if let Some(source_post_id) = event.source_post_id {
            context.set("original.post_id", json!(source_post_id))?;
        }

        Ok(context)
    }
}

/// Starts workflow runs
#[derive(Debug, Clone)]
pub struct WorkflowTriggerService {
    repository: Arc<dyn WorkflowRepository>,
    executor: Arc<dyn WorkflowExecutor>,
    contexts: Arc<dyn ContextFactory>,
}

impl WorkflowTriggerService {
    pub fn new(
        repository: Arc<dyn WorkflowRepository>,
        executor: Arc<dyn WorkflowExecutor>,
        contexts: Arc<dyn ContextFactory>,
    ) -> Self {
        Self {
            repository,
            executor,
            contexts,
        }
    }

    /// Run every enabled, translation-triggered workflow for the event's
    /// target language, each with a fresh context.
    ///
    /// A workflow that cannot start is logged and left out of the results.
    pub async fn on_translation_completed(
        &self,
        event: &TranslationCompletedEvent,
    ) -> Result<Vec<WorkflowResult>, WorkflowError> {
        let workflows = self
            .repository
            .list_enabled_for_language(&event.target_language)
            .await?;

        let mut results = Vec::new();

        for workflow in workflows {
            if !workflow.triggers().fires_on_translation() {
                continue;
            }

            let context = self.contexts.for_translation(event).await?;
            if !workflow.triggers().conditions_match(&context.export()) {
                info!(workflow_id = %workflow.id(), post_id = event.post_id, "Trigger conditions not met");
                continue;
            }

            info!(
                workflow_id = %workflow.id(),
                post_id = event.post_id,
                language = %event.target_language,
                "Translation completed, starting workflow"
            );

            match self.executor.execute(&workflow, context, RunOptions::default()).await {
                Ok(result) => results.push(result),
                Err(e) => warn!(workflow_id = %workflow.id(), error = %e, "Workflow could not run"),
            }
        }

        Ok(results)
    }

    /// Run one workflow on demand, ignoring its trigger flags
    pub async fn run_manual(
        &self,
        workflow_id: &str,
        context: ExecutionContext,
        options: RunOptions,
    ) -> Result<WorkflowResult, WorkflowError> {
        let id = WorkflowId::new(workflow_id)?;
        let workflow = self
            .repository
            .get_workflow(&id)
            .await?
            .ok_or_else(|| WorkflowError::not_found(workflow_id))?;

        if !workflow.is_enabled() {
            return Err(WorkflowError::disabled(workflow_id));
        }

        info!(workflow_id = %workflow_id, dry_run = options.dry_run, "Starting manual workflow run");
        self.executor.execute(&workflow, context, options).await
    }
}
