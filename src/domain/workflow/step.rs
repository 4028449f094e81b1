//! Step contract and registry
//!
//! Each [`StepKind`] is backed by one [`Step`] implementation, looked up
//! through a [`StepRegistry`] built at startup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::context::ExecutionContext;
use super::entity::StepConfig;
use super::error::WorkflowError;

/// Kind of a workflow step
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepKind {
    /// Prompt defined inline in the step configuration
    AiAssistant,
    /// Prompt loaded from a stored assistant
    ManagedAssistant,
    /// Map free-text labels in the context to existing taxonomy terms
    TaxonomyResolution,
    /// Any type this build does not know; kept for reporting
    Unknown(String),
}

impl StepKind {
    pub fn type_name(&self) -> &str {
        match self {
            Self::AiAssistant => "ai_assistant",
            Self::ManagedAssistant => "managed_assistant",
            Self::TaxonomyResolution => "taxonomy_resolution",
            Self::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for StepKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ai_assistant" => Self::AiAssistant,
            "managed_assistant" => Self::ManagedAssistant,
            "taxonomy_resolution" => Self::TaxonomyResolution,
            _ => Self::Unknown(value),
        }
    }
}

impl From<&str> for StepKind {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<StepKind> for String {
    fn from(kind: StepKind) -> Self {
        kind.type_name().to_string()
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// A unit of work within a workflow
#[async_trait]
pub trait Step: Send + Sync + fmt::Debug {
    fn kind(&self) -> StepKind;

    /// Whether the step works on a virtual context (no entity behind it)
    fn is_external_compatible(&self) -> bool {
        false
    }

    /// Services that must be registered in the context
    fn required_services(&self) -> Vec<String> {
        Vec::new()
    }

    /// Context paths that must hold non-null data
    fn required_paths(&self, _config: &StepConfig) -> Vec<String> {
        Vec::new()
    }

    /// Configuration problems, empty when the config is usable
    fn validate_config(&self, config: &StepConfig) -> Vec<String>;

    /// Run the step, mutating the context; the returned value is recorded
    /// as the step output
    async fn execute(
        &self,
        context: &mut ExecutionContext,
        config: &StepConfig,
    ) -> Result<Value, WorkflowError>;
}

/// Reason a step cannot run against `context`, if any
pub fn eligibility(step: &dyn Step, context: &ExecutionContext, config: &StepConfig) -> Option<String> {
    if context.is_virtual() && !step.is_external_compatible() {
        return Some("incompatible with virtual context".to_string());
    }

    if let Some(service) = step
        .required_services()
        .into_iter()
        .find(|name| !context.has_service(name))
    {
        return Some(format!("missing service {}", service));
    }

    step.required_paths(config)
        .into_iter()
        .find(|path| !context.has(path))
        .map(|path| format!("missing data at path {}", path))
}

/// Step implementations keyed by kind
#[derive(Debug, Clone, Default)]
pub struct StepRegistry {
    steps: HashMap<StepKind, Arc<dyn Step>>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a step under its own kind, replacing any previous one
    pub fn register(&mut self, step: Arc<dyn Step>) {
        self.steps.insert(step.kind(), step);
    }

    pub fn with_step(mut self, step: Arc<dyn Step>) -> Self {
        self.register(step);
        self
    }

    pub fn get(&self, kind: &StepKind) -> Option<Arc<dyn Step>> {
        self.steps.get(kind).cloned()
    }

    pub fn contains(&self, kind: &StepKind) -> bool {
        self.steps.contains_key(kind)
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockStep;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_kind_serde() {
        let kind: StepKind = serde_json::from_value(json!("taxonomy_resolution")).unwrap();
        assert_eq!(kind, StepKind::TaxonomyResolution);

        let unknown: StepKind = serde_json::from_value(json!("image_generation")).unwrap();
        assert_eq!(unknown, StepKind::Unknown("image_generation".to_string()));
        assert!(!unknown.is_known());
        assert_eq!(serde_json::to_value(&unknown).unwrap(), json!("image_generation"));
        assert_eq!(serde_json::to_value(StepKind::AiAssistant).unwrap(), json!("ai_assistant"));
    }

    #[test]
    fn test_eligibility_virtual_context() {
        let step = MockStep::new(StepKind::AiAssistant).entity_only();
        let config = StepConfig::new("s", StepKind::AiAssistant);

        let virt = ExecutionContext::virtual_context(json!({}));
        assert_eq!(
            eligibility(&step, &virt, &config).as_deref(),
            Some("incompatible with virtual context")
        );

        let real = ExecutionContext::for_entity(1, json!({}));
        assert_eq!(eligibility(&step, &real, &config), None);
    }

    #[test]
    fn test_eligibility_missing_service_and_path() {
        let config = StepConfig::new("s", StepKind::AiAssistant);
        let ctx = ExecutionContext::virtual_context(json!({"post": {"title": null}}));

        let needs_service = MockStep::new(StepKind::AiAssistant).requiring_service("terms");
        assert_eq!(
            eligibility(&needs_service, &ctx, &config).as_deref(),
            Some("missing service terms")
        );

        let needs_path = MockStep::new(StepKind::AiAssistant).requiring_path("post.title");
        assert_eq!(
            eligibility(&needs_path, &ctx, &config).as_deref(),
            Some("missing data at path post.title")
        );
    }

    #[test]
    fn test_registry() {
        let registry = StepRegistry::new()
            .with_step(Arc::new(MockStep::new(StepKind::TaxonomyResolution)))
            .with_step(Arc::new(MockStep::new(StepKind::AiAssistant)));

        assert!(registry.contains(&StepKind::AiAssistant));
        assert!(registry.get(&StepKind::ManagedAssistant).is_none());
    }
}
