//! Assistant executor contract and result type

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entity::AssistantConfig;
use crate::domain::llm::Usage;
use crate::domain::response::{ExtractionMethod, FieldMapping};
use crate::domain::workflow::ExecutionContext;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Where the assistant configuration comes from
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantSource {
    /// Stored assistant, loaded by ID, with optional per-step parameter overrides
    Managed {
        id: String,
        overrides: Option<Map<String, Value>>,
    },
    /// Configuration supplied by the step itself
    Inline(Box<AssistantConfig>),
}

impl AssistantSource {
    pub fn managed(id: impl Into<String>) -> Self {
        Self::Managed {
            id: id.into(),
            overrides: None,
        }
    }

    /// Attach API parameter overrides; inline configurations carry their own
    pub fn with_overrides(self, overrides: Map<String, Value>) -> Self {
        match self {
            Self::Managed { id, .. } => Self::Managed {
                id,
                overrides: Some(overrides),
            },
            inline => inline,
        }
    }

    pub fn inline(config: AssistantConfig) -> Self {
        Self::Inline(Box::new(config))
    }
}

/// Outcome of one assistant call.
///
/// Raw provider payloads are not kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutorResult {
    pub success: bool,

    /// Parsed data for JSON assistants, `{"output": text}` for text ones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Provider error code, when the provider reported one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,

    /// Seconds the provider asked to wait before retrying
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<FieldMapping>,

    /// Output path -> context path bindings of the assistant that ran
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub output_variables: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_method: Option<ExtractionMethod>,

    pub provider: String,

    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    pub interpolated_system_prompt: String,

    pub interpolated_user_message: String,

    pub execution_time_ms: u64,
}

impl ExecutorResult {
    /// Failed result carrying the error message and code
    pub fn from_error(error: &DomainError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            error_code: error.error_code().map(str::to_string),
            retry_after: error.retry_after(),
            ..Self::default()
        }
    }

    /// Output as an object map; text outputs are `{"output": ...}`
    pub fn output_map(&self) -> Map<String, Value> {
        match &self.output {
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                let mut map = Map::new();
                map.insert("output".to_string(), other.clone());
                map
            }
            None => Map::new(),
        }
    }

    /// Plain text answer, when the assistant answered in text
    pub fn text(&self) -> Option<&str> {
        self.output
            .as_ref()
            .and_then(|o| o.get("output"))
            .and_then(|v| v.as_str())
    }
}

/// Runs an assistant against a context
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AssistantExecutor: Send + Sync + std::fmt::Debug {
    /// Resolve, render, call and parse; failures come back as
    /// `success: false` results
    async fn execute(&self, source: AssistantSource, context: &ExecutionContext) -> ExecutorResult;
}
