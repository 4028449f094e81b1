//! Workflow domain entity

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::error::WorkflowError;
use super::step::StepKind;
use crate::domain::response::get_nested_value;

/// Maximum length for workflow and step IDs
pub const MAX_ID_LENGTH: usize = 64;

/// Alphanumeric, hyphens and underscores; starts with an alphanumeric
static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_-]*$").unwrap());

/// Validated workflow identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkflowId(String);

impl WorkflowId {
    /// Create a new validated workflow ID
    pub fn new(id: impl Into<String>) -> Result<Self, WorkflowError> {
        let id = id.into();
        validate_identifier("Workflow", &id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WorkflowId {
    type Error = WorkflowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkflowId> for String {
    fn from(id: WorkflowId) -> Self {
        id.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for WorkflowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate a workflow or step identifier
pub fn validate_identifier(kind: &str, id: &str) -> Result<(), WorkflowError> {
    if id.is_empty() {
        return Err(WorkflowError::validation(format!("{} ID cannot be empty", kind)));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(WorkflowError::validation(format!(
            "{} ID exceeds maximum length of {} characters",
            kind, MAX_ID_LENGTH
        )));
    }

    if !ID_PATTERN.is_match(id) {
        return Err(WorkflowError::validation(format!(
            "Invalid {} ID '{}': must be alphanumeric with hyphens or underscores, starting with alphanumeric",
            kind.to_lowercase(),
            id
        )));
    }

    Ok(())
}

/// Action to take when a step fails
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnErrorAction {
    /// Record the failure and continue with the next step
    #[default]
    SkipStep,

    /// Stop the run at this step (critical step)
    FailWorkflow,
}

/// One configured step of a workflow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepConfig {
    /// Unique id within the workflow
    id: String,

    /// Step kind, selects the implementation
    #[serde(rename = "type")]
    kind: StepKind,

    #[serde(default = "default_true")]
    enabled: bool,

    #[serde(default)]
    on_error: OnErrorAction,

    /// Kind-specific settings
    #[serde(default)]
    config: Map<String, Value>,
}

impl StepConfig {
    pub fn new(id: impl Into<String>, kind: StepKind) -> Self {
        Self {
            id: id.into(),
            kind,
            enabled: true,
            on_error: OnErrorAction::default(),
            config: Map::new(),
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_on_error(mut self, action: OnErrorAction) -> Self {
        self.on_error = action;
        self
    }

    pub fn with_config(mut self, config: Map<String, Value>) -> Self {
        self.config = config;
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &StepKind {
        &self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn on_error(&self) -> OnErrorAction {
        self.on_error
    }

    /// Whether a failure of this step halts the run
    pub fn is_critical(&self) -> bool {
        self.on_error == OnErrorAction::FailWorkflow
    }

    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    /// Non-empty string setting
    pub fn str_setting(&self, key: &str) -> Option<&str> {
        self.config
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// When a workflow runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowTriggers {
    /// Run automatically when a translation completes
    #[serde(default = "default_true")]
    pub on_translation_complete: bool,

    /// Only run when started explicitly
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub manual_only: bool,

    /// Extra matching conditions, e.g. `{"post_type": "post"}`
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub conditions: Map<String, Value>,
}

impl Default for WorkflowTriggers {
    fn default() -> Self {
        Self {
            on_translation_complete: true,
            manual_only: false,
            conditions: Map::new(),
        }
    }
}

impl WorkflowTriggers {
    pub fn manual() -> Self {
        Self {
            manual_only: true,
            ..Self::default()
        }
    }

    /// Whether a completed translation should start the workflow
    pub fn fires_on_translation(&self) -> bool {
        self.on_translation_complete && !self.manual_only
    }

    /// Every condition must equal the value found at the same key in `facts`
    pub fn conditions_match(&self, facts: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(key, expected)| get_nested_value(facts, key) == Some(expected))
    }
}

/// Lenient boolean for stored flags.
///
/// `true`, `1` and the strings `true`/`1`/`yes`/`on` (any case) are true;
/// everything else, including `null` and `""`, is false.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(flag_value(&value))
}

fn flag_value(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64() == Some(1) || n.as_u64() == Some(1),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        _ => false,
    }
}

fn default_true() -> bool {
    true
}

/// A workflow definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    id: WorkflowId,

    name: String,

    /// Language whose content this workflow processes
    language: String,

    #[serde(default = "default_true")]
    enabled: bool,

    #[serde(default)]
    triggers: WorkflowTriggers,

    /// Ordered list of steps
    #[serde(default)]
    steps: Vec<StepConfig>,

    /// Configuration version (increments on step changes)
    #[serde(default = "default_version")]
    version: u32,

    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    updated_at: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

impl Workflow {
    pub fn new(id: WorkflowId, name: impl Into<String>, language: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            language: language.into(),
            enabled: true,
            triggers: WorkflowTriggers::default(),
            steps: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    // Builder methods

    pub fn with_steps(mut self, steps: Vec<StepConfig>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_step(mut self, step: StepConfig) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_triggers(mut self, triggers: WorkflowTriggers) -> Self {
        self.triggers = triggers;
        self
    }

    // Getters

    pub fn id(&self) -> &WorkflowId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn triggers(&self) -> &WorkflowTriggers {
        &self.triggers
    }

    pub fn steps(&self) -> &[StepConfig] {
        &self.steps
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn get_step(&self, id: &str) -> Option<&StepConfig> {
        self.steps.iter().find(|s| s.id() == id)
    }

    pub fn get_step_index(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id() == id)
    }

    /// Check step ids are valid and unique
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let mut seen = HashSet::new();

        for step in &self.steps {
            validate_identifier("Step", step.id())?;
            if !seen.insert(step.id()) {
                return Err(WorkflowError::validation(format!(
                    "Duplicate step ID '{}' in workflow '{}'",
                    step.id(),
                    self.id
                )));
            }
        }

        Ok(())
    }

    // Setters (mutate and update timestamp)

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn set_steps(&mut self, steps: Vec<StepConfig>) {
        self.steps = steps;
        self.version += 1;
        self.touch();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
