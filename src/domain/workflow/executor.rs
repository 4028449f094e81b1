//! Workflow executor trait and result types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::context::ExecutionContext;
use super::entity::Workflow;
use super::error::WorkflowError;

/// Outcome category of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Executed,
    Skipped,
    Failed,
}

/// Result of executing a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepExecutionResult {
    pub step_id: String,

    /// Step type name as configured
    pub step_type: String,

    pub status: StepStatus,

    /// Whether the step executed successfully
    pub success: bool,

    /// Step output if successful
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,

    /// Error message if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Why the step did not run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl StepExecutionResult {
    pub fn success(
        step_id: impl Into<String>,
        step_type: impl Into<String>,
        output: Value,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            step_id: step_id.into(),
            step_type: step_type.into(),
            status: StepStatus::Executed,
            success: true,
            output: Some(output),
            error: None,
            skip_reason: None,
            execution_time_ms,
        }
    }

    pub fn failure(
        step_id: impl Into<String>,
        step_type: impl Into<String>,
        error: impl Into<String>,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            step_id: step_id.into(),
            step_type: step_type.into(),
            status: StepStatus::Failed,
            success: false,
            output: None,
            error: Some(error.into()),
            skip_reason: None,
            execution_time_ms,
        }
    }

    pub fn skipped(
        step_id: impl Into<String>,
        step_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            step_id: step_id.into(),
            step_type: step_type.into(),
            status: StepStatus::Skipped,
            success: true,
            output: None,
            error: None,
            skip_reason: Some(reason.into()),
            execution_time_ms: 0,
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.status == StepStatus::Skipped
    }

    pub fn is_failed(&self) -> bool {
        self.status == StepStatus::Failed
    }
}

/// Result of one workflow run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub run_id: Uuid,

    pub workflow_id: String,

    pub started_at: DateTime<Utc>,

    /// False when a critical step failed
    pub success: bool,

    /// One entry per step that was considered, in order
    pub step_results: Vec<StepExecutionResult>,

    /// Total execution time in milliseconds
    pub execution_time_ms: u64,

    /// Error that halted the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Step at which the run halted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halted_at: Option<String>,

    /// Context export after the last step
    pub context: Value,
}

impl WorkflowResult {
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            workflow_id: workflow_id.into(),
            started_at: Utc::now(),
            success: true,
            step_results: Vec::new(),
            execution_time_ms: 0,
            error: None,
            halted_at: None,
            context: Value::Null,
        }
    }

    /// Mark the run as halted by `step_id`
    pub fn halt(&mut self, step_id: impl Into<String>, error: impl Into<String>) {
        self.success = false;
        self.halted_at = Some(step_id.into());
        self.error = Some(error.into());
    }

    pub fn executed(&self) -> impl Iterator<Item = &StepExecutionResult> {
        self.step_results
            .iter()
            .filter(|r| r.status == StepStatus::Executed)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &StepExecutionResult> {
        self.step_results.iter().filter(|r| r.is_skipped())
    }

    pub fn failed(&self) -> impl Iterator<Item = &StepExecutionResult> {
        self.step_results.iter().filter(|r| r.is_failed())
    }

    pub fn step(&self, step_id: &str) -> Option<&StepExecutionResult> {
        self.step_results.iter().find(|r| r.step_id == step_id)
    }

    /// Get the last successful step's output
    pub fn last_step_output(&self) -> Option<&Value> {
        self.executed().last().and_then(|r| r.output.as_ref())
    }
}

/// Per-run options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Generate actions but never apply them
    #[serde(default)]
    pub dry_run: bool,

    /// Resume from this step ID, skipping the ones before it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<String>,
}

impl RunOptions {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            start_at: None,
        }
    }

    pub fn with_start_at(mut self, step_id: impl Into<String>) -> Self {
        self.start_at = Some(step_id.into());
        self
    }
}

/// Runs workflows against an execution context
#[async_trait]
pub trait WorkflowExecutor: Send + Sync + std::fmt::Debug {
    /// Execute all steps of `workflow` in order
    async fn execute(
        &self,
        workflow: &Workflow,
        context: ExecutionContext,
        options: RunOptions,
    ) -> Result<WorkflowResult, WorkflowError>;

    /// Execute a single step for inspection, regardless of its position
    async fn execute_step(
        &self,
        workflow: &Workflow,
        step_id: &str,
        context: &mut ExecutionContext,
    ) -> Result<StepExecutionResult, WorkflowError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_result_constructors() {
        let ok = StepExecutionResult::success("analyze", "ai_assistant", json!({"score": 8}), 150);
        assert!(ok.success);
        assert_eq!(ok.status, StepStatus::Executed);
        assert_eq!(ok.output, Some(json!({"score": 8})));

        let failed = StepExecutionResult::failure("tag", "taxonomy_resolution", "boom", 5);
        assert!(!failed.success);
        assert!(failed.is_failed());
        assert_eq!(failed.error.as_deref(), Some("boom"));

        let skipped =
            StepExecutionResult::skipped("seo", "ai_assistant", "incompatible with virtual context");
        assert!(skipped.is_skipped());
        assert_eq!(skipped.execution_time_ms, 0);
        assert_eq!(
            skipped.skip_reason.as_deref(),
            Some("incompatible with virtual context")
        );
    }

    #[test]
    fn test_result_partitions() {
        let mut result = WorkflowResult::new("seo");
        result.step_results = vec![
            StepExecutionResult::success("a", "ai_assistant", json!({"first": true}), 10),
            StepExecutionResult::skipped("b", "ai_assistant", "step disabled"),
            StepExecutionResult::failure("c", "ai_assistant", "failed", 5),
            StepExecutionResult::success("d", "ai_assistant", json!({"last": true}), 10),
        ];

        assert_eq!(result.executed().count(), 2);
        assert_eq!(result.skipped().count(), 1);
        assert_eq!(result.failed().count(), 1);
        assert_eq!(result.last_step_output(), Some(&json!({"last": true})));
        assert!(result.step("b").is_some());
        assert!(result.success);
    }

    #[test]
    fn test_halt() {
        let mut result = WorkflowResult::new("seo");
        result.halt("critical", "provider down");

        assert!(!result.success);
        assert_eq!(result.halted_at.as_deref(), Some("critical"));
        assert_eq!(result.error.as_deref(), Some("provider down"));
    }

    #[test]
    fn test_serialization() {
        let mut result = WorkflowResult::new("seo");
        result.step_results.push(StepExecutionResult::skipped("a", "ai_assistant", "step disabled"));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["workflow_id"], json!("seo"));
        assert_eq!(json["step_results"][0]["status"], json!("skipped"));
        assert!(json.get("halted_at").is_none());

        let run_options: RunOptions = serde_json::from_value(json!({"dry_run": true})).unwrap();
        assert_eq!(run_options, RunOptions::dry_run());
    }
}
