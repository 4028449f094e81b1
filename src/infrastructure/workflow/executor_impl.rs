//! Pipeline runner: executes workflow steps in order against one context

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::workflow::eligibility;
use crate::domain::{
    ExecutionContext, RunOptions, Step, StepConfig, StepExecutionResult,
    StepRegistry, Workflow, WorkflowError, WorkflowExecutor, WorkflowResult,
};

/// Reason recorded for disabled steps
pub const STEP_DISABLED: &str = "step disabled";

/// Runs workflows strictly sequentially; each step is awaited before the next
#[derive(Debug, Clone)]
pub struct PipelineRunner {
    steps: Arc<StepRegistry>,
}

impl PipelineRunner {
    pub fn new(steps: StepRegistry) -> Self {
        Self {
            steps: Arc::new(steps),
        }
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.steps
    }

    fn resolve(&self, config: &StepConfig) -> Result<Arc<dyn Step>, WorkflowError> {
        let kind = config.kind();
        if !kind.is_known() {
            return Err(WorkflowError::unsupported_step(config.id(), kind.type_name()));
        }

        self.steps
            .get(kind)
            .ok_or_else(|| WorkflowError::unsupported_step(config.id(), kind.type_name()))
    }

    /// Evaluate one step: enabled, resolvable, valid, eligible, then execute
    async fn run_step(&self, config: &StepConfig, context: &mut ExecutionContext) -> StepExecutionResult {
        let step_type = config.kind().type_name();

        if !config.is_enabled() {
            debug!(step_id = %config.id(), "Step disabled");
            return StepExecutionResult::skipped(config.id(), step_type, STEP_DISABLED);
        }

        let step = match self.resolve(config) {
            Ok(step) => step,
            Err(e) => return StepExecutionResult::failure(config.id(), step_type, e.to_string(), 0),
        };

        let errors = step.validate_config(config);
        if !errors.is_empty() {
            let error = WorkflowError::invalid_step_config(config.id(), errors);
            return StepExecutionResult::failure(config.id(), step_type, error.to_string(), 0);
        }

        if let Some(reason) = eligibility(step.as_ref(), context, config) {
            debug!(step_id = %config.id(), reason = %reason, "Step skipped");
            return StepExecutionResult::skipped(config.id(), step_type, reason);
        }

        let start = Instant::now();
        let outcome = step.execute(context, config).await;
        let elapsed = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => {
                context.record_step_output(config.id(), output.clone());
                debug!(step_id = %config.id(), duration_ms = elapsed, "Step executed");
                StepExecutionResult::success(config.id(), step_type, output, elapsed)
            }
            Err(e) => {
                warn!(step_id = %config.id(), error = %e, critical = config.is_critical(), "Step failed");
                StepExecutionResult::failure(config.id(), step_type, e.to_string(), elapsed)
            }
        }
    }
}

#[async_trait]
impl WorkflowExecutor for PipelineRunner {
    async fn execute(
        &self,
        workflow: &Workflow,
        mut context: ExecutionContext,
        options: RunOptions,
    ) -> Result<WorkflowResult, WorkflowError> {
        if !workflow.is_enabled() {
            return Err(WorkflowError::disabled(workflow.id().as_str()));
        }

        if workflow.is_empty() {
            return Err(WorkflowError::empty_workflow(workflow.id().as_str()));
        }

        workflow.validate()?;

        let first = match &options.start_at {
            Some(step_id) => workflow
                .get_step_index(step_id)
                .ok_or_else(|| WorkflowError::step_not_found(step_id.clone()))?,
            None => 0,
        };

        if options.dry_run {
            context.set_dry_run(true);
        }

        let start = Instant::now();
        let mut result = WorkflowResult::new(workflow.id().as_str());

        info!(
            workflow_id = %workflow.id(),
            run_id = %result.run_id,
            steps = workflow.step_count(),
            dry_run = context.is_dry_run(),
            virtual_context = context.is_virtual(),
            "Starting workflow run"
        );

        for (index, config) in workflow.steps().iter().enumerate() {
            if index < first {
                result.step_results.push(StepExecutionResult::skipped(
                    config.id(),
                    config.kind().type_name(),
                    format!("before start step {}", workflow.steps()[first].id()),
                ));
                continue;
            }

            let step_result = self.run_step(config, &mut context).await;
            let halt = step_result.is_failed() && config.is_critical();
            let error = step_result.error.clone();
            result.step_results.push(step_result);

            if halt {
                warn!(workflow_id = %workflow.id(), step_id = %config.id(), "Critical step failed, halting run");
                result.halt(config.id(), error.unwrap_or_default());
                break;
            }
        }

        result.execution_time_ms = start.elapsed().as_millis() as u64;
        result.context = context.export();

        info!(
            workflow_id = %workflow.id(),
            run_id = %result.run_id,
            success = result.success,
            executed = result.executed().count(),
            skipped = result.skipped().count(),
            failed = result.failed().count(),
            duration_ms = result.execution_time_ms,
            "Workflow run finished"
        );

        Ok(result)
    }

    async fn execute_step(
        &self,
        workflow: &Workflow,
        step_id: &str,
        context: &mut ExecutionContext,
    ) -> Result<StepExecutionResult, WorkflowError> {
        let config = workflow
            .get_step(step_id)
            .ok_or_else(|| WorkflowError::step_not_found(step_id))?;

        debug!(workflow_id = %workflow.id(), step_id = %step_id, "Executing single step");
        Ok(self.run_step(config, context).await)
    }
}
