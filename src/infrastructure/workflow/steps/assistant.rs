//! Assistant-backed steps

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::{configured_paths, dispatch_actions, ACTIONS_KEY, WARNINGS_KEY};
use crate::domain::{
    generate_actions, get_nested_value, AssistantConfig, AssistantExecutor, AssistantSource,
    ExecutionContext, Step, StepConfig, StepKind, WorkflowError,
};

/// Runs an assistant whose configuration is inlined in the step settings
#[derive(Debug)]
pub struct AiAssistantStep {
    executor: Arc<dyn AssistantExecutor>,
}

impl AiAssistantStep {
    pub fn new(executor: Arc<dyn AssistantExecutor>) -> Self {
        Self { executor }
    }

    fn assistant_config(config: &StepConfig) -> Result<AssistantConfig, String> {
        let assistant = AssistantConfig::from_value(&Value::Object(config.config().clone()))
            .map_err(|e| e.to_string())?;
        assistant.validate().map_err(|e| e.to_string())?;
        Ok(assistant)
    }
}

#[async_trait]
impl Step for AiAssistantStep {
    fn kind(&self) -> StepKind {
        StepKind::AiAssistant
    }

    fn is_external_compatible(&self) -> bool {
        true
    }

    fn required_paths(&self, config: &StepConfig) -> Vec<String> {
        configured_paths(config)
    }

    fn validate_config(&self, config: &StepConfig) -> Vec<String> {
        match Self::assistant_config(config) {
            Ok(_) => Vec::new(),
            Err(e) => vec![e],
        }
    }

    async fn execute(
        &self,
        context: &mut ExecutionContext,
        config: &StepConfig,
    ) -> Result<Value, WorkflowError> {
        let assistant = Self::assistant_config(config)
            .map_err(|e| WorkflowError::invalid_step_config(config.id(), vec![e]))?;

        run_assistant(
            self.executor.as_ref(),
            AssistantSource::inline(assistant),
            context,
            config,
        )
        .await
    }
}

/// Runs a stored assistant referenced by `assistant_id`.
///
/// An optional `api_parameters` object overrides the stored parameters for
/// this step only; a `null` value drops the stored key.
#[derive(Debug)]
pub struct ManagedAssistantStep {
    executor: Arc<dyn AssistantExecutor>,
}

impl ManagedAssistantStep {
    pub fn new(executor: Arc<dyn AssistantExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Step for ManagedAssistantStep {
    fn kind(&self) -> StepKind {
        StepKind::ManagedAssistant
    }

    fn is_external_compatible(&self) -> bool {
        true
    }

    fn required_paths(&self, config: &StepConfig) -> Vec<String> {
        configured_paths(config)
    }

    fn validate_config(&self, config: &StepConfig) -> Vec<String> {
        let mut errors = Vec::new();

        match config.str_setting("assistant_id") {
            Some(id) if !id.trim().is_empty() => {}
            _ => errors.push("assistant_id is required".to_string()),
        }

        if let Some(bindings) = config.setting("output_variables") {
            if !bindings.is_object() {
                errors.push("output_variables must be an object".to_string());
            }
        }

        if let Some(overrides) = config.setting("api_parameters") {
            if !overrides.is_object() {
                errors.push("api_parameters must be an object".to_string());
            }
        }

        errors
    }

    async fn execute(
        &self,
        context: &mut ExecutionContext,
        config: &StepConfig,
    ) -> Result<Value, WorkflowError> {
        let assistant_id = config
            .str_setting("assistant_id")
            .ok_or_else(|| {
                WorkflowError::invalid_step_config(config.id(), vec!["assistant_id is required".to_string()])
            })?
            .to_string();

        let mut source = AssistantSource::managed(assistant_id);
        match config.setting("api_parameters") {
            Some(Value::Object(overrides)) => source = source.with_overrides(overrides.clone()),
            Some(_) => {
                return Err(WorkflowError::invalid_step_config(
                    config.id(),
                    vec!["api_parameters must be an object".to_string()],
                ))
            }
            None => {}
        }

        run_assistant(
            self.executor.as_ref(),
            source,
            context,
            config,
        )
        .await
    }
}

/// Call the assistant, bind its output into the context and dispatch the
/// actions derived from its mappings
async fn run_assistant(
    executor: &dyn AssistantExecutor,
    source: AssistantSource,
    context: &mut ExecutionContext,
    config: &StepConfig,
) -> Result<Value, WorkflowError> {
    let result = executor.execute(source, context).await;

    if !result.success {
        let mut message = result
            .error
            .unwrap_or_else(|| "assistant returned no result".to_string());
        if let Some(seconds) = result.retry_after {
            message.push_str(&format!(" (retry after {}s)", seconds));
        }
        return Err(WorkflowError::step_execution(config.id(), message));
    }

    let output = result.output.clone().unwrap_or(Value::Null);

    let mut bindings = result.output_variables.clone();
    bindings.extend(step_bindings(config));
    bind_output_variables(context, config.id(), &output, &bindings);

    let mut step_output: Map<String, Value> = result.output_map();

    if !result.warnings.is_empty() {
        step_output.insert(WARNINGS_KEY.to_string(), json!(result.warnings));
    }

    let actions = generate_actions(&result.mappings, &output);
    if !actions.is_empty() {
        let report = dispatch_actions(context, config.id(), &actions).await;
        step_output.insert(ACTIONS_KEY.to_string(), report);
    }

    Ok(Value::Object(step_output))
}

/// Step-level `output_variables`, layered over the assistant's own
fn step_bindings(config: &StepConfig) -> BTreeMap<String, String> {
    config
        .setting("output_variables")
        .and_then(|v| v.as_object())
        .map(|bindings| {
            bindings
                .iter()
                .filter_map(|(from, to)| Some((from.clone(), to.as_str()?.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// Copy output values into the context; a failed write is logged and skipped
fn bind_output_variables(
    context: &mut ExecutionContext,
    step_id: &str,
    output: &Value,
    bindings: &BTreeMap<String, String>,
) {
    for (output_path, context_path) in bindings {
        let Some(value) = get_nested_value(output, output_path).filter(|v| !v.is_null()) else {
            debug!(step_id = %step_id, output_path = %output_path, "Output variable has no value");
            continue;
        };

        if let Err(e) = context.set(context_path, value.clone()) {
            warn!(
                step_id = %step_id,
                context_path = %context_path,
                error = %e,
                "Could not bind output variable"
            );
        }
    }
}
