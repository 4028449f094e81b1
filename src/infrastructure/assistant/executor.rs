//! Assistant executor: resolve, render, call, parse

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::domain::{
    extract_variables, get_nested_value, parse_with_schema, AssistantConfig, AssistantExecutor,
    AssistantRepository, AssistantSource, DomainError, ExecutionContext, ExecutorResult,
    ExpectedFormat, LegacyContextAdapter, Message, ProviderResolver, Schema, TemplateRenderer,
};

/// Default [`AssistantExecutor`] backed by a repository, a provider resolver
/// and a template renderer
#[derive(Debug)]
pub struct DefaultAssistantExecutor {
    repository: Arc<dyn AssistantRepository>,
    providers: Arc<dyn ProviderResolver>,
    renderer: Arc<dyn TemplateRenderer>,
}

impl DefaultAssistantExecutor {
    pub fn new(
        repository: Arc<dyn AssistantRepository>,
        providers: Arc<dyn ProviderResolver>,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> Self {
        Self {
            repository,
            providers,
            renderer,
        }
    }

    /// Load the configuration together with any step-level parameter overrides
    async fn resolve_config(
        &self,
        source: AssistantSource,
    ) -> Result<(AssistantConfig, Option<Map<String, Value>>), DomainError> {
        match source {
            AssistantSource::Inline(config) => Ok((*config, None)),
            AssistantSource::Managed { id, overrides } => {
                let config = self
                    .repository
                    .get_assistant(&id)
                    .await?
                    .ok_or_else(|| DomainError::not_found(format!("Assistant '{}' not found", id)))?;
                Ok((config, overrides))
            }
        }
    }

    /// Fill `result` as far as the run gets; the caller turns an error into
    /// a failed result that keeps whatever was filled in
    async fn run(
        &self,
        source: AssistantSource,
        context: &ExecutionContext,
        result: &mut ExecutorResult,
    ) -> Result<(), DomainError> {
        let (config, overrides) = self.resolve_config(source).await?;
        config.validate()?;

        let parameters = config.api_parameters.merged(overrides.as_ref());
        result.model = parameters
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or(&config.api_parameters.model)
            .to_string();
        result.output_variables = config.output_variables.clone();

        let view = LegacyContextAdapter::template_view(context);
        let mut variables = extract_variables(&config.system_prompt);
        for variable in extract_variables(&config.user_message_template) {
            if !variables.contains(&variable) {
                variables.push(variable);
            }
        }
        for variable in variables.iter().filter(|v| get_nested_value(&view, v).is_none()) {
            result.warnings.push(format!("Template variable '{}' is not set", variable));
        }
        result.interpolated_system_prompt = self.renderer.render(&config.system_prompt, &view);
        result.interpolated_user_message =
            self.renderer.render(&config.user_message_template, &view);

        let provider = self.providers.resolve(&config.provider).await?;
        result.provider = provider.provider_name().to_string();

        let messages = [
            Message::system(result.interpolated_system_prompt.clone()),
            Message::user(result.interpolated_user_message.clone()),
        ];

        debug!(
            assistant = %config.label(),
            provider = %result.provider,
            model = %result.model,
            "Calling chat provider"
        );

        let raw = provider.chat_completion(&messages, &parameters).await?;
        result.usage = provider.extract_usage(&raw);

        let text = provider.extract_content(&raw).ok_or_else(|| {
            DomainError::provider(provider.provider_name(), "Response contained no text content")
        })?;

        match config.expected_format {
            ExpectedFormat::Text => {
                result.output = Some(json!({ "output": text }));
            }
            ExpectedFormat::Json => {
                let empty = Schema::new();
                let parsed = parse_with_schema(&text, config.schema().unwrap_or(&empty));
                result.warnings.extend(parsed.warnings);
                result.extraction_method = parsed.method;

                if !parsed.success {
                    return Err(DomainError::extraction(
                        parsed
                            .error
                            .unwrap_or_else(|| "Failed to extract JSON from response".to_string()),
                    ));
                }

                result.mappings = parsed.mappings;
                result.output = Some(Value::Object(parsed.data));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl AssistantExecutor for DefaultAssistantExecutor {
    async fn execute(&self, source: AssistantSource, context: &ExecutionContext) -> ExecutorResult {
        let start = Instant::now();
        let label = match &source {
            AssistantSource::Managed { id, .. } => id.clone(),
            AssistantSource::Inline(config) => config.label().to_string(),
        };

        let mut result = ExecutorResult::default();
        let outcome = self.run(source, context, &mut result).await;
        result.execution_time_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(()) => {
                result.success = true;
                info!(
                    assistant = %label,
                    provider = %result.provider,
                    model = %result.model,
                    warnings = result.warnings.len(),
                    duration_ms = result.execution_time_ms,
                    "Assistant executed"
                );
            }
            Err(e) => {
                warn!(
                    assistant = %label,
                    error = %e,
                    retry_after = ?e.retry_after(),
                    "Assistant execution failed"
                );
                result.success = false;
                result.error = Some(e.to_string());
                result.error_code = e.error_code().map(str::to_string);
                result.retry_after = e.retry_after();
            }
        }

        result
    }
}
