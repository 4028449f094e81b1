//! Taxonomy resolution step
//!
//! Maps free-text labels found in the context (usually written there by an
//! earlier assistant step) onto existing terms. Labels without a matching
//! term are reported, never created.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{configured_paths, dispatch_actions, term_lookup, ACTIONS_KEY, TERM_LOOKUP_SERVICE};
use crate::domain::{
    Action, ExecutionContext, Step, StepConfig, StepKind, Term, WorkflowError,
};

#[derive(Debug, Default)]
pub struct TaxonomyResolutionStep;

impl TaxonomyResolutionStep {
    pub fn new() -> Self {
        Self
    }
}

/// Labels from a string (comma separated) or an array of strings
fn labels(value: &Value) -> Vec<String> {
    let raw: Vec<&str> = match value {
        Value::String(s) => s.split(',').collect(),
        Value::Array(items) => items.iter().filter_map(|v| v.as_str()).collect(),
        _ => Vec::new(),
    };

    let mut labels: Vec<String> = Vec::new();
    for label in raw.into_iter().map(str::trim).filter(|l| !l.is_empty()) {
        if !labels.iter().any(|l| l.eq_ignore_ascii_case(label)) {
            labels.push(label.to_string());
        }
    }
    labels
}

#[async_trait]
impl Step for TaxonomyResolutionStep {
    fn kind(&self) -> StepKind {
        StepKind::TaxonomyResolution
    }

    fn is_external_compatible(&self) -> bool {
        true
    }

    fn required_services(&self) -> Vec<String> {
        vec![TERM_LOOKUP_SERVICE.to_string()]
    }

    fn required_paths(&self, config: &StepConfig) -> Vec<String> {
        let mut paths: Vec<String> = config
            .str_setting("source_path")
            .map(|p| vec![p.to_string()])
            .unwrap_or_default();
        paths.extend(configured_paths(config));
        paths
    }

    fn validate_config(&self, config: &StepConfig) -> Vec<String> {
        let mut errors = Vec::new();

        for key in ["taxonomy", "source_path"] {
            match config.str_setting(key) {
                Some(v) if !v.trim().is_empty() => {}
                _ => errors.push(format!("{} is required", key)),
            }
        }

        if let Some(assign) = config.setting("assign") {
            if !assign.is_boolean() {
                errors.push("assign must be a boolean".to_string());
            }
        }

        errors
    }

    async fn execute(
        &self,
        context: &mut ExecutionContext,
        config: &StepConfig,
    ) -> Result<Value, WorkflowError> {
        let (Some(taxonomy), Some(source_path)) =
            (config.str_setting("taxonomy"), config.str_setting("source_path"))
        else {
            return Err(WorkflowError::invalid_step_config(
                config.id(),
                self.validate_config(config),
            ));
        };

        let lookup = term_lookup(context).ok_or_else(|| {
            WorkflowError::service_unavailable(format!("{} is not registered", TERM_LOOKUP_SERVICE))
        })?;

        let wanted = context.get(source_path).map(labels).unwrap_or_default();

        let mut resolved: Vec<Term> = Vec::new();
        let mut unresolved: Vec<String> = Vec::new();

        for label in wanted {
            match lookup.find_term(taxonomy, &label).await? {
                Some(term) => {
                    if !resolved.iter().any(|t| t.id == term.id) {
                        resolved.push(term);
                    }
                }
                None => {
                    debug!(taxonomy = %taxonomy, label = %label, "No matching term");
                    unresolved.push(label);
                }
            }
        }

        info!(
            step_id = %config.id(),
            taxonomy = %taxonomy,
            resolved = resolved.len(),
            unresolved = unresolved.len(),
            "Resolved taxonomy labels"
        );

        let names: Vec<&str> = resolved.iter().map(|t| t.name.as_str()).collect();

        if let Some(output_path) = config.str_setting("output_path") {
            if let Err(e) = context.set(output_path, json!(names)) {
                warn!(step_id = %config.id(), path = %output_path, error = %e, "Could not store resolved terms");
            }
        }

        let mut output = json!({
            "taxonomy": taxonomy,
            "resolved": resolved,
            "unresolved": unresolved,
        });

        let assign = config
            .setting("assign")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if assign && !names.is_empty() {
            let action = Action::AssignTaxonomy {
                taxonomy: taxonomy.to_string(),
                value: json!(names),
                source_field_path: source_path.to_string(),
            };
            output[ACTIONS_KEY] = dispatch_actions(context, config.id(), &[action]).await;
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::action::MockEntityMutator;
    use crate::domain::taxonomy::MockTermLookup;
    use crate::domain::workflow::ServiceRegistry;
    use crate::domain::DomainError;
    use crate::infrastructure::workflow::steps::{provide_entity_mutator, provide_term_lookup};
    use std::sync::Arc;

    fn lookup() -> MockTermLookup {
        let mut lookup = MockTermLookup::new();
        lookup.expect_find_term().returning(|taxonomy, label| {
            Ok(match label.to_lowercase().as_str() {
                "rust" => Some(Term::new(10, taxonomy, "Rust")),
                "tokio" => Some(Term::new(11, taxonomy, "Tokio")),
                _ => None,
            })
        });
        lookup
    }

    fn config() -> StepConfig {
        StepConfig::new("tags", StepKind::TaxonomyResolution)
            .with_setting("taxonomy", json!("post_tag"))
            .with_setting("source_path", json!("suggested.tags"))
            .with_setting("output_path", json!("resolved.tags"))
    }

    fn context(services: ServiceRegistry) -> ExecutionContext {
        ExecutionContext::for_entity(9, json!({"suggested": {"tags": ["Rust", "rust", " Tokio ", "Cobol"]}}))
            .with_services(services)
    }

    #[test]
    fn test_labels_from_string_and_array() {
        assert_eq!(labels(&json!("a, b,,a")), vec!["a", "b"]);
        assert_eq!(labels(&json!(["x", 1, "y"])), vec!["x", "y"]);
        assert!(labels(&json!(42)).is_empty());
    }

    #[tokio::test]
    async fn test_resolves_known_terms_only() {
        let mut services = ServiceRegistry::new();
        provide_term_lookup(&mut services, Arc::new(lookup()));
        let mut context = context(services);

        let output = TaxonomyResolutionStep::new()
            .execute(&mut context, &config())
            .await
            .unwrap();

        assert_eq!(output["resolved"].as_array().unwrap().len(), 2);
        assert_eq!(output["unresolved"], json!(["Cobol"]));
        assert_eq!(context.get("resolved.tags"), Some(&json!(["Rust", "Tokio"])));
        assert!(output.get(ACTIONS_KEY).is_none());
    }

    #[tokio::test]
    async fn test_assign_dispatches_one_action() {
        let mut mutator = MockEntityMutator::new();
        mutator
            .expect_apply()
            .withf(|post_id, action| {
                *post_id == 9
                    && matches!(action, Action::AssignTaxonomy { taxonomy, value, .. }
                        if taxonomy == "post_tag" && value == &json!(["Rust", "Tokio"]))
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut services = ServiceRegistry::new();
        provide_term_lookup(&mut services, Arc::new(lookup()));
        provide_entity_mutator(&mut services, Arc::new(mutator));
        let mut context = context(services);

        let output = TaxonomyResolutionStep::new()
            .execute(&mut context, &config().with_setting("assign", json!(true)))
            .await
            .unwrap();

        assert_eq!(output[ACTIONS_KEY]["applied"], json!(true));
    }

    #[tokio::test]
    async fn test_output_path_through_scalar_is_not_fatal() {
        let mut services = ServiceRegistry::new();
        provide_term_lookup(&mut services, Arc::new(lookup()));
        let mut context = ExecutionContext::for_entity(9, json!({"tags": "Rust"}))
            .with_services(services);

        let config = StepConfig::new("tags", StepKind::TaxonomyResolution)
            .with_setting("taxonomy", json!("post_tag"))
            .with_setting("source_path", json!("tags"))
            .with_setting("output_path", json!("tags.resolved"));

        let output = TaxonomyResolutionStep::new()
            .execute(&mut context, &config)
            .await
            .unwrap();

        assert_eq!(output["resolved"].as_array().unwrap().len(), 1);
        assert_eq!(context.get("tags"), Some(&json!("Rust")));
    }

    #[tokio::test]
    async fn test_lookup_error_fails_step() {
        let mut failing = MockTermLookup::new();
        failing
            .expect_find_term()
            .returning(|_, _| Err(DomainError::internal("database offline")));

        let mut services = ServiceRegistry::new();
        provide_term_lookup(&mut services, Arc::new(failing));
        let mut context = context(services);

        let err = TaxonomyResolutionStep::new()
            .execute(&mut context, &config())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("database offline"));
    }

    #[test]
    fn test_requirements() {
        let step = TaxonomyResolutionStep::new();
        assert_eq!(step.required_services(), vec![TERM_LOOKUP_SERVICE]);
        assert_eq!(step.required_paths(&config()), vec!["suggested.tags"]);
        assert!(step.validate_config(&config()).is_empty());

        let empty = StepConfig::new("t", StepKind::TaxonomyResolution);
        assert_eq!(
            step.validate_config(&empty),
            vec!["taxonomy is required", "source_path is required"]
        );
    }
}
