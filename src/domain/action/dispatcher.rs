//! Turns field mappings into actions and hands them to the entity mutator

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::entity::{Action, ActionTarget};
use crate::domain::response::{get_nested_value, FieldMapping};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Applies actions to a live entity
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EntityMutator: Send + Sync + std::fmt::Debug {
    /// Apply one action to the entity; at most once per call
    async fn apply(&self, post_id: u64, action: &Action) -> Result<(), DomainError>;
}

/// Result of applying one action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub action: Action,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build the action list for `mappings` against `data`.
///
/// Pure and deterministic: output order follows mapping order. Mappings
/// whose value is null are skipped unless required; mappings with an
/// unusable target are skipped with a warning.
pub fn generate_actions(mappings: &[FieldMapping], data: &Value) -> Vec<Action> {
    let mut actions = Vec::with_capacity(mappings.len());

    for mapping in mappings {
        let value = get_nested_value(data, &mapping.field_path)
            .cloned()
            .unwrap_or(Value::Null);

        if value.is_null() && !mapping.required {
            debug!(field = %mapping.field_path, "Skipping mapping with null value");
            continue;
        }

        let target = match ActionTarget::parse(&mapping.target) {
            Ok(target) => target,
            Err(e) => {
                warn!(field = %mapping.field_path, target = %mapping.target, error = %e, "Skipping mapping");
                continue;
            }
        };

        let source_field_path = mapping.field_path.clone();

        let action = match target {
            ActionTarget::PostField(field) => Action::UpdatePostField {
                field,
                value,
                source_field_path,
            },
            ActionTarget::Meta(meta_key) => Action::UpdatePostMeta {
                meta_key,
                value,
                source_field_path,
            },
            ActionTarget::Taxonomy {
                taxonomy,
                term: None,
            } => Action::AssignTaxonomy {
                taxonomy,
                value,
                source_field_path,
            },
            ActionTarget::Taxonomy {
                taxonomy,
                term: Some(term),
            } => {
                // The value acts as a switch for a fixed term
                let value = if is_truthy(&value) {
                    Value::String(term)
                } else if mapping.required {
                    Value::Null
                } else {
                    debug!(field = %mapping.field_path, term = %term, "Term switch is off");
                    continue;
                };

                Action::AssignTaxonomy {
                    taxonomy,
                    value,
                    source_field_path,
                }
            }
        };

        actions.push(action);
    }

    actions
}

/// Apply actions one by one; a failure never rolls back the others
pub async fn apply_actions(
    mutator: &dyn EntityMutator,
    post_id: u64,
    actions: &[Action],
) -> Vec<ActionOutcome> {
    let mut outcomes = Vec::with_capacity(actions.len());

    for action in actions {
        let outcome = match mutator.apply(post_id, action).await {
            Ok(()) => {
                debug!(post_id, action = action.type_name(), target = action.target_name(), "Action applied");
                ActionOutcome {
                    action: action.clone(),
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                warn!(
                    post_id,
                    action = action.type_name(),
                    target = action.target_name(),
                    error = %e,
                    "Action failed"
                );
                ActionOutcome {
                    action: action.clone(),
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        };

        outcomes.push(outcome);
    }

    outcomes
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => {
            let s = s.trim();
            !s.is_empty() && s != "0" && !s.eq_ignore_ascii_case("false") && !s.eq_ignore_ascii_case("no")
        }
        Value::Array(items) => !items.is_empty(),
        Value::Object(object) => !object.is_empty(),
    }
}
