//! Action records produced from field mappings

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::DomainError;

/// A side effect to apply to the target entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Update a core post field (title, content, excerpt, ...)
    UpdatePostField {
        field: String,
        value: Value,
        source_field_path: String,
    },

    /// Update a post meta entry
    UpdatePostMeta {
        meta_key: String,
        value: Value,
        source_field_path: String,
    },

    /// Assign one or more terms of a taxonomy
    AssignTaxonomy {
        taxonomy: String,
        value: Value,
        source_field_path: String,
    },
}

impl Action {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::UpdatePostField { .. } => "update_post_field",
            Self::UpdatePostMeta { .. } => "update_post_meta",
            Self::AssignTaxonomy { .. } => "assign_taxonomy",
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            Self::UpdatePostField { value, .. }
            | Self::UpdatePostMeta { value, .. }
            | Self::AssignTaxonomy { value, .. } => value,
        }
    }

    pub fn source_field_path(&self) -> &str {
        match self {
            Self::UpdatePostField {
                source_field_path, ..
            }
            | Self::UpdatePostMeta {
                source_field_path, ..
            }
            | Self::AssignTaxonomy {
                source_field_path, ..
            } => source_field_path,
        }
    }

    /// Field, meta key or taxonomy this action writes to
    pub fn target_name(&self) -> &str {
        match self {
            Self::UpdatePostField { field, .. } => field,
            Self::UpdatePostMeta { meta_key, .. } => meta_key,
            Self::AssignTaxonomy { taxonomy, .. } => taxonomy,
        }
    }
}

/// Parsed form of a mapping target string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionTarget {
    /// `post.<field>`
    PostField(String),
    /// `meta.<key>`
    Meta(String),
    /// `taxonomy.<taxonomy>` or `taxonomy.<taxonomy>.<term>`
    Taxonomy {
        taxonomy: String,
        term: Option<String>,
    },
}

impl ActionTarget {
    pub fn parse(target: &str) -> Result<Self, DomainError> {
        let target = target.trim();
        let (scope, rest) = target.split_once('.').ok_or_else(|| invalid_target(target))?;

        if rest.is_empty() {
            return Err(invalid_target(target));
        }

        match scope {
            "post" => Ok(Self::PostField(rest.to_string())),
            "meta" => Ok(Self::Meta(rest.to_string())),
            "taxonomy" => {
                let (taxonomy, term) = match rest.split_once('.') {
                    Some((taxonomy, term)) if !term.is_empty() => {
                        (taxonomy, Some(term.to_string()))
                    }
                    Some((taxonomy, _)) => (taxonomy, None),
                    None => (rest, None),
                };

                if taxonomy.is_empty() {
                    return Err(invalid_target(target));
                }

                Ok(Self::Taxonomy {
                    taxonomy: taxonomy.to_string(),
                    term,
                })
            }
            _ => Err(invalid_target(target)),
        }
    }
}

impl fmt::Display for ActionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PostField(field) => write!(f, "post.{}", field),
            Self::Meta(key) => write!(f, "meta.{}", key),
            Self::Taxonomy {
                taxonomy,
                term: Some(term),
            } => write!(f, "taxonomy.{}.{}", taxonomy, term),
            Self::Taxonomy { taxonomy, term: None } => write!(f, "taxonomy.{}", taxonomy),
        }
    }
}

fn invalid_target(target: &str) -> DomainError {
    DomainError::validation(format!(
        "Invalid action target '{}': expected post.<field>, meta.<key> or taxonomy.<taxonomy>[.<term>]",
        target
    ))
}
