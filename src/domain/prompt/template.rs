//! Prompt template rendering
//!
//! Supports two variable syntaxes in the same template:
//! - `{{ post.title }}` - native syntax, dot paths into the context tree
//! - `{title}` - legacy syntax, same lookup rules
//!
//! Rendering never fails: unresolved references render as an empty string.
//! Substitution is a single pass, so rendered values are never re-scanned.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::domain::response::get_nested_value;

/// Regex matching either `{{ path }}` or the legacy `{path}`
static VARIABLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z0-9_][a-zA-Z0-9_.-]*)\s*\}\}|\{([a-zA-Z_][a-zA-Z0-9_.-]*)\}")
        .unwrap()
});

/// Renders prompt templates against a JSON context
pub trait TemplateRenderer: Send + Sync + std::fmt::Debug {
    /// Render a template; must never fail
    fn render(&self, template: &str, context: &Value) -> String;
}

/// Regex-based renderer supporting native and legacy syntax
#[derive(Debug, Clone, Default)]
pub struct DefaultTemplateRenderer;

impl DefaultTemplateRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateRenderer for DefaultTemplateRenderer {
    fn render(&self, template: &str, context: &Value) -> String {
        VARIABLE_PATTERN
            .replace_all(template, |caps: &Captures<'_>| {
                let path = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map(|m| m.as_str())
                    .unwrap_or_default();

                get_nested_value(context, path)
                    .map(value_to_string)
                    .unwrap_or_default()
            })
            .into_owned()
    }
}

/// Extract referenced variable paths from a template, in order of first use
pub fn extract_variables(template: &str) -> Vec<String> {
    let mut variables: Vec<String> = Vec::new();

    for caps in VARIABLE_PATTERN.captures_iter(template) {
        if let Some(path) = caps.get(1).or_else(|| caps.get(2)) {
            let path = path.as_str().to_string();
            if !variables.contains(&path) {
                variables.push(path);
            }
        }
    }

    variables
}

/// Convert a JSON value to its prompt representation
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),

        // For arrays and objects, use JSON representation
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
