//! Prompt rendering domain - templates with native and legacy variable syntax

mod template;

pub use template::{extract_variables, value_to_string, DefaultTemplateRenderer, TemplateRenderer};
