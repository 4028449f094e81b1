//! Assistant configuration entity

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::llm::ChatParameters;
use crate::domain::response::Schema;
use crate::domain::DomainError;

/// Shape the assistant is expected to answer in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedFormat {
    #[default]
    Text,
    Json,
}

/// Model parameters sent with every request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiParameters {
    #[serde(default)]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,

    /// Vendor-specific parameters passed through as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiParameters {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Flatten into provider parameters, applying `overrides` on top
    pub fn merged(&self, overrides: Option<&Map<String, Value>>) -> ChatParameters {
        let mut params = ChatParameters::new();
        params.insert("model".to_string(), Value::String(self.model.clone()));

        if let Some(temperature) = self.temperature {
            params.insert("temperature".to_string(), Value::from(temperature));
        }
        if let Some(max_tokens) = self.max_tokens {
            params.insert("max_tokens".to_string(), Value::from(max_tokens));
        }
        if let Some(top_p) = self.top_p {
            params.insert("top_p".to_string(), Value::from(top_p));
        }

        for (key, value) in &self.extra {
            params.insert(key.clone(), value.clone());
        }

        if let Some(overrides) = overrides {
            for (key, value) in overrides {
                if value.is_null() {
                    params.remove(key);
                } else {
                    params.insert(key.clone(), value.clone());
                }
            }
        }

        params
    }
}

/// Reusable prompt + provider + expected response shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub system_prompt: String,

    #[serde(default)]
    pub user_message_template: String,

    #[serde(default)]
    pub api_parameters: ApiParameters,

    #[serde(default)]
    pub expected_format: ExpectedFormat,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output_schema: Option<Schema>,

    /// Parsed output path -> context path to copy it to
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub output_variables: BTreeMap<String, String>,

    /// Provider name; empty selects the default provider
    #[serde(default)]
    pub provider: String,
}

impl AssistantConfig {
    pub fn new(
        system_prompt: impl Into<String>,
        user_message_template: impl Into<String>,
        api_parameters: ApiParameters,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_message_template: user_message_template.into(),
            api_parameters,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Expect a JSON answer with the given schema
    pub fn with_json_schema(mut self, schema: Schema) -> Self {
        self.expected_format = ExpectedFormat::Json;
        self.expected_output_schema = Some(schema);
        self
    }

    pub fn with_expected_format(mut self, format: ExpectedFormat) -> Self {
        self.expected_format = format;
        self
    }

    pub fn with_output_variable(
        mut self,
        output_path: impl Into<String>,
        context_path: impl Into<String>,
    ) -> Self {
        self.output_variables
            .insert(output_path.into(), context_path.into());
        self
    }

    /// Build from a step's inline settings
    pub fn from_value(value: &Value) -> Result<Self, DomainError> {
        serde_json::from_value(value.clone()).map_err(|e| {
            DomainError::configuration(format!("Invalid assistant configuration: {}", e))
        })
    }

    /// Schema in effect; only meaningful for JSON answers
    pub fn schema(&self) -> Option<&Schema> {
        match self.expected_format {
            ExpectedFormat::Json => self.expected_output_schema.as_ref(),
            ExpectedFormat::Text => None,
        }
    }

    pub fn label(&self) -> &str {
        self.id
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("inline")
    }

    /// Check the mandatory fields
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.system_prompt.trim().is_empty() {
            return Err(DomainError::configuration(format!(
                "Assistant '{}' has no system_prompt",
                self.label()
            )));
        }

        if self.api_parameters.model.trim().is_empty() {
            return Err(DomainError::configuration(format!(
                "Assistant '{}' has no api_parameters.model",
                self.label()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::response::FieldType;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_config() {
        let config = AssistantConfig::from_value(&json!({
            "id": "seo",
            "system_prompt": "You are an SEO expert",
            "user_message_template": "Title: {{ post.title }}",
            "api_parameters": {"model": "gpt-4o", "temperature": 0.2, "seed": 7},
            "expected_format": "json",
            "expected_output_schema": {"score": "number"},
            "output_variables": {"score": "seo.score"},
            "provider": "openai"
        }))
        .unwrap();

        assert_eq!(config.api_parameters.model, "gpt-4o");
        assert_eq!(config.api_parameters.extra.get("seed"), Some(&json!(7)));
        assert_eq!(
            config.schema().unwrap().field("score").unwrap().field_type,
            FieldType::Number
        );
        assert_eq!(config.output_variables.get("score").map(String::as_str), Some("seo.score"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_schema_ignored_for_text() {
        let mut config = AssistantConfig::new("sys", "", ApiParameters::new("m"))
            .with_json_schema(Schema::new().with_field("a", FieldType::String));
        assert!(config.schema().is_some());

        config.expected_format = ExpectedFormat::Text;
        assert!(config.schema().is_none());
    }

    #[test]
    fn test_validate_mandatory_fields() {
        let missing_prompt = AssistantConfig::new("  ", "", ApiParameters::new("gpt-4o"));
        assert!(matches!(
            missing_prompt.validate(),
            Err(DomainError::Configuration { .. })
        ));

        let missing_model = AssistantConfig::new("sys", "", ApiParameters::default()).with_id("x");
        let err = missing_model.validate().unwrap_err();
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn test_merged_parameters() {
        let params = ApiParameters::new("gpt-4o")
            .with_temperature(0.5)
            .with_max_tokens(100)
            .with_extra("seed", json!(1));

        let mut overrides = Map::new();
        overrides.insert("temperature".to_string(), json!(0.0));
        overrides.insert("max_tokens".to_string(), Value::Null);

        let merged = params.merged(Some(&overrides));
        assert_eq!(merged.get("model"), Some(&json!("gpt-4o")));
        assert_eq!(merged.get("temperature"), Some(&json!(0.0)));
        assert_eq!(merged.get("seed"), Some(&json!(1)));
        assert!(merged.get("max_tokens").is_none());
    }

    #[test]
    fn test_invalid_config_shape() {
        assert!(AssistantConfig::from_value(&json!({"system_prompt": 5})).is_err());
    }
}
