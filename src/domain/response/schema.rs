//! Declared output schema for assistant replies

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::DomainError;

/// Primitive type a schema field expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    /// Unknown type token; the value passes through untouched
    Any,
}

impl FieldType {
    /// Parse a type token. Unknown tokens map to [`FieldType::Any`].
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "string" | "str" | "text" => Self::String,
            "number" | "int" | "integer" | "float" | "numeric" => Self::Number,
            "boolean" | "bool" => Self::Boolean,
            "array" | "list" => Self::Array,
            "object" | "map" | "dict" => Self::Object,
            _ => Self::Any,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Any => "any",
        }
    }

    /// Whether a JSON value already has this type
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Any => true,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One declared field
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    /// Field name; dots address nested values when generating mappings
    pub name: String,
    pub field_type: FieldType,
    /// Mutation target such as `post.title`, `meta.seo_title` or `taxonomy.category`
    pub target: Option<String>,
    /// Required fields produce a mapping even when their value is null
    pub required: bool,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            target: None,
            required: false,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    fn to_value(&self) -> Value {
        if self.target.is_none() && !self.required {
            return Value::String(self.field_type.as_str().to_string());
        }

        let mut spec = Map::new();
        spec.insert("type".to_string(), Value::String(self.field_type.as_str().to_string()));
        if let Some(ref target) = self.target {
            spec.insert("target".to_string(), Value::String(target.clone()));
        }
        if self.required {
            spec.insert("required".to_string(), Value::Bool(true));
        }
        Value::Object(spec)
    }
}

/// Ordered mapping of field name to expected type.
///
/// Accepts both the short form `{"score": "number"}` and the annotated form
/// `{"score": {"type": "number", "target": "meta.score", "required": true}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Schema {
    fields: Vec<SchemaField>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.with(SchemaField::new(name, field_type))
    }

    pub fn with(mut self, field: SchemaField) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Fields that carry a mutation target
    pub fn targeted_fields(&self) -> impl Iterator<Item = &SchemaField> {
        self.fields.iter().filter(|f| f.target.is_some())
    }

    /// Build a schema from its JSON representation
    pub fn from_value(value: &Value) -> Result<Self, DomainError> {
        let object = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(object) => object,
            other => {
                return Err(DomainError::validation(format!(
                    "Output schema must be an object, got {}",
                    json_kind(other)
                )));
            }
        };

        let mut schema = Self::default();

        for (name, spec) in object {
            let field = match spec {
                Value::String(token) => SchemaField::new(name, FieldType::from_token(token)),
                Value::Object(annotated) => {
                    let field_type = annotated
                        .get("type")
                        .and_then(|t| t.as_str())
                        .map(FieldType::from_token)
                        .unwrap_or(FieldType::Any);

                    let mut field = SchemaField::new(name, field_type).with_required(
                        annotated
                            .get("required")
                            .and_then(|r| r.as_bool())
                            .unwrap_or(false),
                    );

                    if let Some(target) = annotated
                        .get("target")
                        .and_then(|t| t.as_str())
                        .filter(|t| !t.trim().is_empty())
                    {
                        field = field.with_target(target.trim());
                    }

                    field
                }
                other => {
                    return Err(DomainError::validation(format!(
                        "Schema field '{}' must be a type name or an object, got {}",
                        name,
                        json_kind(other)
                    )));
                }
            };

            schema = schema.with(field);
        }

        Ok(schema)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|f| (f.name.clone(), f.to_value()))
                .collect(),
        )
    }
}

impl TryFrom<Value> for Schema {
    type Error = DomainError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

impl From<Schema> for Value {
    fn from(schema: Schema) -> Self {
        schema.to_value()
    }
}

/// Human-readable JSON kind, used in warnings
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
