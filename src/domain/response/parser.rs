//! Schema-driven response parser
//!
//! Recovers a JSON object from model output, coerces it to a declared
//! [`Schema`] and derives field-to-target mappings. Coercion problems are
//! reported as warnings; the only hard failure is when no JSON object can be
//! recovered at all.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::debug;

use super::extraction::{extract_json_object, ExtractionMethod};
use super::get_nested_in_map;
use super::schema::{json_kind, FieldType, Schema, SchemaField};

/// Error prefix reported when no JSON could be recovered
pub const EXTRACTION_FAILED: &str = "Failed to extract JSON from response";

/// Maps a parsed field onto a mutation target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Dot path into the parsed data
    pub field_path: String,
    /// Target such as `post.title`, `meta.seo_title`, `taxonomy.category`
    pub target: String,
    pub required: bool,
}

/// Outcome of parsing one reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub success: bool,
    pub data: Map<String, Value>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub mappings: Vec<FieldMapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<ExtractionMethod>,
}

impl ParseResult {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Map::new(),
            warnings: Vec::new(),
            mappings: Vec::new(),
            error: Some(error.into()),
            method: None,
        }
    }

    /// Parsed data as a JSON value
    pub fn data_value(&self) -> Value {
        Value::Object(self.data.clone())
    }
}

/// Parse raw model output against a schema
pub fn parse_with_schema(raw_text: &str, schema: &Schema) -> ParseResult {
    let Some((extracted, method)) = extract_json_object(raw_text) else {
        let preview: String = raw_text.chars().take(120).collect();
        debug!(preview = %preview, "No JSON object found in response");
        return ParseResult::failure(format!(
            "{}: no valid JSON object found in the response text",
            EXTRACTION_FAILED
        ));
    };

    debug!(method = ?method, fields = extracted.len(), "Extracted JSON from response");

    if schema.is_empty() {
        return ParseResult {
            success: true,
            data: extracted,
            warnings: Vec::new(),
            mappings: Vec::new(),
            error: None,
            method: Some(method),
        };
    }

    let (data, warnings) = coerce_to_schema(extracted, schema);
    let mappings = generate_mappings(schema, &data);

    ParseResult {
        success: true,
        data,
        warnings,
        mappings,
        error: None,
        method: Some(method),
    }
}

/// Coerce every schema field in place. Unlisted fields are kept as-is.
pub fn coerce_to_schema(
    mut data: Map<String, Value>,
    schema: &Schema,
) -> (Map<String, Value>, Vec<String>) {
    let mut warnings = Vec::new();

    for field in schema.fields() {
        // Dotted names that resolve to a nested value are addressed by mappings only
        if !data.contains_key(&field.name)
            && field.name.contains('.')
            && get_nested_in_map(&data, &field.name).is_some_and(|v| !v.is_null())
        {
            continue;
        }

        let coerced = match data.get(&field.name) {
            None | Some(Value::Null) => {
                warnings.push(format!("Missing field: {}", field.name));
                Value::Null
            }
            Some(value) => coerce_value(field, value, &mut warnings),
        };

        data.insert(field.name.clone(), coerced);
    }

    (data, warnings)
}

fn coerce_value(field: &SchemaField, value: &Value, warnings: &mut Vec<String>) -> Value {
    if field.field_type.matches(value) {
        return value.clone();
    }

    let name = &field.name;

    match field.field_type {
        FieldType::Number => match value {
            Value::String(s) => match parse_number(s) {
                Some(number) => {
                    warnings.push(format!(
                        "Type coercion: field '{}' converted from string to number",
                        name
                    ));
                    Value::Number(number)
                }
                None => {
                    warnings.push(format!(
                        "Type coercion: impossible coercion of field '{}' to number (value: {:?})",
                        name, s
                    ));
                    Value::Null
                }
            },
            Value::Bool(b) => {
                warnings.push(format!(
                    "Type coercion: field '{}' converted from boolean to number",
                    name
                ));
                Value::from(u8::from(*b))
            }
            other => {
                warnings.push(format!(
                    "Type coercion: impossible coercion of field '{}' from {} to number",
                    name,
                    json_kind(other)
                ));
                Value::Null
            }
        },

        FieldType::Boolean => {
            let coerced = match value {
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "yes" => true,
                    "false" | "no" => false,
                    other => !other.is_empty() && other != "0",
                },
                Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
                Value::Array(items) => !items.is_empty(),
                Value::Object(object) => !object.is_empty(),
                _ => false,
            };

            warnings.push(format!(
                "Type coercion: field '{}' converted from {} to boolean",
                name,
                json_kind(value)
            ));
            Value::Bool(coerced)
        }

        FieldType::Array => {
            warnings.push(format!(
                "Type coercion: field '{}' wrapped from {} into array",
                name,
                json_kind(value)
            ));
            Value::Array(vec![value.clone()])
        }

        // Lists are accepted where an object is declared
        FieldType::Object if value.is_array() => value.clone(),

        FieldType::Object => {
            warnings.push(format!(
                "Type coercion: impossible coercion of field '{}' from {} to object",
                name,
                json_kind(value)
            ));
            Value::Null
        }

        FieldType::String => {
            let text = match value {
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                other => serde_json::to_string(other).unwrap_or_default(),
            };

            warnings.push(format!(
                "Type coercion: field '{}' converted from {} to string",
                name,
                json_kind(value)
            ));
            Value::String(text)
        }

        FieldType::Any => value.clone(),
    }
}

/// `"8"` becomes an integer, `"8.5"` a float; anything else is not numeric
fn parse_number(text: &str) -> Option<Number> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(Number::from(int));
    }

    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
}

/// Mappings for every targeted field with a non-null (or required) value
pub fn generate_mappings(schema: &Schema, data: &Map<String, Value>) -> Vec<FieldMapping> {
    schema
        .targeted_fields()
        .filter_map(|field| {
            let target = field.target.as_ref()?;
            let has_value = get_nested_in_map(data, &field.name).is_some_and(|v| !v.is_null());

            (has_value || field.required).then(|| FieldMapping {
                field_path: field.name.clone(),
                target: target.clone(),
                required: field.required,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn review_schema() -> Schema {
        Schema::new()
            .with_field("analysis", FieldType::String)
            .with_field("score", FieldType::Number)
            .with_field("suggestions", FieldType::Array)
    }

    fn parse(raw: &str, schema: &Schema) -> ParseResult {
        parse_with_schema(raw, schema)
    }

    #[test]
    fn test_exact_types_pass_through() {
        let raw = r#"{"analysis":"Good post","score":8,"suggestions":["tip1","tip2"]}"#;
        let result = parse(raw, &review_schema());

        assert!(result.success);
        assert!(result.warnings.is_empty());
        assert_eq!(
            result.data_value(),
            json!({"analysis": "Good post", "score": 8, "suggestions": ["tip1", "tip2"]})
        );
    }

    #[test]
    fn test_missing_fields_become_null() {
        let result = parse(r#"{"analysis":"Good post"}"#, &review_schema());

        assert!(result.success);
        assert_eq!(result.data["score"], Value::Null);
        assert_eq!(result.data["suggestions"], Value::Null);
        assert_eq!(
            result.warnings,
            vec!["Missing field: score", "Missing field: suggestions"]
        );
    }

    #[test]
    fn test_numeric_string_to_integer() {
        let schema = Schema::new().with_field("score", FieldType::Number);
        let result = parse(r#"{"score":"8"}"#, &schema);

        assert_eq!(result.data["score"], json!(8));
        assert!(result.data["score"].is_i64());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_numeric_string_to_float() {
        let schema = Schema::new().with_field("score", FieldType::Number);
        let result = parse(r#"{"score":"8.5"}"#, &schema);

        assert_eq!(result.data["score"], json!(8.5));
        assert!(result.data["score"].is_f64());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_non_numeric_string_is_impossible() {
        let schema = Schema::new().with_field("score", FieldType::Number);
        let result = parse(r#"{"score":"not a number"}"#, &schema);

        assert!(result.success);
        assert_eq!(result.data["score"], Value::Null);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("impossible coercion"));
    }

    #[test]
    fn test_scalar_wrapped_into_array() {
        let schema = Schema::new().with_field("suggestions", FieldType::Array);
        let result = parse(r#"{"suggestions":"Add images"}"#, &schema);

        assert_eq!(result.data["suggestions"], json!(["Add images"]));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_boolean_string_coercion() {
        let schema = Schema::new()
            .with_field("a", FieldType::Boolean)
            .with_field("b", FieldType::Boolean)
            .with_field("c", FieldType::Boolean)
            .with_field("d", FieldType::Boolean)
            .with_field("e", FieldType::Boolean);
        let result = parse(
            r#"{"a":"true","b":"false","c":"yes","d":"No","e":"maybe"}"#,
            &schema,
        );

        assert_eq!(result.data["a"], json!(true));
        assert_eq!(result.data["b"], json!(false));
        assert_eq!(result.data["c"], json!(true));
        assert_eq!(result.data["d"], json!(false));
        assert_eq!(result.data["e"], json!(true));
        assert_eq!(result.warnings.len(), 5);
    }

    #[test]
    fn test_object_from_scalar_is_null() {
        let schema = Schema::new().with_field("details", FieldType::Object);
        let result = parse(r#"{"details":"none"}"#, &schema);

        assert_eq!(result.data["details"], Value::Null);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_object_accepts_arrays_and_objects() {
        let schema = Schema::new()
            .with_field("a", FieldType::Object)
            .with_field("b", FieldType::Object);
        let result = parse(r#"{"a":{"k":1},"b":[1]}"#, &schema);

        assert_eq!(result.data["a"], json!({"k": 1}));
        assert_eq!(result.data["b"], json!([1]));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_string_from_number() {
        let schema = Schema::new().with_field("title", FieldType::String);
        let result = parse(r#"{"title":2024}"#, &schema);

        assert_eq!(result.data["title"], json!("2024"));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_extra_fields_preserved() {
        let schema = Schema::new().with_field("score", FieldType::Number);
        let result = parse(r#"{"score":3,"bonus":{"note":"extra"},"z":[1]}"#, &schema);

        assert_eq!(result.data["bonus"], json!({"note": "extra"}));
        assert_eq!(result.data["z"], json!([1]));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_empty_schema_is_identity() {
        let raw = r#"{"anything":"goes","n":"8"}"#;
        let result = parse(raw, &Schema::new());

        assert!(result.success);
        assert!(result.warnings.is_empty());
        assert_eq!(result.data_value(), json!({"anything": "goes", "n": "8"}));
    }

    #[test]
    fn test_fenced_and_bare_extract_identically() {
        let bare = r#"{"analysis":"Good post","score":8,"suggestions":["tip1"]}"#;
        let wrapped = format!(
            "Sure, here is my review of the post.\n\n```json\n{}\n```\n\nLet me know if you need more.",
            bare
        );

        let a = parse(bare, &review_schema());
        let b = parse(&wrapped, &review_schema());

        assert_eq!(a.data, b.data);
        assert_eq!(a.warnings, b.warnings);
    }

    #[test]
    fn test_non_json_input_fails() {
        let result = parse("I'm sorry, I can't help with that.", &review_schema());

        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("Failed to extract JSON"));
        assert!(result.data.is_empty());
    }

    #[test]
    fn test_mappings_for_targeted_fields() {
        let schema = Schema::from_value(&json!({
            "seo_title": {"type": "string", "target": "meta.seo_title"},
            "title": {"type": "string", "target": "post.title"},
            "summary": {"type": "string", "target": "post.excerpt", "required": true},
            "notes": "string"
        }))
        .unwrap();

        let result = parse(r#"{"seo_title":"Best","title":null}"#, &schema);

        assert_eq!(
            result.mappings,
            vec![
                FieldMapping {
                    field_path: "seo_title".to_string(),
                    target: "meta.seo_title".to_string(),
                    required: false,
                },
                FieldMapping {
                    field_path: "summary".to_string(),
                    target: "post.excerpt".to_string(),
                    required: true,
                },
            ]
        );
    }

    #[test]
    fn test_mapping_uses_nested_path() {
        let schema = Schema::new()
            .with(SchemaField::new("seo.title", FieldType::Any).with_target("meta.seo_title"));

        let mut data = Map::new();
        data.insert("seo".to_string(), json!({"title": "Nested"}));

        let mappings = generate_mappings(&schema, &data);
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].field_path, "seo.title");
    }
}
