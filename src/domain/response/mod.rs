//! Response parsing domain
//!
//! Turns free-form assistant replies into structured data:
//! - [`extraction`] recovers a JSON object from noisy text
//! - [`schema`] declares the expected shape and mutation targets
//! - [`parser`] coerces values, collects warnings and derives mappings

mod extraction;
mod parser;
mod schema;

use serde_json::{Map, Value};

pub use extraction::{balanced_span, extract_json_object, fenced_block, repair_escapes, ExtractionMethod};
pub use parser::{
    coerce_to_schema, generate_mappings, parse_with_schema, FieldMapping, ParseResult,
    EXTRACTION_FAILED,
};
pub(crate) use schema::json_kind;
pub use schema::{FieldType, Schema, SchemaField};

/// Look up a value by dot path (`post.title`, `items.0.name`).
///
/// An exact top-level key wins over path traversal, so keys that contain
/// dots stay addressable.
pub fn get_nested_value<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => get_nested_in_map(map, path),
        _ => traverse(value, path),
    }
}

/// [`get_nested_value`] on an object map
pub fn get_nested_in_map<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    if let Some(value) = map.get(path) {
        return Some(value);
    }

    let (head, rest) = path.split_once('.')?;
    traverse(map.get(head)?, rest)
}

fn traverse<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;

    for part in path.split('.') {
        match current {
            Value::Object(obj) => {
                current = obj.get(part)?;
            }
            Value::Array(arr) => {
                let index: usize = part.parse().ok()?;
                current = arr.get(index)?;
            }
            _ => return None,
        }
    }

    Some(current)
}
