//! Adapter between the flat legacy context shape and the dot-path tree
//!
//! Older step configurations address data with flat keys such as
//! `post_title`, `meta_seo_title` or `original_content`. All translation
//! between that shape and [`ExecutionContext`] happens here.

use serde_json::{Map, Value};

use super::context::ExecutionContext;

/// Flat legacy key -> dot path
const POST_FIELD_KEYS: &[(&str, &str)] = &[
    ("post_id", "post.id"),
    ("post_title", "post.title"),
    ("post_content", "post.content"),
    ("post_excerpt", "post.excerpt"),
    ("post_status", "post.status"),
    ("post_type", "post.type"),
    ("post_name", "post.slug"),
    ("post_author", "post.author"),
    ("post_date", "post.date"),
];

/// Short aliases exposed to templates, pointing at dot paths
const TEMPLATE_ALIASES: &[(&str, &str)] = &[
    ("title", "post.title"),
    ("content", "post.content"),
    ("excerpt", "post.excerpt"),
    ("post_id", "post.id"),
    ("post_title", "post.title"),
    ("post_content", "post.content"),
    ("post_excerpt", "post.excerpt"),
    ("original_title", "original.title"),
    ("original_content", "original.content"),
    ("original_excerpt", "original.excerpt"),
    ("source_language", "translation.source_language"),
    ("target_language", "translation.target_language"),
];

const META_PREFIX: &str = "meta_";
const ORIGINAL_PREFIX: &str = "original_";

pub struct LegacyContextAdapter;

impl LegacyContextAdapter {
    /// Convert a flat legacy map into the dot-path tree.
    ///
    /// Keys that are not recognised are kept at the top level unchanged.
    pub fn from_legacy(legacy: &Map<String, Value>) -> Value {
        let mut tree = Map::new();

        for (key, value) in legacy {
            let path = Self::legacy_key_to_path(key);
            insert_path(&mut tree, &path, value.clone());
        }

        Value::Object(tree)
    }

    /// Dot path that a legacy flat key maps to
    pub fn legacy_key_to_path(key: &str) -> String {
        if let Some((_, path)) = POST_FIELD_KEYS.iter().find(|(k, _)| *k == key) {
            return (*path).to_string();
        }

        if let Some(meta_key) = key.strip_prefix(META_PREFIX).filter(|k| !k.is_empty()) {
            return format!("meta.{}", meta_key);
        }

        if let Some(field) = key.strip_prefix(ORIGINAL_PREFIX).filter(|k| !k.is_empty()) {
            return format!("original.{}", field);
        }

        key.to_string()
    }

    /// Context export with flat aliases added for template rendering.
    ///
    /// Aliases never overwrite keys that already exist in the context.
    pub fn template_view(context: &ExecutionContext) -> Value {
        let mut view = context.data().clone();

        for (alias, path) in TEMPLATE_ALIASES {
            if view.contains_key(*alias) {
                continue;
            }
            if let Some(value) = context.get(path) {
                view.insert((*alias).to_string(), value.clone());
            }
        }

        if let Some(Value::Object(meta)) = context.get("meta") {
            for (key, value) in meta {
                let alias = format!("{}{}", META_PREFIX, key);
                if !view.contains_key(&alias) {
                    view.insert(alias, value.clone());
                }
            }
        }

        Value::Object(view)
    }
}

/// Insert creating intermediate objects; a scalar in the way is replaced.
///
/// An object landing on an existing object is merged into it, so flat and
/// nested keys for the same subtree combine in any order.
fn insert_path(tree: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = tree;

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            match current.get_mut(segment) {
                Some(existing) => merge_value(existing, value),
                None => {
                    current.insert(segment.to_string(), value);
                }
            }
            return;
        }

        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }

        current = match entry {
            Value::Object(map) => map,
            _ => return,
        };
    }
}

/// Deep merge for objects; anything else replaces the existing value
fn merge_value(existing: &mut Value, incoming: Value) {
    match (existing, incoming) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
