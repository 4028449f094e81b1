//! Execution context shared by all steps of a run
//!
//! The context is a JSON tree addressed by dot paths (`post.title`,
//! `meta.seo_title`, `_step_outputs.analyze.score`), plus a registry of
//! optional named services that steps can depend on.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::response::{get_nested_in_map, json_kind};
use crate::domain::DomainError;

/// Context key holding per-step outputs, keyed by step id
pub const STEP_OUTPUTS_KEY: &str = "_step_outputs";

/// Where the context data comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSource {
    /// Backed by a live entity that actions can be applied to
    Entity { post_id: u64 },
    /// JSON only, no entity behind it
    Virtual,
}

/// Named services available to steps
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, service: Arc<T>) {
        self.services.insert(name.into(), service);
    }

    /// Typed lookup; `None` when the name is unknown or the type differs
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.services
            .get(name)
            .and_then(|service| Arc::clone(service).downcast::<T>().ok())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.services.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.names())
            .finish()
    }
}

/// Mutable, path-addressable store for a single workflow run
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    data: Map<String, Value>,
    services: ServiceRegistry,
    source: ContextSource,
    dry_run: bool,
}

impl ExecutionContext {
    /// Context backed by the entity with the given id
    pub fn for_entity(post_id: u64, data: Value) -> Self {
        Self::with_source(ContextSource::Entity { post_id }, data)
    }

    /// Context holding only JSON data
    pub fn virtual_context(data: Value) -> Self {
        Self::with_source(ContextSource::Virtual, data)
    }

    fn with_source(source: ContextSource, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("input".to_string(), other);
                map
            }
        };

        Self {
            data,
            services: ServiceRegistry::new(),
            source,
            dry_run: false,
        }
    }

    pub fn with_service<T: Any + Send + Sync>(
        mut self,
        name: impl Into<String>,
        service: Arc<T>,
    ) -> Self {
        self.services.insert(name, service);
        self
    }

    pub fn with_services(mut self, services: ServiceRegistry) -> Self {
        self.services = services;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    /// Read a value; absent paths return `None`
    pub fn get(&self, path: &str) -> Option<&Value> {
        get_nested_in_map(&self.data, path)
    }

    /// Whether a non-null value exists at `path`
    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some_and(|v| !v.is_null())
    }

    /// Write a value, creating intermediate objects.
    ///
    /// Fails with [`DomainError::TypeMismatch`] when a parent segment holds
    /// a non-object value.
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), DomainError> {
        let segments: Vec<&str> = path.split('.').collect();
        if path.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return Err(DomainError::validation(format!(
                "Invalid context path '{}'",
                path
            )));
        }

        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| DomainError::validation("Empty context path"))?;

        let mut current = &mut self.data;
        for (depth, segment) in parents.iter().enumerate() {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));

            current = match entry {
                Value::Object(map) => map,
                other => {
                    return Err(DomainError::type_mismatch(
                        segments[..=depth].join("."),
                        format!(
                            "cannot set '{}': parent holds {} instead of an object",
                            path,
                            json_kind(other)
                        ),
                    ));
                }
            };
        }

        current.insert(last.to_string(), value);
        Ok(())
    }

    /// Snapshot of the whole tree
    pub fn export(&self) -> Value {
        Value::Object(self.data.clone())
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Typed service lookup
    pub fn service<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.services.get(name)
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.services.contains(name)
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn source(&self) -> ContextSource {
        self.source
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.source, ContextSource::Virtual)
    }

    pub fn post_id(&self) -> Option<u64> {
        match self.source {
            ContextSource::Entity { post_id } => Some(post_id),
            ContextSource::Virtual => None,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Record a step's output under `_step_outputs.<step_id>`
    pub fn record_step_output(&mut self, step_id: &str, output: Value) {
        let ledger = self
            .data
            .entry(STEP_OUTPUTS_KEY.to_string())
            .or_insert_with(|| Value::Object(Map::new()));

        if !ledger.is_object() {
            *ledger = Value::Object(Map::new());
        }

        if let Value::Object(map) = ledger {
            map.insert(step_id.to_string(), output);
        }
    }

    /// Output of a previously executed step
    pub fn step_output(&self, step_id: &str) -> Option<&Value> {
        self.data
            .get(STEP_OUTPUTS_KEY)
            .and_then(|ledger| ledger.get(step_id))
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::virtual_context(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Counter(u32);

    #[test]
    fn test_get_absent_is_none() {
        let ctx = ExecutionContext::virtual_context(json!({"post": {"title": "Hi"}}));

        assert_eq!(ctx.get("post.title"), Some(&json!("Hi")));
        assert_eq!(ctx.get("post.missing"), None);
        assert_eq!(ctx.get("nothing.here"), None);
    }

    #[test]
    fn test_set_creates_intermediate_nodes() {
        let mut ctx = ExecutionContext::default();
        ctx.set("meta.seo.title", json!("SEO")).unwrap();

        assert_eq!(ctx.get("meta.seo.title"), Some(&json!("SEO")));
        assert_eq!(ctx.export(), json!({"meta": {"seo": {"title": "SEO"}}}));
    }

    #[test]
    fn test_set_through_scalar_is_type_mismatch() {
        let mut ctx = ExecutionContext::virtual_context(json!({"post": {"title": "Hi"}}));

        let err = ctx.set("post.title.sub", json!(1)).unwrap_err();
        assert!(matches!(err, DomainError::TypeMismatch { ref path, .. } if path == "post.title"));
        // Unchanged after the failed write
        assert_eq!(ctx.get("post.title"), Some(&json!("Hi")));
    }

    #[test]
    fn test_set_invalid_path() {
        let mut ctx = ExecutionContext::default();
        assert!(ctx.set("", json!(1)).is_err());
        assert!(ctx.set("a..b", json!(1)).is_err());
    }

    #[test]
    fn test_has_treats_null_as_absent() {
        let ctx = ExecutionContext::virtual_context(json!({"a": null, "b": 0, "c": ""}));

        assert!(!ctx.has("a"));
        assert!(ctx.has("b"));
        assert!(ctx.has("c"));
        assert!(!ctx.has("d"));
    }

    #[test]
    fn test_services() {
        let ctx = ExecutionContext::default().with_service("counter", Arc::new(Counter(3)));

        assert!(ctx.has_service("counter"));
        assert!(!ctx.has_service("missing"));
        assert_eq!(ctx.service::<Counter>("counter").unwrap().0, 3);
        // Wrong type is treated as absent
        assert!(ctx.service::<String>("counter").is_none());
    }

    #[test]
    fn test_source() {
        let entity = ExecutionContext::for_entity(42, json!({}));
        assert!(!entity.is_virtual());
        assert_eq!(entity.post_id(), Some(42));

        let virt = ExecutionContext::virtual_context(json!({}));
        assert!(virt.is_virtual());
        assert_eq!(virt.post_id(), None);
    }

    #[test]
    fn test_non_object_input_is_wrapped() {
        let ctx = ExecutionContext::virtual_context(json!("raw text"));
        assert_eq!(ctx.get("input"), Some(&json!("raw text")));
    }

    #[test]
    fn test_step_output_ledger() {
        let mut ctx = ExecutionContext::default();
        ctx.record_step_output("analyze", json!({"score": 8}));
        ctx.record_step_output("tag", json!("done"));

        assert_eq!(ctx.step_output("tag"), Some(&json!("done")));
        assert_eq!(ctx.get("_step_outputs.analyze.score"), Some(&json!(8)));
    }
}
