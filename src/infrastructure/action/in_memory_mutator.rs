//! In-memory entity mutator
//!
//! Keeps one document per post shaped like the execution context
//! (`post`, `meta`, `terms`) and a log of every applied action.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{Action, DomainError, EntityMutator};

#[derive(Debug, Default)]
struct PostState {
    document: Map<String, Value>,
    applied: Vec<Action>,
}

impl PostState {
    fn write(&mut self, section: &str, key: &str, value: Value) {
        let entry = self
            .document
            .entry(section.to_string())
            .or_insert_with(|| json!({}));
        if !entry.is_object() {
            *entry = json!({});
        }
        if let Some(map) = entry.as_object_mut() {
            map.insert(key.to_string(), value);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityMutator {
    posts: Arc<RwLock<HashMap<u64, PostState>>>,
}

impl InMemoryEntityMutator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a post document, replacing any previous state
    pub async fn insert_post(&self, post_id: u64, document: Value) {
        let document = match document {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        self.posts.write().await.insert(
            post_id,
            PostState {
                document,
                applied: Vec::new(),
            },
        );
    }

    /// Current document of a post, if anything was seeded or applied
    pub async fn snapshot(&self, post_id: u64) -> Option<Value> {
        self.posts
            .read()
            .await
            .get(&post_id)
            .map(|state| Value::Object(state.document.clone()))
    }

    /// Actions applied to a post, in order
    pub async fn applied(&self, post_id: u64) -> Vec<Action> {
        self.posts
            .read()
            .await
            .get(&post_id)
            .map(|state| state.applied.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EntityMutator for InMemoryEntityMutator {
    async fn apply(&self, post_id: u64, action: &Action) -> Result<(), DomainError> {
        if action.target_name().trim().is_empty() {
            return Err(DomainError::action(format!(
                "{} has no target",
                action.type_name()
            )));
        }

        let mut posts = self.posts.write().await;
        let state = posts.entry(post_id).or_default();

        let (section, key) = match action {
            Action::UpdatePostField { field, .. } => ("post", field),
            Action::UpdatePostMeta { meta_key, .. } => ("meta", meta_key),
            Action::AssignTaxonomy { taxonomy, .. } => ("terms", taxonomy),
        };

        state.write(section, key, action.value().clone());
        state.applied.push(action.clone());

        debug!(post_id, action = action.type_name(), target = %key, "Applied action");
        Ok(())
    }
}
