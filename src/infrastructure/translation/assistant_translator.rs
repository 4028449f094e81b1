//! Single-hop translation through a managed assistant

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::{
    AssistantExecutor, AssistantSource, DomainError, ExecutionContext, LanguagePair, Translator,
};

/// Translates a pair with the assistant configured for it.
///
/// Assistants are keyed by `"src->tgt"`. A pair without its own assistant
/// falls back to the first configured one in key order.
#[derive(Debug)]
pub struct AssistantTranslator {
    executor: Arc<dyn AssistantExecutor>,
    assistants: BTreeMap<LanguagePair, String>,
}

impl AssistantTranslator {
    pub fn new(executor: Arc<dyn AssistantExecutor>, assistants: &BTreeMap<String, String>) -> Self {
        let assistants = assistants
            .iter()
            .filter_map(|(key, id)| {
                let (source, target) = key.split_once("->")?;
                Some((LanguagePair::new(source, target), id.trim().to_string()))
            })
            .filter(|(pair, id)| !id.is_empty() && !pair.source.is_empty() && !pair.target.is_empty())
            .collect();

        Self {
            executor,
            assistants,
        }
    }

    /// Assistant used for a pair, fallback included
    pub fn assistant_for(&self, pair: &LanguagePair) -> Option<&str> {
        if let Some(id) = self.assistants.get(pair) {
            return Some(id);
        }

        let (fallback_pair, id) = self.assistants.iter().next()?;
        warn!(
            pair = %pair,
            fallback_pair = %fallback_pair,
            assistant_id = %id,
            "No translation assistant for pair, using fallback"
        );
        Some(id)
    }
}

#[async_trait]
impl Translator for AssistantTranslator {
    async fn translate(&self, text: &str, pair: &LanguagePair) -> Result<String, DomainError> {
        let assistant_id = self.assistant_for(pair).ok_or_else(|| {
            DomainError::translation(&pair.source, &pair.target, "no translation assistant configured")
        })?;

        let context = ExecutionContext::virtual_context(json!({
            "text": text,
            "translation": {
                "source_language": pair.source,
                "target_language": pair.target,
            },
        }));

        debug!(pair = %pair, assistant_id = %assistant_id, "Translating hop");

        let result = self
            .executor
            .execute(AssistantSource::managed(assistant_id), &context)
            .await;

        if !result.success {
            return Err(DomainError::translation(
                &pair.source,
                &pair.target,
                result.error.unwrap_or_else(|| "assistant failed".to_string()),
            ));
        }

        let translated = result.text().map(str::to_string).or_else(|| {
            result
                .output_map()
                .get("translation")
                .and_then(|v| v.as_str())
                .map(str::to_string)
        });

        translated.ok_or_else(|| {
            DomainError::translation(&pair.source, &pair.target, "assistant returned no translation")
        })
    }
}
