use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt::Debug;

use super::{Message, Usage};
use crate::domain::DomainError;

/// Parameters forwarded to a provider (model, temperature, vendor extras)
pub type ChatParameters = Map<String, Value>;

/// Trait for chat-completion providers (OpenAI, Anthropic, ...)
///
/// Providers differ in reply shape, so each one extracts its own text and
/// usage from the raw payload it returned. Providers built on a submit/poll
/// job model keep the polling internal and expose the same contract.
#[async_trait]
pub trait ChatProvider: Send + Sync + Debug {
    /// Send a chat completion request and return the raw provider payload
    async fn chat_completion(
        &self,
        messages: &[Message],
        parameters: &ChatParameters,
    ) -> Result<Value, DomainError>;

    /// Pull the textual reply out of a raw payload
    fn extract_content(&self, raw: &Value) -> Option<String>;

    /// Pull token usage out of a raw payload
    fn extract_usage(&self, raw: &Value) -> Option<Usage> {
        raw.get("usage").and_then(Usage::from_raw)
    }

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}
