use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::http_client::HttpClientTrait;
use crate::domain::{ChatParameters, ChatProvider, DomainError, Message};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// OpenAI chat completions provider
#[derive(Debug)]
pub struct OpenAiProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
}

impl<C: HttpClientTrait> OpenAiProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_OPENAI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            base_url,
        }
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn build_request(&self, messages: &[Message], parameters: &ChatParameters) -> Value {
        let messages: Vec<Value> = messages
            .iter()
            .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
            .collect();

        let mut body = parameters.clone();
        body.insert("messages".to_string(), Value::Array(messages));
        body.insert("stream".to_string(), Value::Bool(false));

        Value::Object(body)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }
}

#[async_trait]
impl<C: HttpClientTrait> ChatProvider for OpenAiProvider<C> {
    async fn chat_completion(
        &self,
        messages: &[Message],
        parameters: &ChatParameters,
    ) -> Result<Value, DomainError> {
        if !parameters.contains_key("model") {
            return Err(DomainError::configuration("OpenAI request requires a model"));
        }

        let url = self.chat_completions_url();
        let body = self.build_request(messages, parameters);
        debug!(url = %url, messages = messages.len(), "Sending OpenAI chat completion");

        let response = self
            .client
            .post_json(&url, self.headers(), &body)
            .await
            .map_err(|e| e.for_provider(self.provider_name()))?;

        if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
            return Err(DomainError::provider_with_code(
                self.provider_name(),
                error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("Unknown error"),
                error
                    .get("code")
                    .and_then(|c| c.as_str())
                    .unwrap_or("api_error"),
                None,
            ));
        }

        Ok(response)
    }

    fn extract_content(&self, raw: &Value) -> Option<String> {
        raw.get("choices")?
            .get(0)?
            .get("message")?
            .get("content")?
            .as_str()
            .map(str::to_string)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
