use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::http_client::HttpClientTrait;
use crate::domain::{ChatParameters, ChatProvider, DomainError, Message, MessageRole};

const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u64 = 4096;

/// Anthropic messages API provider
#[derive(Debug)]
pub struct AnthropicProvider<C: HttpClientTrait> {
    client: C,
    api_key: String,
    base_url: String,
}

impl<C: HttpClientTrait> AnthropicProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_ANTHROPIC_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            api_key: api_key.into(),
            base_url,
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    fn build_request(&self, messages: &[Message], parameters: &ChatParameters) -> Value {
        let (system, messages) = split_system_messages(messages);

        let mut body = parameters.clone();
        body.insert(
            "messages".to_string(),
            Value::Array(
                messages
                    .iter()
                    .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
                    .collect(),
            ),
        );
        body.entry("max_tokens")
            .or_insert_with(|| Value::from(DEFAULT_MAX_TOKENS));
        body.insert("stream".to_string(), Value::Bool(false));

        // Stop sequences use a different key than the OpenAI-style "stop"
        if let Some(stop) = body.remove("stop") {
            body.insert("stop_sequences".to_string(), stop);
        }

        if let Some(system) = system {
            body.insert("system".to_string(), Value::String(system));
        }

        Value::Object(body)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("x-api-key", self.api_key.as_str()),
            ("anthropic-version", ANTHROPIC_VERSION),
            ("Content-Type", "application/json"),
        ]
    }
}

/// System messages go in the top-level `system` field, joined by newlines
fn split_system_messages(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
    let mut system_content = String::new();
    let mut other_messages = Vec::new();

    for msg in messages {
        if msg.role == MessageRole::System {
            if !system_content.is_empty() {
                system_content.push('\n');
            }
            system_content.push_str(msg.content_text());
        } else {
            other_messages.push(msg);
        }
    }

    let system = if system_content.is_empty() {
        None
    } else {
        Some(system_content)
    };

    (system, other_messages)
}

#[async_trait]
impl<C: HttpClientTrait> ChatProvider for AnthropicProvider<C> {
    async fn chat_completion(
        &self,
        messages: &[Message],
        parameters: &ChatParameters,
    ) -> Result<Value, DomainError> {
        if !parameters.contains_key("model") {
            return Err(DomainError::configuration("Anthropic request requires a model"));
        }

        let url = self.messages_url();
        let body = self.build_request(messages, parameters);
        debug!(url = %url, messages = messages.len(), "Sending Anthropic messages request");

        let response = self
            .client
            .post_json(&url, self.headers(), &body)
            .await
            .map_err(|e| e.for_provider(self.provider_name()))?;

        if response.get("type").and_then(|t| t.as_str()) == Some("error") {
            let error = response.get("error").cloned().unwrap_or(Value::Null);
            return Err(DomainError::provider_with_code(
                self.provider_name(),
                error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("Unknown error"),
                error
                    .get("type")
                    .and_then(|t| t.as_str())
                    .unwrap_or("api_error"),
                None,
            ));
        }

        Ok(response)
    }

    fn extract_content(&self, raw: &Value) -> Option<String> {
        let blocks = raw.get("content")?.as_array()?;

        let text: Vec<&str> = blocks
            .iter()
            .filter(|block| block.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
            .collect();

        if text.is_empty() {
            None
        } else {
            Some(text.join(""))
        }
    }

    fn provider_name(&self) -> &'static str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Usage;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;
    use crate::infrastructure::llm::http_client::HttpClient;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const URL: &str = "https://api.anthropic.com/v1/messages";

    fn reply() -> Value {
        json!({
            "id": "msg_1",
            "type": "message",
            "model": "claude-3-5-sonnet",
            "content": [
                {"type": "text", "text": "Hola "},
                {"type": "tool_use", "id": "t", "name": "x", "input": {}},
                {"type": "text", "text": "mundo"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 11, "output_tokens": 4}
        })
    }

    fn params() -> ChatParameters {
        let mut params = ChatParameters::new();
        params.insert("model".to_string(), json!("claude-3-5-sonnet"));
        params
    }

    #[test]
    fn test_build_request_moves_system_messages() {
        let provider = AnthropicProvider::new(MockHttpClient::new(), "k");
        let mut parameters = params();
        parameters.insert("stop".to_string(), json!(["END"]));

        let body = provider.build_request(
            &[Message::system("a"), Message::system("b"), Message::user("hi")],
            &parameters,
        );

        assert_eq!(body["system"], json!("a\nb"));
        assert_eq!(body["messages"], json!([{"role": "user", "content": "hi"}]));
        assert_eq!(body["max_tokens"], json!(4096));
        assert_eq!(body["stop_sequences"], json!(["END"]));
        assert!(body.get("stop").is_none());
    }

    #[tokio::test]
    async fn test_text_blocks_are_joined() {
        let client = MockHttpClient::new().with_response(URL, reply());
        let provider = AnthropicProvider::new(client, "k");

        let raw = provider
            .chat_completion(&[Message::user("hi")], &params())
            .await
            .unwrap();

        assert_eq!(provider.extract_content(&raw).as_deref(), Some("Hola mundo"));
        assert_eq!(provider.extract_usage(&raw), Some(Usage::new(11, 4)));
    }

    #[tokio::test]
    async fn test_headers_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "secret"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(json!({"model": "claude-3-5-sonnet", "system": "sys"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply()))
            .expect(1)
            .mount(&server)
            .await;

        let provider = AnthropicProvider::with_base_url(HttpClient::new(), "secret", server.uri());
        provider
            .chat_completion(&[Message::system("sys"), Message::user("hi")], &params())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_overloaded_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_json(json!({
                "type": "error",
                "error": {"type": "overloaded_error", "message": "Overloaded"}
            })))
            .mount(&server)
            .await;

        let provider = AnthropicProvider::with_base_url(HttpClient::new(), "k", server.uri());
        let err = provider
            .chat_completion(&[Message::user("hi")], &params())
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), Some("overloaded_error"));
        assert!(matches!(err, DomainError::Provider { ref provider, .. } if provider == "anthropic"));
    }
}
