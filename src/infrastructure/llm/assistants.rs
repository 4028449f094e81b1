//! OpenAI Assistants provider (thread + run with polling)

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::http_client::HttpClientTrait;
use crate::domain::{ChatParameters, ChatProvider, DomainError, Message, MessageRole};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Error code when the run did not finish within the polling budget
pub const POLL_TIMEOUT_CODE: &str = "timeout";

/// Error code when the provider reported the run as failed
pub const RUN_FAILED_CODE: &str = "run_failed";

/// Bounded polling: fixed interval, fixed attempt count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 60,
        }
    }
}

/// Provider backed by the OpenAI Assistants API.
///
/// The stored assistant is taken from the `assistant_id` parameter, or the
/// provider's default when absent.
#[derive(Debug)]
pub struct OpenAiAssistantsProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    default_assistant_id: Option<String>,
    poll: PollConfig,
}

impl<C: HttpClientTrait> OpenAiAssistantsProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_OPENAI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            auth_header: format!("Bearer {}", api_key.into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_assistant_id: None,
            poll: PollConfig::default(),
        }
    }

    pub fn with_default_assistant(mut self, assistant_id: impl Into<String>) -> Self {
        self.default_assistant_id = Some(assistant_id.into());
        self
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
            ("OpenAI-Beta", "assistants=v2"),
        ]
    }

    fn error(&self, message: impl Into<String>) -> DomainError {
        DomainError::provider(self.provider_name(), message)
    }

    fn build_run_request(
        &self,
        messages: &[Message],
        parameters: &ChatParameters,
    ) -> Result<Value, DomainError> {
        let mut body: Map<String, Value> = parameters.clone();

        let assistant_id = body
            .remove("assistant_id")
            .and_then(|v| v.as_str().map(str::to_string))
            .or_else(|| self.default_assistant_id.clone())
            .ok_or_else(|| {
                DomainError::configuration("OpenAI Assistants request requires an assistant_id")
            })?;

        let instructions: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content_text())
            .collect();

        let thread_messages: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
            .collect();

        // The thread API has no max_tokens; the run takes a completion budget
        if let Some(max_tokens) = body.remove("max_tokens") {
            body.insert("max_completion_tokens".to_string(), max_tokens);
        }

        body.insert("assistant_id".to_string(), Value::String(assistant_id));
        body.insert("thread".to_string(), json!({"messages": thread_messages}));
        if !instructions.is_empty() {
            body.insert(
                "additional_instructions".to_string(),
                Value::String(instructions.join("\n")),
            );
        }

        Ok(Value::Object(body))
    }

    /// Poll the run until it reaches a terminal status
    async fn wait_for_run(&self, thread_id: &str, run_id: &str) -> Result<Value, DomainError> {
        let url = format!("{}/v1/threads/{}/runs/{}", self.base_url, thread_id, run_id);

        for attempt in 1..=self.poll.max_attempts {
            let run = self
                .client
                .get_json(&url, self.headers())
                .await
                .map_err(|e| e.for_provider(self.provider_name()))?;

            let status = run.get("status").and_then(|s| s.as_str()).unwrap_or("unknown");
            debug!(run_id = %run_id, attempt, status = %status, "Polled assistant run");

            match status {
                "completed" => return Ok(run),
                "failed" | "cancelled" | "expired" | "incomplete" | "requires_action" => {
                    let message = run
                        .get("last_error")
                        .and_then(|e| e.get("message"))
                        .and_then(|m| m.as_str())
                        .unwrap_or("no error details");

                    return Err(DomainError::provider_with_code(
                        self.provider_name(),
                        format!("Run {} ended with status '{}': {}", run_id, status, message),
                        RUN_FAILED_CODE,
                        None,
                    ));
                }
                _ => {}
            }

            if attempt < self.poll.max_attempts {
                tokio::time::sleep(self.poll.interval).await;
            }
        }

        warn!(
            run_id = %run_id,
            attempts = self.poll.max_attempts,
            "Assistant run did not finish in time"
        );

        Err(DomainError::provider_with_code(
            self.provider_name(),
            format!(
                "Run {} did not complete after {} polling attempts",
                run_id, self.poll.max_attempts
            ),
            POLL_TIMEOUT_CODE,
            None,
        ))
    }
}

#[async_trait]
impl<C: HttpClientTrait> ChatProvider for OpenAiAssistantsProvider<C> {
    async fn chat_completion(
        &self,
        messages: &[Message],
        parameters: &ChatParameters,
    ) -> Result<Value, DomainError> {
        let body = self.build_run_request(messages, parameters)?;
        let create_url = format!("{}/v1/threads/runs", self.base_url);

        let run = self
            .client
            .post_json(&create_url, self.headers(), &body)
            .await
            .map_err(|e| e.for_provider(self.provider_name()))?;

        let thread_id = run
            .get("thread_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| self.error("Run response has no thread_id"))?;
        let run_id = run
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| self.error("Run response has no id"))?;

        let run = self.wait_for_run(thread_id, run_id).await?;

        let messages_url = format!(
            "{}/v1/threads/{}/messages?order=desc&limit=1",
            self.base_url, thread_id
        );
        let messages = self
            .client
            .get_json(&messages_url, self.headers())
            .await
            .map_err(|e| e.for_provider(self.provider_name()))?;

        Ok(json!({
            "run": run,
            "messages": messages,
            "usage": run.get("usage").cloned().unwrap_or(Value::Null),
        }))
    }

    fn extract_content(&self, raw: &Value) -> Option<String> {
        let message = raw.get("messages")?.get("data")?.as_array()?.iter().find(|m| {
            m.get("role").and_then(|r| r.as_str()) == Some("assistant")
        })?;

        let text: Vec<&str> = message
            .get("content")?
            .as_array()?
            .iter()
            .filter(|part| part.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|part| part.get("text")?.get("value")?.as_str())
            .collect();

        if text.is_empty() {
            None
        } else {
            Some(text.join("\n"))
        }
    }

    fn provider_name(&self) -> &'static str {
        "openai_assistants"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Usage;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;

    const BASE: &str = "https://api.openai.com";

    fn fast_poll(max_attempts: u32) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(0),
            max_attempts,
        }
    }

    fn run(status: &str) -> Value {
        json!({
            "id": "run_1",
            "thread_id": "thread_1",
            "status": status,
            "usage": {"prompt_tokens": 30, "completion_tokens": 12, "total_tokens": 42}
        })
    }

    fn params() -> ChatParameters {
        let mut params = ChatParameters::new();
        params.insert("assistant_id".to_string(), json!("asst_abc"));
        params
    }

    fn run_url() -> String {
        format!("{}/v1/threads/thread_1/runs/run_1", BASE)
    }

    fn messages_url() -> String {
        format!("{}/v1/threads/thread_1/messages?order=desc&limit=1", BASE)
    }

    #[tokio::test]
    async fn test_polls_until_completed() {
        let client = MockHttpClient::new()
            .with_response(format!("{}/v1/threads/runs", BASE), run("queued"))
            .with_get_response(run_url(), run("queued"))
            .with_get_response(run_url(), run("in_progress"))
            .with_get_response(run_url(), run("completed"))
            .with_get_response(
                messages_url(),
                json!({"data": [{
                    "role": "assistant",
                    "content": [{"type": "text", "text": {"value": "{\"score\": 8}", "annotations": []}}]
                }]}),
            );

        let provider = OpenAiAssistantsProvider::new(client, "k").with_poll_config(fast_poll(5));

        let raw = provider
            .chat_completion(&[Message::system("be brief"), Message::user("Rate it")], &params())
            .await
            .unwrap();

        assert_eq!(provider.extract_content(&raw).as_deref(), Some("{\"score\": 8}"));
        assert_eq!(provider.extract_usage(&raw), Some(Usage::new(30, 12)));
        assert_eq!(provider.client.request_count(&format!("GET {}", run_url())), 3);

        let (_, body) = &provider.client.requests()[0];
        let body = body.as_ref().unwrap();
        assert_eq!(body["assistant_id"], json!("asst_abc"));
        assert_eq!(body["additional_instructions"], json!("be brief"));
        assert_eq!(body["thread"]["messages"][0]["content"], json!("Rate it"));
    }

    #[tokio::test]
    async fn test_exhausted_attempts_is_timeout() {
        let client = MockHttpClient::new()
            .with_response(format!("{}/v1/threads/runs", BASE), run("queued"))
            .with_get_response(run_url(), run("in_progress"));

        let provider = OpenAiAssistantsProvider::new(client, "k").with_poll_config(fast_poll(3));

        let err = provider
            .chat_completion(&[Message::user("x")], &params())
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), Some(POLL_TIMEOUT_CODE));
        assert_eq!(provider.client.request_count(&format!("GET {}", run_url())), 3);
    }

    #[tokio::test]
    async fn test_failed_run_is_distinct_from_timeout() {
        let mut failed = run("failed");
        failed["last_error"] = json!({"code": "server_error", "message": "boom"});

        let client = MockHttpClient::new()
            .with_response(format!("{}/v1/threads/runs", BASE), run("queued"))
            .with_get_response(run_url(), failed);

        let provider = OpenAiAssistantsProvider::new(client, "k").with_poll_config(fast_poll(3));

        let err = provider
            .chat_completion(&[Message::user("x")], &params())
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), Some(RUN_FAILED_CODE));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_assistant_id_required() {
        let provider = OpenAiAssistantsProvider::new(MockHttpClient::new(), "k");
        let err = provider
            .chat_completion(&[Message::user("x")], &ChatParameters::new())
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Configuration { .. }));
    }

    #[test]
    fn test_default_assistant_and_token_budget() {
        let provider =
            OpenAiAssistantsProvider::new(MockHttpClient::new(), "k").with_default_assistant("asst_default");

        let mut parameters = ChatParameters::new();
        parameters.insert("max_tokens".to_string(), json!(300));

        let body = provider
            .build_run_request(&[Message::user("x")], &parameters)
            .unwrap();

        assert_eq!(body["assistant_id"], json!("asst_default"));
        assert_eq!(body["max_completion_tokens"], json!(300));
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("additional_instructions").is_none());
    }
}
