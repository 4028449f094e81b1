//! LLM provider implementations

mod anthropic;
mod assistants;
mod factory;
mod http_client;
mod openai;

pub use anthropic::AnthropicProvider;
pub use assistants::{OpenAiAssistantsProvider, PollConfig, POLL_TIMEOUT_CODE, RUN_FAILED_CODE};
pub use factory::{LlmProviderFactory, ANTHROPIC, OPENAI, OPENAI_ASSISTANTS};
pub use http_client::{HttpClient, HttpClientTrait, TIMEOUT_ERROR_CODE};
pub use openai::OpenAiProvider;
