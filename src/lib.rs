//! Content pipeline
//!
//! Runs AI assistant workflows over posts and translations:
//! - Ordered step pipelines over a shared dot-path execution context
//! - Assistant execution against OpenAI, Anthropic and OpenAI assistants
//! - Schema-driven response parsing and post mutation actions
//! - Multi-hop translation routing

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
