//! Infrastructure layer - Provider adapters, runners and in-memory stores

pub mod action;
pub mod assistant;
pub mod llm;
pub mod logging;
pub mod taxonomy;
pub mod translation;
pub mod workflow;
