//! Assistant domain - stored prompt/provider bundles and their execution contract

mod entity;
mod executor;
mod repository;

pub use entity::{ApiParameters, AssistantConfig, ExpectedFormat};
pub use executor::{AssistantExecutor, AssistantSource, ExecutorResult};
pub use repository::AssistantRepository;

#[cfg(test)]
pub use executor::MockAssistantExecutor;
#[cfg(test)]
pub use repository::MockAssistantRepository;
