//! Assistant infrastructure implementations

mod executor;
mod in_memory_repository;

pub use executor::DefaultAssistantExecutor;
pub use in_memory_repository::InMemoryAssistantRepository;
