//! Workflow infrastructure: the pipeline runner, step implementations,
//! storage and triggers

mod executor_impl;
mod in_memory_repository;
pub mod steps;
mod trigger;

pub use executor_impl::{PipelineRunner, STEP_DISABLED};
pub use in_memory_repository::InMemoryWorkflowRepository;
pub use steps::{
    default_registry, provide_entity_mutator, provide_term_lookup, AiAssistantStep,
    ManagedAssistantStep, TaxonomyResolutionStep, ACTIONS_KEY, ENTITY_MUTATOR_SERVICE,
    TERM_LOOKUP_SERVICE, WARNINGS_KEY,
};
pub use trigger::{
    ContextFactory, DefaultContextFactory, TranslationCompletedEvent, WorkflowTriggerService,
};

#[cfg(test)]
pub use trigger::MockContextFactory;
