//! Workflow domain
//!
//! Workflows are ordered lists of steps that read and write a shared
//! [`ExecutionContext`]. The runner itself lives in the infrastructure layer.

mod context;
mod entity;
mod error;
mod executor;
mod legacy;
mod repository;
mod step;

pub use context::{ContextSource, ExecutionContext, ServiceRegistry, STEP_OUTPUTS_KEY};
pub use entity::{
    validate_identifier, OnErrorAction, StepConfig, Workflow, WorkflowId, WorkflowTriggers,
    MAX_ID_LENGTH,
};
pub use error::WorkflowError;
pub use executor::{RunOptions, StepExecutionResult, StepStatus, WorkflowExecutor, WorkflowResult};
pub use legacy::LegacyContextAdapter;
pub use repository::WorkflowRepository;
pub use step::{eligibility, Step, StepKind, StepRegistry};

#[cfg(test)]
pub use repository::MockWorkflowRepository;
#[cfg(test)]
pub use step::mock::MockStep;
