//! Workflow error types

use thiserror::Error;

use crate::domain::DomainError;

/// Errors that can occur during workflow operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorkflowError {
    #[error("Workflow not found: {0}")]
    NotFound(String),

    #[error("Step not found: {0}")]
    StepNotFound(String),

    #[error("Step execution failed in '{step}': {message}")]
    StepExecution { step: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid step configuration for '{step}': {}", errors.join("; "))]
    InvalidStepConfig { step: String, errors: Vec<String> },

    #[error("Unsupported step type '{step_type}' in step '{step}'")]
    UnsupportedStep { step: String, step_type: String },

    #[error("Workflow is disabled: {0}")]
    Disabled(String),

    #[error("Workflow has no steps: {0}")]
    EmptyWorkflow(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl WorkflowError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn step_not_found(id: impl Into<String>) -> Self {
        Self::StepNotFound(id.into())
    }

    pub fn step_execution(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StepExecution {
            step: step.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn invalid_step_config(step: impl Into<String>, errors: Vec<String>) -> Self {
        Self::InvalidStepConfig {
            step: step.into(),
            errors,
        }
    }

    pub fn unsupported_step(step: impl Into<String>, step_type: impl Into<String>) -> Self {
        Self::UnsupportedStep {
            step: step.into(),
            step_type: step_type.into(),
        }
    }

    pub fn disabled(id: impl Into<String>) -> Self {
        Self::Disabled(id.into())
    }

    pub fn empty_workflow(id: impl Into<String>) -> Self {
        Self::EmptyWorkflow(id.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }
}
