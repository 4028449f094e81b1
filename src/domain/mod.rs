//! Domain layer - Core business logic and entities

pub mod action;
pub mod assistant;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod response;
pub mod taxonomy;
pub mod translation;
pub mod workflow;

pub use action::{apply_actions, generate_actions, Action, ActionOutcome, ActionTarget, EntityMutator};
pub use assistant::{
    ApiParameters, AssistantConfig, AssistantExecutor, AssistantRepository, AssistantSource,
    ExecutorResult, ExpectedFormat,
};
pub use error::DomainError;
pub use llm::{
    ChatParameters, ChatProvider, Message, MessageRole, ProviderResolver, RegistryProviderResolver,
    StaticProviderResolver, Usage,
};
pub use prompt::{extract_variables, DefaultTemplateRenderer, TemplateRenderer};
pub use response::{
    extract_json_object, get_nested_value, parse_with_schema, ExtractionMethod, FieldMapping,
    FieldType, ParseResult, Schema, SchemaField,
};
pub use taxonomy::{Term, TermLookup};
pub use translation::{LanguagePair, RoutingRule, TranslationPath, TranslationPathResolver, Translator};
pub use workflow::{
    ExecutionContext, LegacyContextAdapter, OnErrorAction, RunOptions, Step, StepConfig,
    StepExecutionResult, StepKind, StepRegistry, Workflow, WorkflowError, WorkflowExecutor,
    WorkflowId, WorkflowRepository, WorkflowResult, WorkflowTriggers,
};
