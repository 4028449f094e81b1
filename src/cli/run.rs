//! Run command - executes a workflow definition against an input context

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::load_document;
use crate::domain::workflow::ServiceRegistry;
use crate::domain::{
    AssistantConfig, DefaultTemplateRenderer, ExecutionContext, LegacyContextAdapter,
    ProviderResolver, RunOptions, StepExecutionResult, Term, Workflow, WorkflowExecutor,
    WorkflowResult,
};
use crate::infrastructure::action::InMemoryEntityMutator;
use crate::infrastructure::assistant::{DefaultAssistantExecutor, InMemoryAssistantRepository};
use crate::infrastructure::llm::LlmProviderFactory;
use crate::infrastructure::taxonomy::InMemoryTermLookup;
use crate::infrastructure::workflow::{
    default_registry, provide_entity_mutator, provide_term_lookup, PipelineRunner,
};

/// Arguments for the run command
#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Workflow definition file (JSON or TOML)
    pub workflow: PathBuf,

    /// Initial context data; flat legacy keys such as `post_title` are accepted
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Managed assistant definitions
    #[arg(long)]
    pub assistants: Option<PathBuf>,

    /// Known taxonomy terms for taxonomy resolution steps
    #[arg(long)]
    pub terms: Option<PathBuf>,

    /// Run against this post; without it the context is virtual
    #[arg(long)]
    pub post_id: Option<u64>,

    /// Generate actions without applying them
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the steps before this one
    #[arg(long, conflicts_with = "step")]
    pub start_at: Option<String>,

    /// Execute only this step
    #[arg(long)]
    pub step: Option<String>,
}

/// Term entry in a terms file; the slug is derived from the name
#[derive(Debug, Clone, Deserialize)]
struct TermEntry {
    id: u64,
    taxonomy: String,
    name: String,
}

/// Everything a run needs, already loaded
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub workflow: Workflow,
    pub data: Value,
    pub assistants: Vec<AssistantConfig>,
    pub terms: Vec<Term>,
    pub post_id: Option<u64>,
    pub options: RunOptions,
    pub step: Option<String>,
}

/// What the command prints
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<WorkflowResult>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<StepExecutionResult>,

    /// Post document after the run, for entity runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<Value>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.result.as_ref().map(|r| r.success).unwrap_or(true)
            && self.step.as_ref().map(|s| !s.is_failed()).unwrap_or(true)
    }
}

/// Run the command
pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();

    let resolver = LlmProviderFactory::build_resolver(&config.providers, &config.http, &config.polling)?;
    let inputs = load_inputs(&args)?;

    let report = execute(inputs, Arc::new(resolver)).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.succeeded() {
        bail!("workflow run failed");
    }
    Ok(())
}

fn load_inputs(args: &RunArgs) -> anyhow::Result<RunInputs> {
    let workflow: Workflow = load_document(&args.workflow)?;

    let data = match &args.input {
        Some(path) => load_document(path)?,
        None => json!({}),
    };

    let assistants = match &args.assistants {
        Some(path) => load_document(path)?,
        None => Vec::new(),
    };

    let terms = match &args.terms {
        Some(path) => load_document::<Vec<TermEntry>>(path)?
            .into_iter()
            .map(|t| Term::new(t.id, t.taxonomy, t.name))
            .collect(),
        None => Vec::new(),
    };

    let mut options = RunOptions {
        dry_run: args.dry_run,
        start_at: None,
    };
    if let Some(start_at) = &args.start_at {
        options = options.with_start_at(start_at);
    }

    Ok(RunInputs {
        workflow,
        data,
        assistants,
        terms,
        post_id: args.post_id,
        options,
        step: args.step.clone(),
    })
}

/// Wire the in-memory collaborators and run the workflow
pub async fn execute(
    inputs: RunInputs,
    resolver: Arc<dyn ProviderResolver>,
) -> anyhow::Result<RunReport> {
    let workflow = inputs.workflow;

    let repository = InMemoryAssistantRepository::with_assistants(inputs.assistants)?;
    let executor = Arc::new(DefaultAssistantExecutor::new(
        Arc::new(repository),
        resolver,
        Arc::new(DefaultTemplateRenderer::new()),
    ));
    let runner = PipelineRunner::new(default_registry(executor));

    let data = match &inputs.data {
        Value::Object(map) => LegacyContextAdapter::from_legacy(map),
        Value::Null => json!({}),
        other => bail!("input must be an object, got {}", other),
    };

    let mutator = Arc::new(InMemoryEntityMutator::new());
    let mut services = ServiceRegistry::new();
    provide_entity_mutator(&mut services, mutator.clone());
    provide_term_lookup(&mut services, Arc::new(InMemoryTermLookup::with_terms(inputs.terms)));

    let context = match inputs.post_id {
        Some(post_id) => {
            mutator.insert_post(post_id, data.clone()).await;
            ExecutionContext::for_entity(post_id, data)
        }
        None => ExecutionContext::virtual_context(data),
    }
    .with_services(services);

    info!(
        workflow_id = %workflow.id(),
        post_id = ?inputs.post_id,
        dry_run = inputs.options.dry_run,
        "Running workflow"
    );

    let mut report = RunReport {
        result: None,
        step: None,
        entity: None,
    };

    match &inputs.step {
        Some(step_id) => {
            let mut context = context.with_dry_run(inputs.options.dry_run);
            report.step = Some(runner.execute_step(&workflow, step_id, &mut context).await?);
        }
        None => {
            report.result = Some(runner.execute(&workflow, context, inputs.options).await?);
        }
    }

    if let Some(post_id) = inputs.post_id {
        report.entity = mutator.snapshot(post_id).await;
    }

    Ok(report)
}
