//! Translate command - translates text along the configured route

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use super::load_document;
use crate::domain::{AssistantConfig, DefaultTemplateRenderer, TranslationPathResolver};
use crate::infrastructure::assistant::{DefaultAssistantExecutor, InMemoryAssistantRepository};
use crate::infrastructure::llm::LlmProviderFactory;
use crate::infrastructure::translation::{AssistantTranslator, TranslationPathExecutor};

/// Arguments for the translate command
#[derive(Args, Clone, Debug)]
pub struct TranslateArgs {
    /// Source language code
    pub source: String,

    /// Target language code
    pub target: String,

    /// Text to translate
    pub text: String,

    /// Managed assistant definitions, referenced by `translation.assistants`
    #[arg(long)]
    pub assistants: Option<PathBuf>,
}

/// Run the command
pub async fn run(args: TranslateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();

    let assistants: Vec<AssistantConfig> = match &args.assistants {
        Some(path) => load_document(path)?,
        None => Vec::new(),
    };

    let resolver =
        LlmProviderFactory::build_resolver(&config.providers, &config.http, &config.polling)?;
    let executor = Arc::new(DefaultAssistantExecutor::new(
        Arc::new(InMemoryAssistantRepository::with_assistants(assistants)?),
        Arc::new(resolver),
        Arc::new(DefaultTemplateRenderer::new()),
    ));

    let translator = AssistantTranslator::new(executor, &config.translation.assistants);
    let paths = TranslationPathExecutor::new(
        TranslationPathResolver::new(&config.translation.languages, config.translation.rules.clone()),
        Arc::new(translator),
    );

    let outcome = paths.translate(&args.text, &args.source, &args.target).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
