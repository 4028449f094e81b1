//! CLI module for the content pipeline
//!
//! Subcommands:
//! - `run`: execute a workflow definition against an input context
//! - `parse`: parse a model response against a schema
//! - `route`: show how a language pair is translated
//! - `translate`: translate text along the configured route

mod files;
pub mod parse;
pub mod route;
pub mod run;
pub mod translate;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

pub use files::{load_document, parse_document, DocumentFormat};

/// Content pipeline - AI assistant workflows for posts and translations
#[derive(Parser)]
#[command(name = "content-pipeline")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Execute a workflow definition
    Run(run::RunArgs),

    /// Parse a model response against a schema
    Parse(parse::ParseArgs),

    /// Resolve the translation path for a language pair
    Route(route::RouteArgs),

    /// Translate text with the configured translation assistants
    Translate(translate::TranslateArgs),
}

/// Load `.env`, the layered configuration and the log subscriber
pub fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);
    config
}
