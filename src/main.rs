use clap::Parser;
use content_pipeline::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => cli::run::run(args).await,
        Command::Parse(args) => cli::parse::run(args).await,
        Command::Route(args) => cli::route::run(args).await,
        Command::Translate(args) => cli::translate::run(args).await,
    }
}
