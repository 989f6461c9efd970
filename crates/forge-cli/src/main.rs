use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use forge_cli::cli::{Cli, Commands};
use forge_cli::commands;
use forge_cli::fetch::default_providers;
use forge_cli::logging;
use forge_core::{OutputFormat, Reporter};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Bake(args) => {
            let format = if args.json { OutputFormat::Json } else { OutputFormat::Text };
            let reporter = Arc::new(Reporter::stdout(format));
            reporter.install_panic_hook();

            let cancel = CancellationToken::new();
            let trigger = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("interrupt received, cancelling run");
                    trigger.cancel();
                }
            });

            let outcomes = commands::bake::execute(&args, &default_providers(), &reporter, cancel)
                .await
                .with_context(|| format!("bake of {} failed", args.repo))?;
            tracing::info!(recipes = outcomes.len(), "bake finished");
            Ok(())
        }
    }
}
