//! ark-reconciler CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use ark_reconciler::cli::{commands, handle_error, load_config, Cli, Commands};
use ark_reconciler::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli.command, cli.config.as_deref(), cli.json).await {
        Ok(code) => code,
        Err(err) => {
            handle_error(&err, cli.json);
            ExitCode::FAILURE
        }
    }
}

async fn run(
    command: Commands,
    config_path: Option<&std::path::Path>,
    json_mode: bool,
) -> anyhow::Result<ExitCode> {
    let config = load_config(config_path)?;
    let _logger = LoggerImpl::init(&LogConfig::try_from(&config.logging)?)?;

    match command {
        Commands::Reconcile(args) => commands::reconcile::execute(args, &config, json_mode).await,
        Commands::List(args) => {
            commands::list::execute(args, &config, json_mode).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
