//! Brity Relay account store CLI
//!
//! Thin front-end over `AccountService`: every command is one store operation,
//! results are printed as JSON on stdout and logs go to stderr.

mod cli;

use std::process::ExitCode;

use anyhow::Context;
use brity_relay_core::validation::parse_candidate;
use brity_relay_core::{AccountService, CoreError};
use clap::Parser;
use cli::{Cli, Commands};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.store_config();
    tracing::debug!("Using accounts file {:?}", config.path);
    let service = AccountService::from_config(config);

    match run(&service, cli.command).await {
        Ok(output) => {
            println!("{output:#}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            if let Some(body) = error_body(&e) {
                eprintln!("{body}");
            }
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(service: &AccountService, command: Commands) -> anyhow::Result<Value> {
    let output = match command {
        Commands::List => serde_json::to_value(service.list_accounts().await?)?,
        Commands::Summaries => serde_json::to_value(service.list_summaries().await?)?,
        Commands::Get { account_id } => {
            serde_json::to_value(service.get_account(&account_id).await?)?
        }
        Commands::Create { candidate } => {
            let candidate = read_candidate(&candidate)?;
            serde_json::to_value(service.create_account_from_candidate(&candidate).await?)?
        }
        Commands::Update {
            account_id,
            candidate,
        } => {
            let candidate = read_candidate(&candidate)?;
            serde_json::to_value(
                service
                    .update_account_from_candidate(&account_id, &candidate)
                    .await?,
            )?
        }
        Commands::Delete { account_id } => {
            serde_json::to_value(service.delete_account(&account_id).await?)?
        }
        Commands::Select { account_id } => {
            serde_json::to_value(service.select_account(&account_id).await?)?
        }
        Commands::Deselect { account_id } => {
            serde_json::to_value(service.deselect_account(&account_id).await?)?
        }
        Commands::Resolve { account_id, sender } => serde_json::to_value(
            service
                .resolve_sender(account_id.as_deref(), sender.as_deref())
                .await?,
        )?,
    };
    Ok(output)
}

/// Machine-readable form of a store error, tagged by `code`.
fn error_body(err: &anyhow::Error) -> Option<Value> {
    err.downcast_ref::<CoreError>()
        .and_then(|core| serde_json::to_value(core).ok())
}

/// Inline JSON, or `@path` to read it from a file.
fn read_candidate(arg: &str) -> anyhow::Result<Value> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read candidate file {path}"))?,
        None => arg.to_string(),
    };
    Ok(parse_candidate(&text)?)
}
