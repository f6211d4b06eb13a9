// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::process::ExitCode;

fn run(cli: Cli) -> Result<()> {
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Options { formula } => commands::cmd_options(&formula),
        Commands::Plan {
            formula,
            selection,
            registry,
            prefix,
            json,
        } => commands::cmd_plan(&formula, &selection, &registry, &prefix, config, json),
        Commands::Cook {
            formula,
            source,
            prefix,
            selection,
            registry,
            timeout,
            keep_stage,
            doc_failure,
            sysconfdir,
            validate_only,
        } => commands::cmd_cook(commands::CookArgs {
            formula: &formula,
            source: &source,
            prefix: &prefix,
            selection: &selection,
            registry: &registry,
            config,
            timeout,
            keep_stage,
            doc_failure: doc_failure.as_deref(),
            sysconfdir,
            validate_only,
        }),
        Commands::Caveats { formula, prefix } => commands::cmd_caveats(&formula, &prefix),
        Commands::Test { formula, prefix } => commands::cmd_test(&formula, &prefix),
    }
}

fn main() -> ExitCode {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Name the failing stage when the library reported one
            if let Some(stage) = e
                .chain()
                .find_map(|cause| cause.downcast_ref::<saucier::Error>())
                .and_then(|err| err.stage())
            {
                eprintln!("[FAILED] stage: {}", stage);
            }
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
