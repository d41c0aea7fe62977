// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! smokeflow - Connectivity Smoke Tests
//!
//! Verify warehouse, object store, and query engine credentials.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use smokeflow::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smokeflow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    // Dispatch to command handlers
    match cli.command {
        Commands::Init { name, force } => smokeflow::cli::init::run(name, force, cli.verbose).await,
        Commands::Run {
            workflow,
            profiles,
            check,
            dry_run,
        } => smokeflow::cli::run::run(workflow, profiles, check, dry_run, cli.verbose).await,
        Commands::Validate { workflow } => {
            smokeflow::cli::validate::run(workflow, cli.verbose).await
        }
        Commands::Plan { workflow, format } => {
            smokeflow::cli::plan::run(workflow, format, cli.verbose).await
        }
        Commands::Profiles { action } => smokeflow::cli::profiles::run(action, cli.verbose).await,
    }
}
