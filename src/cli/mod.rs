// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for smokeflow.

pub mod init;
pub mod plan;
pub mod profiles;
pub mod run;
pub mod validate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Connectivity smoke-test workflow
///
/// Verify warehouse, object-store, and query-engine credentials with one
/// linear chain of checks.
#[derive(Parser, Debug)]
#[clap(
    name = "smokeflow",
    version,
    about = "Connectivity smoke tests for warehouse, object store, and query engine credentials",
    long_about = None,
    after_help = "Examples:\n\
        smokeflow init                  Write a starter workflow and profiles file\n\
        smokeflow validate              Check the workflow file without going near the network\n\
        smokeflow run                   Execute the connectivity checks\n\
        smokeflow profiles list         Show configured connection profiles\n\n\
        See 'smokeflow <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a starter workflow and profiles skeleton
    Init {
        /// Workflow name (defaults to current directory name)
        name: Option<String>,

        /// Overwrite existing files
        #[clap(long)]
        force: bool,
    },

    /// Run the connectivity checks
    Run {
        /// Workflow file
        #[clap(short, long, default_value = ".smokeflow.yaml")]
        workflow: PathBuf,

        /// Profiles file (default: $SMOKEFLOW_PROFILES or the user config dir)
        #[clap(short, long)]
        profiles: Option<PathBuf>,

        /// Run only specific checks (chain order is preserved)
        #[clap(short, long)]
        check: Vec<String>,

        /// Dry run (show the plan, touch nothing)
        #[clap(long)]
        dry_run: bool,
    },

    /// Validate workflow configuration
    Validate {
        /// Workflow file to validate
        #[clap(default_value = ".smokeflow.yaml")]
        workflow: PathBuf,
    },

    /// Show the execution chain
    Plan {
        /// Workflow file
        #[clap(default_value = ".smokeflow.yaml")]
        workflow: PathBuf,

        /// Output format
        #[clap(short, long, value_enum, default_value_t = PlanFormat::Text)]
        format: PlanFormat,
    },

    /// Connection profile management
    Profiles {
        #[clap(subcommand)]
        action: ProfilesAction,
    },
}

/// Profile management actions
#[derive(Subcommand, Debug, Clone)]
pub enum ProfilesAction {
    /// List configured profiles (names and kinds, never secrets)
    List {
        /// Profiles file (default: $SMOKEFLOW_PROFILES or the user config dir)
        #[clap(short, long)]
        profiles: Option<PathBuf>,
    },

    /// Check that a profile resolves, including env-indirected secrets
    Check {
        /// Profile name
        name: String,

        /// Profiles file (default: $SMOKEFLOW_PROFILES or the user config dir)
        #[clap(short, long)]
        profiles: Option<PathBuf>,
    },
}

/// Plan output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PlanFormat {
    Text,
    Mermaid,
}
