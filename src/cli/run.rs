// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Run command - execute the connectivity checks

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::probes::create_probes;
use crate::profiles::ProfileStore;
use crate::workflow::{RunOptions, Workflow, WorkflowRunner, WorkflowValidator};

/// Run the workflow
pub async fn run(
    workflow_path: PathBuf,
    profiles_path: Option<PathBuf>,
    checks: Vec<String>,
    dry_run: bool,
    verbose: bool,
) -> Result<()> {
    // Check workflow exists
    if !workflow_path.exists() {
        return Err(miette::miette!(
            "Workflow file not found: {}\n\n\
             Run 'smokeflow init' to create one.",
            workflow_path.display()
        ));
    }

    // Load workflow
    let workflow = Workflow::from_file(&workflow_path)
        .map_err(|e| miette::miette!("Failed to load workflow: {}", e))?;

    // Validate workflow
    let validation = WorkflowValidator::validate(&workflow)?;

    if !validation.is_valid() {
        eprintln!("{}", "Workflow validation failed:".red().bold());
        for error in &validation.errors {
            eprintln!("  {} {}", "✗".red(), error);
        }
        return Err(miette::miette!("Workflow configuration is invalid"));
    }

    if validation.has_warnings() && verbose {
        eprintln!("{}", "Workflow warnings:".yellow().bold());
        for warning in &validation.warnings {
            eprintln!("  {} {}", "⚠".yellow(), warning);
        }
        eprintln!();
    }

    // Create runner
    let mut runner = WorkflowRunner::new();

    // A dry run never resolves profiles; it must work before credentials do
    if !dry_run {
        let profiles_path = profiles_path.unwrap_or_else(ProfileStore::default_path);
        let profiles = ProfileStore::from_file(&profiles_path)?;

        for (name, probe) in create_probes(&workflow, &profiles)? {
            runner.register_probe(&name, probe);
        }
    }

    // Create execution options
    let options = RunOptions {
        dry_run,
        checks,
        verbose,
    };

    // Execute
    let report = runner.execute(&workflow, &options).await?;

    if let Some(failure) = report.failure {
        // The failing check's error is the diagnostic; surface it unmodified
        return Err(failure.into());
    }

    Ok(())
}
