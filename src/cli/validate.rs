// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Validate command - check workflow configuration

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::workflow::{Workflow, WorkflowValidator};

/// Run the validate command
pub async fn run(workflow_path: PathBuf, verbose: bool) -> Result<()> {
    println!("{}", "Validating workflow...".bold());
    println!();

    // Check workflow exists
    if !workflow_path.exists() {
        return Err(miette::miette!(
            "Workflow file not found: {}\n\n\
             Run 'smokeflow init' to create one.",
            workflow_path.display()
        ));
    }

    // Load workflow
    let workflow = match Workflow::from_file(&workflow_path) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("  {} Failed to parse workflow", "✗".red());
            eprintln!();
            return Err(miette::miette!("Parse error: {}", e));
        }
    };

    println!("  {} Workflow file is valid YAML", "✓".green());

    // Validate workflow structure
    let validation = WorkflowValidator::validate(&workflow)?;

    // Report results
    let mut has_issues = false;

    if !validation.errors.is_empty() {
        has_issues = true;
        println!();
        println!("{}:", "Errors".red().bold());
        for error in &validation.errors {
            println!("  {} {}", "✗".red(), error);
        }
    }

    if !validation.warnings.is_empty() {
        has_issues = true;
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &validation.warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
    }

    if verbose {
        println!();
        println!("{}:", "Workflow summary".bold());
        println!("  Name: {}", workflow.name);
        if !workflow.tags.is_empty() {
            println!("  Tags: {}", workflow.tags.join(", "));
        }
        println!("  Checks: {}", workflow.checks.len());
        for check in &workflow.checks {
            println!(
                "    - {} ({}){}",
                check.name,
                check.target_name(),
                format!(" [profile: {}]", check.profile).dimmed()
            );
        }
    }

    println!();

    if has_issues {
        if validation.is_valid() {
            println!("{}", "Workflow is valid but has warnings.".yellow().bold());
            Ok(())
        } else {
            Err(miette::miette!("Workflow validation failed"))
        }
    } else {
        println!("{}", "Workflow is valid!".green().bold());
        Ok(())
    }
}
