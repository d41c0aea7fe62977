// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Plan command - show the execution chain without touching the network

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::PlanFormat;
use crate::workflow::{ChainBuilder, Workflow};

/// Run the plan command
pub async fn run(workflow_path: PathBuf, format: PlanFormat, _verbose: bool) -> Result<()> {
    if !workflow_path.exists() {
        return Err(miette::miette!(
            "Workflow file not found: {}\n\n\
             Run 'smokeflow init' to create one.",
            workflow_path.display()
        ));
    }

    let workflow = Workflow::from_file(&workflow_path)
        .map_err(|e| miette::miette!("Failed to load workflow: {}", e))?;

    let chain = ChainBuilder::build(&workflow)?;

    match format {
        PlanFormat::Text => {
            println!("{}: {}", "Workflow".bold(), workflow.name);
            if let Some(ref description) = workflow.description {
                println!("{}", description.dimmed());
            }
            println!();
            print!("{}", chain.to_text(&workflow)?);
        }
        PlanFormat::Mermaid => {
            print!("{}", chain.to_mermaid(&workflow)?);
        }
    }

    Ok(())
}
