// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Init command - create a starter workflow and profiles skeleton

use colored::Colorize;
use miette::Result;
use std::path::Path;

/// Run the init command
pub async fn run(name: Option<String>, force: bool, verbose: bool) -> Result<()> {
    let workflow_name = name.unwrap_or_else(|| {
        std::env::current_dir()
            .ok()
            .and_then(|p| p.file_name().map(|s| s.to_string_lossy().to_string()))
            .unwrap_or_else(|| "connectivity".to_string())
    });

    println!("{}", "Initializing smokeflow workflow...".bold());
    println!();

    // Check if .smokeflow.yaml already exists
    if Path::new(".smokeflow.yaml").exists() && !force {
        return Err(miette::miette!(
            ".smokeflow.yaml already exists. Use --force to overwrite."
        ));
    }

    let workflow_content = generate_workflow_template(&workflow_name);

    std::fs::write(".smokeflow.yaml", &workflow_content)
        .map_err(|e| miette::miette!("Failed to write .smokeflow.yaml: {}", e))?;

    println!("  {} Created .smokeflow.yaml", "✓".green());

    // Profiles skeleton next to the workflow; never overwritten silently
    if !Path::new("profiles.toml").exists() || force {
        std::fs::write("profiles.toml", PROFILES_TEMPLATE)
            .map_err(|e| miette::miette!("Failed to write profiles.toml: {}", e))?;
        println!("  {} Created profiles.toml", "✓".green());
    }

    println!();
    println!("{}", "Workflow initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} with your bucket, project, and table", ".smokeflow.yaml".cyan());
    println!("  2. Fill in {} and export the referenced variables", "profiles.toml".cyan());
    println!("  3. Run {} to verify the configuration", "smokeflow validate".cyan());
    println!("  4. Run {} to execute the checks", "smokeflow run --profiles profiles.toml".cyan());
    println!();

    if verbose {
        println!("{}", "Generated workflow:".dimmed());
        println!("{}", "─".repeat(50).dimmed());
        println!("{}", workflow_content.dimmed());
    }

    Ok(())
}

fn generate_workflow_template(name: &str) -> String {
    format!(
        r#"# smokeflow workflow configuration
# Five checks, run strictly in order; the first failure halts the chain.

version: "1"
name: "{name}"
description: "Verify warehouse, object store, and query engine credentials"
tags: ["test", "infra"]

checks:
  - name: "warehouse"
    description: "Warehouse reachability"
    profile: "snowflake_default"
    target:
      type: warehouse_ping
      sql: "SELECT 1"

  - name: "bucket"
    description: "Object-store write access"
    profile: "gcs_default"
    target:
      type: object_store_upload
      bucket: "demo-bucket"                      # adjust
      key: "tmp/airflow_connection_test.txt"
      payload: "airflow connection test"

  - name: "query-job"
    description: "Asynchronous query job"
    profile: "google_cloud_default"
    target:
      type: query_job
      sql: "SELECT 1 AS ok"
      project: "demo-project"                    # adjust
      location: "US"

  - name: "provision-table"
    description: "Idempotent table creation"
    profile: "google_cloud_default"
    target:
      type: create_table
      table:
        project: "demo-project"                  # adjust
        dataset: "demo_dataset"
        table: "customer_data"
      columns:
        - name: "customer_id"
          kind: int64
        - name: "name"
          kind: string
        - name: "email"
          kind: string
        - name: "created_at"
          kind: timestamp
          default_now: true

  - name: "insert-rows"
    description: "Bulk insert into the provisioned table"
    profile: "google_cloud_default"
    depends_on:
      - "provision-table"
    target:
      type: insert_rows
      table:
        project: "demo-project"                  # adjust
        dataset: "demo_dataset"
        table: "customer_data"
      rows:
        - customer_id: 1
          name: "John Doe"
          email: "john@example.com"
        - customer_id: 2
          name: "Jane Smith"
          email: "jane@example.com"
"#
    )
}

const PROFILES_TEMPLATE: &str = r#"# smokeflow connection profiles
# Secrets may be inline or indirected through environment variables.

[profiles.snowflake_default]
kind = "warehouse"
account = "xy12345"            # adjust
user = "SMOKE"                 # adjust
token_env = "SNOWFLAKE_TOKEN"
# warehouse = "COMPUTE_WH"
# role = "SYSADMIN"

[profiles.gcs_default]
kind = "object_store"
provider = "gcs"
credential_env = "GOOGLE_APPLICATION_CREDENTIALS"

[profiles.google_cloud_default]
kind = "query_engine"
token_env = "GOOGLE_OAUTH_TOKEN"
# poll_interval_ms = 1000
# max_poll_secs = 300
"#;
