// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Workflow validation
//!
//! Validates workflow configuration before any network call is made.

use std::collections::HashSet;

use crate::errors::SmokeflowError;
use crate::workflow::{ChainBuilder, Check, Target, Workflow};

/// Workflow validator
pub struct WorkflowValidator;

impl WorkflowValidator {
    /// Validate a workflow configuration
    pub fn validate(workflow: &Workflow) -> Result<ValidationResult, SmokeflowError> {
        let mut result = ValidationResult::new();

        // Check for empty workflow
        if workflow.checks.is_empty() {
            result.add_error("Workflow has no checks defined");
        }

        // Check for duplicate check names
        let mut seen_names = HashSet::new();
        for check in &workflow.checks {
            if !seen_names.insert(&check.name) {
                result.add_error(&format!("Duplicate check name: '{}'", check.name));
            }
        }

        // Validate chain structure (order conflicts, unknown dependencies)
        match ChainBuilder::build(workflow) {
            Ok(_) => {}
            Err(SmokeflowError::ChainOrderConflict { check, dependency }) => {
                result.add_error(&format!(
                    "Check '{}' depends on '{}', which is declared after it",
                    check, dependency
                ));
            }
            Err(SmokeflowError::UnknownDependency { check, dependency }) => {
                result.add_error(&format!(
                    "Check '{}' depends on unknown check '{}'",
                    check, dependency
                ));
            }
            Err(SmokeflowError::CircularDependency { checks }) => {
                result.add_error(&format!("Circular dependency: {}", checks.join(" → ")));
            }
            Err(e) => {
                result.add_error(&format!("Chain validation error: {}", e));
            }
        }

        // Validate each check
        for check in &workflow.checks {
            Self::validate_check(check, &mut result);
        }

        Ok(result)
    }

    /// Validate a single check
    fn validate_check(check: &Check, result: &mut ValidationResult) {
        if check.profile.is_empty() {
            result.add_error(&format!("Check '{}': profile name is empty", check.name));
        }

        match &check.target {
            Target::WarehousePing { sql } => {
                if sql.trim().is_empty() {
                    result.add_error(&format!("Check '{}': ping query is empty", check.name));
                }
            }

            Target::ObjectStoreUpload { bucket, key, payload } => {
                if bucket.is_empty() {
                    result.add_error(&format!("Check '{}': bucket is empty", check.name));
                }
                if key.is_empty() {
                    result.add_error(&format!("Check '{}': object key is empty", check.name));
                }
                if payload.is_empty() {
                    result.add_warning(&format!(
                        "Check '{}': empty payload - the write still proves access, \
                         but a marker string is easier to verify",
                        check.name
                    ));
                }
            }

            Target::QueryJob { sql, project, location, .. } => {
                if sql.trim().is_empty() {
                    result.add_error(&format!("Check '{}': job query is empty", check.name));
                }
                if project.is_empty() {
                    result.add_error(&format!("Check '{}': target project is empty", check.name));
                }
                if location.is_empty() {
                    result.add_error(&format!("Check '{}': target region is empty", check.name));
                }
            }

            Target::CreateTable { table, columns, location } => {
                Self::validate_table_ref(check, table, result);
                if location.is_empty() {
                    result.add_error(&format!("Check '{}': target region is empty", check.name));
                }
                if columns.is_empty() {
                    result.add_error(&format!("Check '{}': no columns defined", check.name));
                }

                let mut seen_columns = HashSet::new();
                for column in columns {
                    if column.name.is_empty() {
                        result.add_error(&format!("Check '{}': column name is empty", check.name));
                    }
                    if !seen_columns.insert(&column.name) {
                        result.add_error(&format!(
                            "Check '{}': duplicate column '{}'",
                            check.name, column.name
                        ));
                    }
                }
            }

            Target::InsertRows { table, rows } => {
                Self::validate_table_ref(check, table, result);
                if rows.is_empty() {
                    result.add_error(&format!("Check '{}': no rows to insert", check.name));
                }
                for (i, row) in rows.iter().enumerate() {
                    if row.is_empty() {
                        result.add_error(&format!("Check '{}': row {} is empty", check.name, i + 1));
                    }
                }
            }
        }
    }

    fn validate_table_ref(
        check: &Check,
        table: &crate::workflow::TableRef,
        result: &mut ValidationResult,
    ) {
        if table.project.is_empty() || table.dataset.is_empty() || table.table.is_empty() {
            result.add_error(&format!(
                "Check '{}': table reference must be fully qualified (project, dataset, table)",
                check.name
            ));
        }
    }
}

/// Result of workflow validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
