// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Workflow definition structures
//!
//! Defines the schema for .smokeflow.yaml files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Workflow definition from .smokeflow.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Workflow version (for future compatibility)
    #[serde(default = "default_version")]
    pub version: String,

    /// Workflow name
    pub name: String,

    /// Workflow description
    #[serde(default)]
    pub description: Option<String>,

    /// Free-form tags (e.g. "test", "infra")
    #[serde(default)]
    pub tags: Vec<String>,

    /// Checks in execution order
    pub checks: Vec<Check>,
}

fn default_version() -> String {
    "1".to_string()
}

impl Workflow {
    /// Load a workflow from a YAML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::SmokeflowError> {
        if !path.exists() {
            return Err(crate::SmokeflowError::WorkflowNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::SmokeflowError::FileReadError {
                path: path.to_path_buf(),
                error: e.to_string(),
            }
        })?;

        Self::from_yaml(&content)
    }

    /// Parse a workflow from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, crate::SmokeflowError> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Serialize the workflow to YAML
    pub fn to_yaml(&self) -> Result<String, crate::SmokeflowError> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Get a check by name
    pub fn get_check(&self, name: &str) -> Option<&Check> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// Get all check names in declaration order
    pub fn check_names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name.as_str()).collect()
    }
}

/// A single connectivity check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Check {
    /// Check name (must be unique within the workflow)
    pub name: String,

    /// Check description
    #[serde(default)]
    pub description: Option<String>,

    /// Connection profile name, resolved by the host environment.
    /// Credentials never appear in the workflow file.
    pub profile: String,

    /// What this check exercises
    pub target: Target,

    /// Check dependencies (other check names).
    ///
    /// Checks always run in declaration order; declared dependencies are
    /// validated against that order, they do not define a second one.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl Check {
    /// Get the target name for this check
    pub fn target_name(&self) -> &'static str {
        self.target.name()
    }
}

/// Target specification: one external call per check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Target {
    /// Run a trivial query against the warehouse and report the first row
    WarehousePing {
        /// Query to run
        #[serde(default = "default_ping_sql")]
        sql: String,
    },

    /// Upload a small payload to an object-store bucket
    ObjectStoreUpload {
        /// Bucket identifier
        bucket: String,

        /// Object key
        key: String,

        /// Payload written verbatim
        payload: String,
    },

    /// Submit a query as an asynchronous job and wait for completion
    QueryJob {
        /// SQL text
        sql: String,

        /// Target project
        project: String,

        /// Target region
        location: String,

        /// Legacy SQL dialect flag
        #[serde(default)]
        legacy_sql: bool,
    },

    /// Issue an idempotent "create table if absent" statement
    CreateTable {
        /// Fully qualified table
        table: TableRef,

        /// Column definitions
        columns: Vec<ColumnDef>,

        /// Region the DDL job runs in
        #[serde(default = "default_location")]
        location: String,
    },

    /// Append rows to a provisioned table
    InsertRows {
        /// Fully qualified table
        table: TableRef,

        /// Rows to append, in order
        rows: Vec<Row>,
    },
}

fn default_ping_sql() -> String {
    "SELECT 1".to_string()
}

fn default_location() -> String {
    "US".to_string()
}

impl Target {
    /// Stable name used for registry lookup and display
    pub fn name(&self) -> &'static str {
        match self {
            Self::WarehousePing { .. } => "warehouse_ping",
            Self::ObjectStoreUpload { .. } => "object_store_upload",
            Self::QueryJob { .. } => "query_job",
            Self::CreateTable { .. } => "create_table",
            Self::InsertRows { .. } => "insert_rows",
        }
    }
}

/// Fully qualified table reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// A column in a provisioned table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name
    pub name: String,

    /// Column type
    pub kind: ColumnType,

    /// Default the column to ingestion time
    #[serde(default)]
    pub default_now: bool,
}

impl ColumnDef {
    /// Render this column for a DDL statement
    pub fn to_ddl(&self) -> String {
        if self.default_now {
            format!("{} {} DEFAULT CURRENT_TIMESTAMP()", self.name, self.kind)
        } else {
            format!("{} {}", self.name, self.kind)
        }
    }
}

/// Column types accepted by the warehouse DDL
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Int64,
    Float64,
    String,
    Bool,
    Timestamp,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int64 => write!(f, "INT64"),
            Self::Float64 => write!(f, "FLOAT64"),
            Self::String => write!(f, "STRING"),
            Self::Bool => write!(f, "BOOL"),
            Self::Timestamp => write!(f, "TIMESTAMP"),
        }
    }
}

/// Render the idempotent DDL for a table
pub fn render_create_table(table: &TableRef, columns: &[ColumnDef]) -> String {
    let cols: Vec<String> = columns.iter().map(ColumnDef::to_ddl).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS `{}` ({})",
        table,
        cols.join(", ")
    )
}

/// One row to insert: column name to value
pub type Row = BTreeMap<String, RowValue>;

/// A scalar cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl RowValue {
    /// Convert to a JSON value for streaming-insert payloads
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Integer(v) => serde_json::Value::from(*v),
            Self::Float(v) => serde_json::Value::from(*v),
            Self::Bool(v) => serde_json::Value::from(*v),
            Self::Text(v) => serde_json::Value::from(v.clone()),
        }
    }
}

impl fmt::Display for RowValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{}", v),
        }
    }
}
