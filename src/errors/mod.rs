// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Error types for smokeflow
//!
//! Connectivity failures are classified the way operators triage them:
//! credentials, missing resources, malformed requests, or the network.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for smokeflow operations
pub type SmokeflowResult<T> = Result<T, SmokeflowError>;

/// Main error type for smokeflow
#[derive(Error, Debug, Diagnostic)]
pub enum SmokeflowError {
    // ─────────────────────────────────────────────────────────────────────────
    // Workflow Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Workflow file not found: {path}")]
    #[diagnostic(
        code(smokeflow::workflow_not_found),
        help("Create a workflow with 'smokeflow init' or create .smokeflow.yaml manually")
    )]
    WorkflowNotFound { path: PathBuf },

    #[error("Invalid workflow configuration: {reason}")]
    #[diagnostic(code(smokeflow::invalid_workflow))]
    InvalidWorkflow {
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("Check '{check}' is invalid: {reason}")]
    #[diagnostic(code(smokeflow::invalid_check))]
    InvalidCheck { check: String, reason: String },

    #[error("Check '{check}' depends on unknown check '{dependency}'")]
    #[diagnostic(
        code(smokeflow::unknown_dependency),
        help("Check that '{dependency}' is defined in your workflow")
    )]
    UnknownDependency { check: String, dependency: String },

    #[error("Circular dependency detected")]
    #[diagnostic(
        code(smokeflow::circular_dependency),
        help("Review your check dependencies to remove the cycle")
    )]
    CircularDependency { checks: Vec<String> },

    #[error("Check '{check}' depends on '{dependency}', which is declared after it")]
    #[diagnostic(
        code(smokeflow::chain_order_conflict),
        help("Checks run in declaration order; move '{dependency}' above '{check}'")
    )]
    ChainOrderConflict { check: String, dependency: String },

    #[error("Check '{check}' not found in workflow")]
    #[diagnostic(code(smokeflow::check_not_found))]
    CheckNotFound { check: String },

    #[error("No probe registered for check '{check}'")]
    #[diagnostic(code(smokeflow::probe_not_found))]
    ProbeNotFound { check: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Profile Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Profiles file not found: {path}")]
    #[diagnostic(
        code(smokeflow::profiles_not_found),
        help("Create it with 'smokeflow init' or point --profiles at an existing file")
    )]
    ProfilesNotFound { path: PathBuf },

    #[error("Connection profile '{name}' not found")]
    #[diagnostic(code(smokeflow::profile_not_found), help("Known profiles: {known}"))]
    ProfileNotFound { name: String, known: String },

    #[error("Connection profile '{name}' has kind '{actual}', expected '{expected}'")]
    #[diagnostic(code(smokeflow::profile_kind_mismatch))]
    ProfileKindMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Profile '{name}' is invalid: {reason}")]
    #[diagnostic(code(smokeflow::invalid_profile))]
    InvalidProfile { name: String, reason: String },

    #[error("Profile '{name}' reads its secret from ${var}, which is not set")]
    #[diagnostic(
        code(smokeflow::missing_secret),
        help("Export {var} before running, or put the value in the profiles file")
    )]
    MissingSecret { name: String, var: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Connectivity Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("{service}: authentication or permission failure: {message}")]
    #[diagnostic(
        code(smokeflow::auth_failed),
        help("Verify the credentials in the connection profile and their granted roles")
    )]
    AuthFailed { service: String, message: String },

    #[error("{service}: {resource} not found")]
    #[diagnostic(code(smokeflow::resource_not_found))]
    ResourceNotFound {
        service: String,
        resource: String,
        #[help]
        help: Option<String>,
    },

    #[error("{service}: request rejected: {message}")]
    #[diagnostic(code(smokeflow::malformed_request))]
    MalformedRequest { service: String, message: String },

    #[error("Query job '{job_id}' failed ({reason}): {message}")]
    #[diagnostic(code(smokeflow::job_failed))]
    JobFailed {
        job_id: String,
        reason: String,
        message: String,
    },

    #[error("Insert into {table} reported {failures} failed row(s): {first}")]
    #[diagnostic(
        code(smokeflow::insert_failed),
        help("Row shape must match the table schema; compare the failing row against the columns")
    )]
    InsertFailed {
        table: String,
        failures: usize,
        first: String,
    },

    #[error("{service}: network failure: {message}")]
    #[diagnostic(code(smokeflow::network))]
    Network { service: String, message: String },

    #[error("{service}: timed out after {seconds}s")]
    #[diagnostic(code(smokeflow::timeout))]
    Timeout { service: String, seconds: u64 },

    #[error("{service}: unexpected response: {message}")]
    #[diagnostic(code(smokeflow::unexpected_response))]
    UnexpectedResponse { service: String, message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // File / IO Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(smokeflow::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(smokeflow::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(smokeflow::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(smokeflow::yaml_error))]
    Yaml { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(smokeflow::toml_error))]
    Toml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(smokeflow::json_error))]
    Json { message: String },
}

impl From<std::io::Error> for SmokeflowError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for SmokeflowError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for SmokeflowError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for SmokeflowError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl SmokeflowError {
    /// Classify an HTTP status into the connectivity taxonomy.
    ///
    /// 401/403 are credential problems, 404 is a missing resource, any other
    /// 4xx is a request the service rejected, and everything else is reported
    /// as a network-level failure.
    pub fn from_status(service: &str, status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::AuthFailed {
                service: service.to_string(),
                message,
            },
            404 => Self::ResourceNotFound {
                service: service.to_string(),
                resource: "requested resource".to_string(),
                help: Some(message),
            },
            400..=499 => Self::MalformedRequest {
                service: service.to_string(),
                message,
            },
            _ => Self::Network {
                service: service.to_string(),
                message: format!("HTTP {status}: {message}"),
            },
        }
    }

    /// Classify a reqwest transport error.
    pub fn from_transport(service: &str, timeout_secs: u64, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                service: service.to_string(),
                seconds: timeout_secs,
            }
        } else {
            Self::Network {
                service: service.to_string(),
                message: error.to_string(),
            }
        }
    }
}
