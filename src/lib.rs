// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! # smokeflow - Connectivity Smoke Tests
//!
//! `smokeflow` verifies warehouse, object-store, and query-engine
//! credentials with one linear chain of checks.
//!
//! ## Features
//!
//! - **Linear workflow** - Five checks, strictly ordered, first failure halts
//! - **Profile indirection** - Workflow files name profiles, never secrets
//! - **Idempotent provisioning** - Table creation is create-if-absent
//! - **Dry runs** - Inspect the plan without any network call
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a starter workflow and profiles skeleton
//! smokeflow init
//!
//! # Check the configuration offline
//! smokeflow validate
//!
//! # Execute the checks
//! smokeflow run --profiles profiles.toml
//! ```

pub mod cli;
pub mod clients;
pub mod errors;
pub mod probes;
pub mod profiles;
pub mod utils;
pub mod workflow;

// Re-export commonly used types
pub use errors::{SmokeflowError, SmokeflowResult};
pub use workflow::{Check, Workflow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
