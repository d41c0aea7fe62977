// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Workflow definitions and types
//!
//! This module defines the core data structures for smokeflow workflows:
//! checks, targets, the linear execution chain, and the runner.

mod chain;
mod definition;
mod runner;
mod validation;

pub use chain::ChainBuilder;
pub use definition::*;
pub use runner::{CheckOutcome, CheckStatus, RunOptions, RunReport, WorkflowRunner};
pub use validation::{ValidationResult, WorkflowValidator};
