// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Utility modules
//!
//! Common utilities for the smokeflow CLI.

pub mod spinner;

pub use spinner::*;
