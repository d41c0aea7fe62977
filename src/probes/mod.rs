// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Connectivity probes
//!
//! One probe per target type, each a thin wrapper over a single client
//! capability. Probes are constructed per check because every check names
//! its own connection profile.

mod create_table;
mod insert_rows;
mod object_store_upload;
mod query_job;
mod warehouse_ping;

pub use create_table::CreateTableProbe;
pub use insert_rows::InsertRowsProbe;
pub use object_store_upload::ObjectStoreUploadProbe;
pub use query_job::QueryJobProbe;
pub use warehouse_ping::WarehousePingProbe;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::clients::{HttpQueryEngine, HttpWarehouse, OpendalObjectStore};
use crate::errors::SmokeflowResult;
use crate::profiles::ProfileStore;
use crate::workflow::{Check, Target, Workflow};

/// What a successful probe reports
#[derive(Debug, Clone)]
pub struct ProbeReport {
    /// One-line result detail, e.g. the queried row or the uploaded path
    pub detail: String,
}

impl ProbeReport {
    pub fn new(detail: impl Into<String>) -> Self {
        Self { detail: detail.into() }
    }
}

/// Trait for connectivity probes
#[async_trait]
pub trait Probe: Send + Sync {
    /// Execute the check; errors propagate unmodified to the runner
    async fn run(&self, check: &Check) -> SmokeflowResult<ProbeReport>;

    /// Target type this probe serves
    fn target(&self) -> &'static str;
}

/// Build one probe per check, resolving each check's connection profile
pub fn create_probes(
    workflow: &Workflow,
    profiles: &ProfileStore,
) -> SmokeflowResult<HashMap<String, Box<dyn Probe>>> {
    let mut probes: HashMap<String, Box<dyn Probe>> = HashMap::new();

    for check in &workflow.checks {
        let probe: Box<dyn Probe> = match &check.target {
            Target::WarehousePing { .. } => {
                let profile = profiles.warehouse(&check.profile)?.clone();
                Box::new(WarehousePingProbe::new(Box::new(HttpWarehouse::new(
                    &check.profile,
                    profile,
                )?)))
            }

            Target::ObjectStoreUpload { .. } => {
                let profile = profiles.object_store(&check.profile)?.clone();
                Box::new(ObjectStoreUploadProbe::new(Box::new(
                    OpendalObjectStore::new(&check.profile, profile),
                )))
            }

            Target::QueryJob { .. } => {
                let profile = profiles.query_engine(&check.profile)?.clone();
                Box::new(QueryJobProbe::new(Box::new(HttpQueryEngine::new(
                    &check.profile,
                    profile,
                )?)))
            }

            Target::CreateTable { .. } => {
                let profile = profiles.query_engine(&check.profile)?.clone();
                Box::new(CreateTableProbe::new(Box::new(HttpQueryEngine::new(
                    &check.profile,
                    profile,
                )?)))
            }

            Target::InsertRows { .. } => {
                let profile = profiles.query_engine(&check.profile)?.clone();
                Box::new(InsertRowsProbe::new(Box::new(HttpQueryEngine::new(
                    &check.profile,
                    profile,
                )?)))
            }
        };

        probes.insert(check.name.clone(), probe);
    }

    Ok(probes)
}
