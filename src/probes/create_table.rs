// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Schema-provisioning probe
//!
//! Issues CREATE TABLE IF NOT EXISTS, so a second run against an existing
//! table succeeds without touching it.

use async_trait::async_trait;

use super::{Probe, ProbeReport};
use crate::clients::WarehouseAdmin;
use crate::errors::{SmokeflowError, SmokeflowResult};
use crate::workflow::{render_create_table, Check, Target};

/// Probe for the idempotent table-creation check
pub struct CreateTableProbe {
    admin: Box<dyn WarehouseAdmin>,
}

impl CreateTableProbe {
    pub fn new(admin: Box<dyn WarehouseAdmin>) -> Self {
        Self { admin }
    }
}

#[async_trait]
impl Probe for CreateTableProbe {
    async fn run(&self, check: &Check) -> SmokeflowResult<ProbeReport> {
        let Target::CreateTable { table, columns, location } = &check.target else {
            return Err(SmokeflowError::InvalidCheck {
                check: check.name.clone(),
                reason: "expected a create_table target".to_string(),
            });
        };

        let ddl = render_create_table(table, columns);
        self.admin.execute_ddl(&ddl, &table.project, location).await?;

        Ok(ProbeReport::new(format!("table {} ready", table)))
    }

    fn target(&self) -> &'static str {
        "create_table"
    }
}
