// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Warehouse ping probe
//!
//! Runs a trivial query against the warehouse and reports the first row.
//! A failure here means the warehouse is unreachable or the credentials
//! are wrong; the remaining checks never start.

use async_trait::async_trait;

use super::{Probe, ProbeReport};
use crate::clients::Warehouse;
use crate::errors::{SmokeflowError, SmokeflowResult};
use crate::workflow::{Check, Target};

/// Probe for the warehouse reachability check
pub struct WarehousePingProbe {
    warehouse: Box<dyn Warehouse>,
}

impl WarehousePingProbe {
    pub fn new(warehouse: Box<dyn Warehouse>) -> Self {
        Self { warehouse }
    }
}

#[async_trait]
impl Probe for WarehousePingProbe {
    async fn run(&self, check: &Check) -> SmokeflowResult<ProbeReport> {
        let Target::WarehousePing { sql } = &check.target else {
            return Err(SmokeflowError::InvalidCheck {
                check: check.name.clone(),
                reason: "expected a warehouse_ping target".to_string(),
            });
        };

        let row = self.warehouse.query_first(sql).await?;

        let detail = match row {
            Some(cells) => format!("{} => [{}]", sql, cells.join(", ")),
            None => format!("{} => no rows", sql),
        };

        Ok(ProbeReport::new(detail))
    }

    fn target(&self) -> &'static str {
        "warehouse_ping"
    }
}
