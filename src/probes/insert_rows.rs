// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Row-insertion probe
//!
//! Streams a fixed set of rows into the provisioned table. Per-row
//! failures from the service surface as a single error; nothing is
//! retried or rolled back.

use async_trait::async_trait;

use super::{Probe, ProbeReport};
use crate::clients::WarehouseAdmin;
use crate::errors::{SmokeflowError, SmokeflowResult};
use crate::workflow::{Check, Target};

/// Probe for the bulk-insert check
pub struct InsertRowsProbe {
    admin: Box<dyn WarehouseAdmin>,
}

impl InsertRowsProbe {
    pub fn new(admin: Box<dyn WarehouseAdmin>) -> Self {
        Self { admin }
    }
}

#[async_trait]
impl Probe for InsertRowsProbe {
    async fn run(&self, check: &Check) -> SmokeflowResult<ProbeReport> {
        let Target::InsertRows { table, rows } = &check.target else {
            return Err(SmokeflowError::InvalidCheck {
                check: check.name.clone(),
                reason: "expected an insert_rows target".to_string(),
            });
        };

        let accepted = self.admin.insert_all(table, rows).await?;

        Ok(ProbeReport::new(format!(
            "inserted {} row(s) into {}",
            accepted, table
        )))
    }

    fn target(&self) -> &'static str {
        "insert_rows"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::JobHandle;
    use crate::workflow::{Row, RowValue, TableRef};
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    struct RecordingAdmin {
        rows: Arc<Mutex<Vec<Row>>>,
    }

    #[async_trait]
    impl WarehouseAdmin for RecordingAdmin {
        async fn execute_ddl(
            &self,
            _sql: &str,
            _project: &str,
            _location: &str,
        ) -> SmokeflowResult<JobHandle> {
            unreachable!("insert_rows never runs DDL");
        }

        async fn insert_all(&self, _table: &TableRef, rows: &[Row]) -> SmokeflowResult<usize> {
            self.rows.lock().unwrap().extend_from_slice(rows);
            Ok(rows.len())
        }
    }

    fn sample_rows() -> Vec<Row> {
        let mut john = BTreeMap::new();
        john.insert("customer_id".to_string(), RowValue::Integer(1));
        john.insert("name".to_string(), RowValue::Text("John Doe".into()));
        john.insert("email".to_string(), RowValue::Text("john@example.com".into()));

        let mut jane = BTreeMap::new();
        jane.insert("customer_id".to_string(), RowValue::Integer(2));
        jane.insert("name".to_string(), RowValue::Text("Jane Smith".into()));
        jane.insert("email".to_string(), RowValue::Text("jane@example.com".into()));

        vec![john, jane]
    }

    #[tokio::test]
    async fn test_streams_both_rows() {
        let seen: Arc<Mutex<Vec<Row>>> = Arc::default();
        let probe = InsertRowsProbe::new(Box::new(RecordingAdmin { rows: Arc::clone(&seen) }));

        let check = Check {
            name: "rows".into(),
            description: None,
            profile: "qe".into(),
            target: Target::InsertRows {
                table: TableRef {
                    project: "demo-project".into(),
                    dataset: "demo_dataset".into(),
                    table: "customer_data".into(),
                },
                rows: sample_rows(),
            },
            depends_on: vec![],
        };

        let report = probe.run(&check).await.unwrap();
        assert_eq!(
            report.detail,
            "inserted 2 row(s) into demo-project.demo_dataset.customer_data"
        );

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0]["customer_id"], RowValue::Integer(1));
        assert_eq!(seen[0]["name"], RowValue::Text("John Doe".into()));
        assert_eq!(seen[1]["customer_id"], RowValue::Integer(2));
        assert_eq!(seen[1]["email"], RowValue::Text("jane@example.com".into()));
    }
}
