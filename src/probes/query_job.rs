// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Query-job probe
//!
//! Submits a trivial query as an asynchronous job and blocks until the
//! engine reports a terminal state. Completion detection is the engine's
//! job-polling mechanism; this probe only waits on it.

use async_trait::async_trait;

use super::{Probe, ProbeReport};
use crate::clients::{QueryEngine, QueryJobRequest};
use crate::errors::{SmokeflowError, SmokeflowResult};
use crate::utils::create_spinner;
use crate::workflow::{Check, Target};

/// Probe for the query-engine job check
pub struct QueryJobProbe {
    engine: Box<dyn QueryEngine>,
}

impl QueryJobProbe {
    pub fn new(engine: Box<dyn QueryEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Probe for QueryJobProbe {
    async fn run(&self, check: &Check) -> SmokeflowResult<ProbeReport> {
        let Target::QueryJob { sql, project, location, legacy_sql } = &check.target else {
            return Err(SmokeflowError::InvalidCheck {
                check: check.name.clone(),
                reason: "expected a query_job target".to_string(),
            });
        };

        let job = QueryJobRequest {
            sql: sql.clone(),
            project: project.clone(),
            location: location.clone(),
            legacy_sql: *legacy_sql,
        };

        let handle = self.engine.submit(&job).await?;

        let spinner = create_spinner(&format!("waiting for job {}", handle.job_id));
        let waited = self.engine.wait(&handle).await;
        spinner.finish_and_clear();
        let completed = waited?;

        let results = self.engine.fetch_rows(&handle).await?;

        let detail = match (results.columns.first(), results.first_row()) {
            (Some(column), Some(row)) if !row.is_empty() => format!(
                "job {} {} ({} => {})",
                completed.handle.job_id, completed.state, column, row[0]
            ),
            _ => format!("job {} {} (no rows)", completed.handle.job_id, completed.state),
        };

        Ok(ProbeReport::new(detail))
    }

    fn target(&self) -> &'static str {
        "query_job"
    }
}
