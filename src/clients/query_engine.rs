// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Asynchronous query-engine client
//!
//! Speaks the engine's jobs REST API: submit a query job, poll it to a
//! terminal state, fetch rows. The same service also carries the
//! administrative surface used by the schema and insert checks: DDL runs as
//! a synchronous job, rows go through the streaming-insert endpoint.

use async_trait::async_trait;
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::debug;

use super::{QueryEngine, WarehouseAdmin};
use crate::errors::{SmokeflowError, SmokeflowResult};
use crate::profiles::{resolve_secret, QueryEngineProfile};
use crate::workflow::{Row, TableRef};

const SERVICE: &str = "query engine";
const DEFAULT_ENDPOINT: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// A query job to submit
#[derive(Debug, Clone)]
pub struct QueryJobRequest {
    pub sql: String,
    pub project: String,
    pub location: String,
    pub legacy_sql: bool,
}

/// An acknowledged job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub project: String,
    pub job_id: String,
    pub location: String,
}

/// A job that reached a terminal state without errors
#[derive(Debug, Clone)]
pub struct CompletedJob {
    pub handle: JobHandle,
    pub state: String,
}

/// Rows of a completed query job
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultSet {
    /// First row, if any
    pub fn first_row(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }
}

/// Query-engine client over the jobs REST API
pub struct HttpQueryEngine {
    client: reqwest::Client,
    profile: QueryEngineProfile,
    base_url: String,
    token: String,
}

impl HttpQueryEngine {
    /// Build a client from a resolved profile
    pub fn new(profile_name: &str, profile: QueryEngineProfile) -> SmokeflowResult<Self> {
        let token = resolve_secret(profile_name, &profile.token, &profile.token_env)?;

        let base_url = profile
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(profile.timeout_secs))
            .build()
            .map_err(|e| SmokeflowError::Network {
                service: SERVICE.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            profile,
            base_url,
            token,
        })
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> SmokeflowResult<serde_json::Value> {
        debug!(url = %url, "query engine POST");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| SmokeflowError::from_transport(SERVICE, self.profile.timeout_secs, &e))?;

        self.read_json(response).await
    }

    async fn get_json(&self, url: &str) -> SmokeflowResult<serde_json::Value> {
        debug!(url = %url, "query engine GET");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| SmokeflowError::from_transport(SERVICE, self.profile.timeout_secs, &e))?;

        self.read_json(response).await
    }

    async fn read_json(&self, response: reqwest::Response) -> SmokeflowResult<serde_json::Value> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| SmokeflowError::from_transport(SERVICE, self.profile.timeout_secs, &e))?;

        if !(200..300).contains(&status) {
            return Err(SmokeflowError::from_status(
                SERVICE,
                status,
                error_message(&text),
            ));
        }

        serde_json::from_str(&text).map_err(|e| SmokeflowError::UnexpectedResponse {
            service: SERVICE.to_string(),
            message: format!("response is not JSON: {e}"),
        })
    }
}

#[async_trait]
impl QueryEngine for HttpQueryEngine {
    async fn submit(&self, job: &QueryJobRequest) -> SmokeflowResult<JobHandle> {
        let url = format!("{}/projects/{}/jobs", self.base_url, job.project);
        let body = job_body(job);

        let response = self.post_json(&url, &body).await?;
        parse_job_handle(&job.project, &response)
    }

    async fn wait(&self, handle: &JobHandle) -> SmokeflowResult<CompletedJob> {
        let url = format!(
            "{}/projects/{}/jobs/{}?location={}",
            self.base_url, handle.project, handle.job_id, handle.location
        );

        let started = Instant::now();
        let interval = Duration::from_millis(self.profile.poll_interval_ms);

        loop {
            let response = self.get_json(&url).await?;
            let status = parse_job_status(&response)?;

            debug!(job_id = %handle.job_id, state = %status.state, "job poll");

            if status.state == "DONE" {
                if let Some((reason, message)) = status.error {
                    return Err(SmokeflowError::JobFailed {
                        job_id: handle.job_id.clone(),
                        reason,
                        message,
                    });
                }

                return Ok(CompletedJob {
                    handle: handle.clone(),
                    state: status.state,
                });
            }

            if started.elapsed().as_secs() >= self.profile.max_poll_secs {
                return Err(SmokeflowError::Timeout {
                    service: SERVICE.to_string(),
                    seconds: self.profile.max_poll_secs,
                });
            }

            tokio::time::sleep(interval).await;
        }
    }

    async fn fetch_rows(&self, handle: &JobHandle) -> SmokeflowResult<ResultSet> {
        let url = format!(
            "{}/projects/{}/queries/{}?location={}",
            self.base_url, handle.project, handle.job_id, handle.location
        );

        let response = self.get_json(&url).await?;
        parse_result_set(&response)
    }
}

#[async_trait]
impl WarehouseAdmin for HttpQueryEngine {
    async fn execute_ddl(
        &self,
        sql: &str,
        project: &str,
        location: &str,
    ) -> SmokeflowResult<JobHandle> {
        let job = QueryJobRequest {
            sql: sql.to_string(),
            project: project.to_string(),
            location: location.to_string(),
            legacy_sql: false,
        };

        let handle = self.submit(&job).await?;
        self.wait(&handle).await?;
        Ok(handle)
    }

    async fn insert_all(&self, table: &TableRef, rows: &[Row]) -> SmokeflowResult<usize> {
        let url = format!(
            "{}/projects/{}/datasets/{}/tables/{}/insertAll",
            self.base_url, table.project, table.dataset, table.table
        );
        let body = insert_body(rows);

        let response = self.post_json(&url, &body).await?;
        let failures = parse_insert_errors(&response);

        if let Some((failed, first)) = failures {
            return Err(SmokeflowError::InsertFailed {
                table: table.to_string(),
                failures: failed,
                first,
            });
        }

        Ok(rows.len())
    }
}

/// Render a jobs.insert request body
fn job_body(job: &QueryJobRequest) -> serde_json::Value {
    json!({
        "configuration": {
            "query": {
                "query": job.sql,
                "useLegacySql": job.legacy_sql
            }
        },
        "jobReference": {
            "projectId": job.project,
            "location": job.location
        }
    })
}

/// Render a streaming-insert request body
fn insert_body(rows: &[Row]) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = rows
        .iter()
        .map(|row| {
            let fields: serde_json::Map<String, serde_json::Value> = row
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect();
            json!({ "json": fields })
        })
        .collect();

    json!({ "rows": entries })
}

fn parse_job_handle(project: &str, response: &serde_json::Value) -> SmokeflowResult<JobHandle> {
    let reference = response.get("jobReference").ok_or_else(|| {
        SmokeflowError::UnexpectedResponse {
            service: SERVICE.to_string(),
            message: "job acknowledgement has no 'jobReference'".to_string(),
        }
    })?;

    let job_id = reference
        .get("jobId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| SmokeflowError::UnexpectedResponse {
            service: SERVICE.to_string(),
            message: "jobReference has no 'jobId'".to_string(),
        })?;

    let location = reference
        .get("location")
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    Ok(JobHandle {
        project: project.to_string(),
        job_id: job_id.to_string(),
        location: location.to_string(),
    })
}

struct JobStatus {
    state: String,
    error: Option<(String, String)>,
}

fn parse_job_status(response: &serde_json::Value) -> SmokeflowResult<JobStatus> {
    let status = response.get("status").ok_or_else(|| {
        SmokeflowError::UnexpectedResponse {
            service: SERVICE.to_string(),
            message: "job has no 'status'".to_string(),
        }
    })?;

    let state = status
        .get("state")
        .and_then(|v| v.as_str())
        .ok_or_else(|| SmokeflowError::UnexpectedResponse {
            service: SERVICE.to_string(),
            message: "job status has no 'state'".to_string(),
        })?
        .to_string();

    let error = status.get("errorResult").map(|e| {
        let reason = e
            .get("reason")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        let message = e
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("no message")
            .to_string();
        (reason, message)
    });

    Ok(JobStatus { state, error })
}

/// Parse the f/v row encoding of query results
fn parse_result_set(response: &serde_json::Value) -> SmokeflowResult<ResultSet> {
    let columns = response
        .get("schema")
        .and_then(|s| s.get("fields"))
        .and_then(|f| f.as_array())
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f.get("name").and_then(|n| n.as_str()))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let rows = response
        .get("rows")
        .and_then(|r| r.as_array())
        .map(|rows| {
            rows.iter()
                .map(|row| {
                    row.get("f")
                        .and_then(|f| f.as_array())
                        .map(|cells| {
                            cells
                                .iter()
                                .map(|cell| match cell.get("v") {
                                    Some(serde_json::Value::String(s)) => s.clone(),
                                    Some(serde_json::Value::Null) | None => "NULL".to_string(),
                                    Some(other) => other.to_string(),
                                })
                                .collect()
                        })
                        .unwrap_or_default()
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ResultSet { columns, rows })
}

/// Extract per-row insert failures: (count, first message)
fn parse_insert_errors(response: &serde_json::Value) -> Option<(usize, String)> {
    let errors = response.get("insertErrors")?.as_array()?;
    if errors.is_empty() {
        return None;
    }

    let first = errors[0]
        .get("errors")
        .and_then(|e| e.as_array())
        .and_then(|e| e.first())
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .unwrap_or("no message")
        .to_string();

    Some((errors.len(), first))
}

/// Best-effort extraction of the service's error message field
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::RowValue;
    use httpmock::prelude::*;
    use std::collections::BTreeMap;

    fn test_profile(endpoint: String) -> QueryEngineProfile {
        QueryEngineProfile {
            token: Some("secret".into()),
            token_env: None,
            endpoint: Some(endpoint),
            poll_interval_ms: 10,
            max_poll_secs: 2,
            timeout_secs: 5,
        }
    }

    fn test_job() -> QueryJobRequest {
        QueryJobRequest {
            sql: "SELECT 1 AS ok".into(),
            project: "demo-project".into(),
            location: "US".into(),
            legacy_sql: false,
        }
    }

    #[test]
    fn test_job_body_dialect_flag() {
        let body = job_body(&test_job());
        assert_eq!(body["configuration"]["query"]["query"], "SELECT 1 AS ok");
        assert_eq!(body["configuration"]["query"]["useLegacySql"], false);
        assert_eq!(body["jobReference"]["location"], "US");
    }

    #[test]
    fn test_insert_body_two_rows() {
        let mut john = BTreeMap::new();
        john.insert("customer_id".to_string(), RowValue::Integer(1));
        john.insert("name".to_string(), RowValue::Text("John Doe".into()));
        john.insert("email".to_string(), RowValue::Text("john@example.com".into()));

        let mut jane = BTreeMap::new();
        jane.insert("customer_id".to_string(), RowValue::Integer(2));
        jane.insert("name".to_string(), RowValue::Text("Jane Smith".into()));
        jane.insert("email".to_string(), RowValue::Text("jane@example.com".into()));

        let body = insert_body(&[john, jane]);
        let rows = body["rows"].as_array().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["json"]["customer_id"], 1);
        assert_eq!(rows[0]["json"]["name"], "John Doe");
        assert_eq!(rows[1]["json"]["email"], "jane@example.com");
    }

    #[test]
    fn test_parse_result_set_single_cell() {
        let response: serde_json::Value = serde_json::from_str(
            r#"{
                "schema": { "fields": [{ "name": "ok", "type": "INTEGER" }] },
                "rows": [{ "f": [{ "v": "1" }] }],
                "jobComplete": true
            }"#,
        )
        .unwrap();

        let results = parse_result_set(&response).unwrap();
        assert_eq!(results.columns, vec!["ok"]);
        assert_eq!(results.first_row(), Some(&["1".to_string()][..]));
    }

    #[test]
    fn test_parse_job_status_terminal_error() {
        let response: serde_json::Value = serde_json::from_str(
            r#"{
                "status": {
                    "state": "DONE",
                    "errorResult": { "reason": "invalidQuery", "message": "Syntax error" }
                }
            }"#,
        )
        .unwrap();

        let status = parse_job_status(&response).unwrap();
        assert_eq!(status.state, "DONE");
        assert_eq!(
            status.error,
            Some(("invalidQuery".to_string(), "Syntax error".to_string()))
        );
    }

    #[test]
    fn test_parse_insert_errors() {
        let response: serde_json::Value = serde_json::from_str(
            r#"{
                "insertErrors": [
                    { "index": 0, "errors": [{ "reason": "invalid", "message": "no such field" }] }
                ]
            }"#,
        )
        .unwrap();

        let failures = parse_insert_errors(&response).unwrap();
        assert_eq!(failures.0, 1);
        assert_eq!(failures.1, "no such field");

        let clean: serde_json::Value = serde_json::from_str("{}").unwrap();
        assert!(parse_insert_errors(&clean).is_none());
    }

    #[tokio::test]
    async fn test_submit_and_wait_until_done() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/projects/demo-project/jobs");
            then.status(200).body(
                r#"{
                    "jobReference": { "jobId": "job_abc", "location": "US" },
                    "status": { "state": "RUNNING" }
                }"#,
            );
        });

        server.mock(|when, then| {
            when.method(GET).path("/projects/demo-project/jobs/job_abc");
            then.status(200)
                .body(r#"{ "status": { "state": "DONE" } }"#);
        });

        let engine = HttpQueryEngine::new("test", test_profile(server.base_url())).unwrap();

        let handle = engine.submit(&test_job()).await.unwrap();
        assert_eq!(handle.job_id, "job_abc");

        let completed = engine.wait(&handle).await.unwrap();
        assert_eq!(completed.state, "DONE");
    }

    #[tokio::test]
    async fn test_wait_surfaces_job_error() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(GET).path("/projects/demo-project/jobs/job_bad");
            then.status(200).body(
                r#"{
                    "status": {
                        "state": "DONE",
                        "errorResult": { "reason": "invalidQuery", "message": "Syntax error" }
                    }
                }"#,
            );
        });

        let engine = HttpQueryEngine::new("test", test_profile(server.base_url())).unwrap();
        let handle = JobHandle {
            project: "demo-project".into(),
            job_id: "job_bad".into(),
            location: "US".into(),
        };

        let err = engine.wait(&handle).await.unwrap_err();
        match err {
            SmokeflowError::JobFailed { reason, .. } => assert_eq!(reason, "invalidQuery"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_insert_all_reports_row_failures() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST)
                .path("/projects/p/datasets/d/tables/t/insertAll");
            then.status(200).body(
                r#"{
                    "insertErrors": [
                        { "index": 0, "errors": [{ "reason": "invalid", "message": "no such field" }] },
                        { "index": 1, "errors": [{ "reason": "invalid", "message": "no such field" }] }
                    ]
                }"#,
            );
        });

        let engine = HttpQueryEngine::new("test", test_profile(server.base_url())).unwrap();
        let table = TableRef {
            project: "p".into(),
            dataset: "d".into(),
            table: "t".into(),
        };
        let mut row = BTreeMap::new();
        row.insert("bogus".to_string(), RowValue::Integer(1));

        let err = engine.insert_all(&table, &[row.clone(), row]).await.unwrap_err();
        match err {
            SmokeflowError::InsertFailed { failures, .. } => assert_eq!(failures, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_permission_denied_maps_to_auth() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/projects/demo-project/jobs");
            then.status(403)
                .body(r#"{ "error": { "message": "Access Denied" } }"#);
        });

        let engine = HttpQueryEngine::new("test", test_profile(server.base_url())).unwrap();
        let err = engine.submit(&test_job()).await.unwrap_err();

        match err {
            SmokeflowError::AuthFailed { message, .. } => {
                assert!(message.contains("Access Denied"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
