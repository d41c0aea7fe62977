// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! SQL warehouse client
//!
//! Speaks the warehouse's statements REST API: one POST per statement,
//! synchronous execution, rows in the response body.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::Warehouse;
use crate::errors::{SmokeflowError, SmokeflowResult};
use crate::profiles::{resolve_secret, WarehouseProfile};

const SERVICE: &str = "warehouse";

/// Warehouse client over the statements REST API
pub struct HttpWarehouse {
    client: reqwest::Client,
    profile: WarehouseProfile,
    base_url: String,
    token: String,
}

impl HttpWarehouse {
    /// Build a client from a resolved profile
    pub fn new(profile_name: &str, profile: WarehouseProfile) -> SmokeflowResult<Self> {
        let token = resolve_secret(profile_name, &profile.token, &profile.token_env)?;

        let base_url = profile
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}.snowflakecomputing.com", profile.account));

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
}

#[async_trait]
impl Warehouse for HttpWarehouse {
    async fn query_first(&self, sql: &str) -> SmokeflowResult<Option<Vec<String>>> {
        let url = format!("{}/api/v2/statements", self.base_url);
        let body = statement_body(sql, &self.profile);

        debug!(url = %url, "submitting warehouse statement");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| SmokeflowError::from_transport(SERVICE, self.profile.timeout_secs, &e))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| SmokeflowError::from_transport(SERVICE, self.profile.timeout_secs, &e))?;

        if status != 200 {
            return Err(SmokeflowError::from_status(
                SERVICE,
                status,
                error_message(&text),
            ));
        }

        parse_first_row(&text)
    }
}

/// Render the statement request body; optional session context only when set
fn statement_body(sql: &str, profile: &WarehouseProfile) -> serde_json::Value {
    let mut body = serde_json::Map::new();
    body.insert("statement".to_string(), json!(sql));

    if let Some(role) = &profile.role {
        body.insert("role".to_string(), json!(role));
    }
    if let Some(warehouse) = &profile.warehouse {
        body.insert("warehouse".to_string(), json!(warehouse));
    }
    if let Some(database) = &profile.database {
        body.insert("database".to_string(), json!(database));
    }
    if let Some(schema) = &profile.schema {
        body.insert("schema".to_string(), json!(schema));
    }

    serde_json::Value::Object(body)
}

/// Pull the first data row out of a statements-API response
fn parse_first_row(body: &str) -> SmokeflowResult<Option<Vec<String>>> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| SmokeflowError::UnexpectedResponse {
            service: SERVICE.to_string(),
            message: format!("response is not JSON: {e}"),
        })?;

    let Some(rows) = value.get("data").and_then(|d| d.as_array()) else {
        return Err(SmokeflowError::UnexpectedResponse {
            service: SERVICE.to_string(),
            message: "response has no 'data' array".to_string(),
        });
    };

    let Some(first) = rows.first() else {
        return Ok(None);
    };

    let cells = first
        .as_array()
        .ok_or_else(|| SmokeflowError::UnexpectedResponse {
            service: SERVICE.to_string(),
            message: "row is not an array".to_string(),
        })?
        .iter()
        .map(|cell| match cell {
            serde_json::Value::Null => "NULL".to_string(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();

    Ok(Some(cells))
}

/// Best-effort extraction of the service's error message field
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn test_profile(endpoint: Option<String>) -> WarehouseProfile {
        WarehouseProfile {
            account: "xy12345".into(),
            user: "SMOKE".into(),
            token: Some("secret".into()),
            token_env: None,
            endpoint,
            role: None,
            warehouse: Some("COMPUTE_WH".into()),
            database: None,
            schema: None,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_statement_body_includes_session_context() {
        let body = statement_body("SELECT 1", &test_profile(None));
        assert_eq!(body["statement"], "SELECT 1");
        assert_eq!(body["warehouse"], "COMPUTE_WH");
        assert!(body.get("role").is_none());
    }

    #[test]
    fn test_parse_first_row() {
        let body = r#"{
            "resultSetMetaData": { "rowType": [{ "name": "1" }] },
            "data": [["1"]]
        }"#;

        let row = parse_first_row(body).unwrap();
        assert_eq!(row, Some(vec!["1".to_string()]));
    }

    #[test]
    fn test_parse_empty_result() {
        let body = r#"{ "data": [] }"#;
        assert_eq!(parse_first_row(body).unwrap(), None);
    }

    #[test]
    fn test_parse_null_cell() {
        let body = r#"{ "data": [[null, "x"]] }"#;
        let row = parse_first_row(body).unwrap();
        assert_eq!(row, Some(vec!["NULL".to_string(), "x".to_string()]));
    }

    #[test]
    fn test_parse_missing_data_is_unexpected() {
        let err = parse_first_row(r#"{ "ok": true }"#).unwrap_err();
        assert!(matches!(err, SmokeflowError::UnexpectedResponse { .. }));
    }

    #[tokio::test]
    async fn test_query_first_round_trip() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v2/statements")
                .header("authorization", "Bearer secret");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{ "data": [["1"]] }"#);
        });

        let client =
            HttpWarehouse::new("test", test_profile(Some(server.base_url()))).unwrap();
        let row = client.query_first("SELECT 1").await.unwrap();

        mock.assert();
        assert_eq!(row, Some(vec!["1".to_string()]));
    }

    #[tokio::test]
    async fn test_query_first_auth_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/v2/statements");
            then.status(401)
                .body(r#"{ "message": "Invalid OAuth access token" }"#);
        });

        let client =
            HttpWarehouse::new("test", test_profile(Some(server.base_url()))).unwrap();
        let err = client.query_first("SELECT 1").await.unwrap_err();

        match err {
            SmokeflowError::AuthFailed { message, .. } => {
                assert!(message.contains("Invalid OAuth access token"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
