// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! External service clients
//!
//! Capability traits for the three external systems the workflow touches,
//! plus their HTTP/OpenDAL-backed implementations. These are the only
//! modules that perform network calls.

mod object_store;
mod query_engine;
mod warehouse;

pub use object_store::OpendalObjectStore;
pub use query_engine::{CompletedJob, HttpQueryEngine, JobHandle, QueryJobRequest, ResultSet};
pub use warehouse::HttpWarehouse;

use async_trait::async_trait;

use crate::errors::SmokeflowResult;
use crate::workflow::{Row, TableRef};

/// Synchronous SQL warehouse: accepts a statement, returns the first row
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Run a statement and return the first result row, if any
    async fn query_first(&self, sql: &str) -> SmokeflowResult<Option<Vec<String>>>;
}

/// Bucket-based binary storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write an object; overwrites silently
    async fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> SmokeflowResult<()>;

    /// Read an object back, `None` when absent
    async fn get(&self, bucket: &str, key: &str) -> SmokeflowResult<Option<Vec<u8>>>;
}

/// Asynchronous, job-based SQL execution service
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Submit a query job; returns as soon as the job is acknowledged
    async fn submit(&self, job: &QueryJobRequest) -> SmokeflowResult<JobHandle>;

    /// Block until the job reaches a terminal state
    async fn wait(&self, handle: &JobHandle) -> SmokeflowResult<CompletedJob>;

    /// Fetch the result rows of a completed query job
    async fn fetch_rows(&self, handle: &JobHandle) -> SmokeflowResult<ResultSet>;
}

/// Administrative surface of the warehouse behind the query engine:
/// DDL execution and bulk row insertion
#[async_trait]
pub trait WarehouseAdmin: Send + Sync {
    /// Execute a DDL statement synchronously (submit and wait)
    async fn execute_ddl(
        &self,
        sql: &str,
        project: &str,
        location: &str,
    ) -> SmokeflowResult<JobHandle>;

    /// Append rows to a table; returns the number of rows accepted
    async fn insert_all(&self, table: &TableRef, rows: &[Row]) -> SmokeflowResult<usize>;
}
