// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Object-store client
//!
//! OpenDAL operators keyed by bucket, one provider per profile. The memory
//! provider exists so tests can exercise the upload path without a network.

use async_trait::async_trait;
use opendal::{ErrorKind, Operator};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use super::ObjectStore;
use crate::errors::{SmokeflowError, SmokeflowResult};
use crate::profiles::{resolve_secret, ObjectStoreProfile, ObjectStoreProvider};

const SERVICE: &str = "object store";

/// OpenDAL-backed object store
pub struct OpendalObjectStore {
    profile_name: String,
    profile: ObjectStoreProfile,
    operators: Mutex<HashMap<String, Operator>>,
}

impl OpendalObjectStore {
    /// Build a store from a resolved profile
    pub fn new(profile_name: &str, profile: ObjectStoreProfile) -> Self {
        Self {
            profile_name: profile_name.to_string(),
            profile,
            operators: Mutex::new(HashMap::new()),
        }
    }

    /// Get or build the operator for a bucket
    fn operator(&self, bucket: &str) -> SmokeflowResult<Operator> {
        let mut operators = self.operators.lock().expect("operator cache poisoned");

        if let Some(op) = operators.get(bucket) {
            return Ok(op.clone());
        }

        let op = self.build_operator(bucket)?;
        operators.insert(bucket.to_string(), op.clone());
        Ok(op)
    }

    fn build_operator(&self, bucket: &str) -> SmokeflowResult<Operator> {
        let op = match self.profile.provider {
            ObjectStoreProvider::Gcs => {
                let mut builder = opendal::services::Gcs::default().bucket(bucket);

                if self.profile.credential.is_some() || self.profile.credential_env.is_some() {
                    let path = resolve_secret(
                        &self.profile_name,
                        &self.profile.credential,
                        &self.profile.credential_env,
                    )?;
                    builder = builder.credential_path(&path);
                }
                if let Some(endpoint) = &self.profile.endpoint {
                    builder = builder.endpoint(endpoint);
                }

                Operator::new(builder).map_err(|e| self.config_error(e))?.finish()
            }

            ObjectStoreProvider::S3 => {
                let mut builder = opendal::services::S3::default().bucket(bucket);

                // Keys come from the standard credential chain; the profile
                // only pins placement.
                if let Some(region) = &self.profile.region {
                    builder = builder.region(region);
                }
                if let Some(endpoint) = &self.profile.endpoint {
                    builder = builder.endpoint(endpoint);
                }

                Operator::new(builder).map_err(|e| self.config_error(e))?.finish()
            }

            ObjectStoreProvider::Fs => {
                let root = self.profile.root.as_deref().unwrap_or(".");
                let builder =
                    opendal::services::Fs::default().root(&format!("{}/{}", root, bucket));

                Operator::new(builder).map_err(|e| self.config_error(e))?.finish()
            }

            ObjectStoreProvider::Memory => {
                let builder = opendal::services::Memory::default();
                Operator::new(builder).map_err(|e| self.config_error(e))?.finish()
            }
        };

        Ok(op)
    }

    fn config_error(&self, error: opendal::Error) -> SmokeflowError {
        SmokeflowError::InvalidProfile {
            name: self.profile_name.clone(),
            reason: error.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for OpendalObjectStore {
    async fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> SmokeflowResult<()> {
        let op = self.operator(bucket)?;

        debug!(bucket = %bucket, key = %key, len = bytes.len(), "object store write");

        op.write(key, bytes.to_vec())
            .await
            .map(|_| ())
            .map_err(|e| map_store_error(bucket, key, e))
    }

    async fn get(&self, bucket: &str, key: &str) -> SmokeflowResult<Option<Vec<u8>>> {
        let op = self.operator(bucket)?;

        match op.read(key).await {
            Ok(buffer) => Ok(Some(buffer.to_vec())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_store_error(bucket, key, e)),
        }
    }
}

fn map_store_error(bucket: &str, key: &str, error: opendal::Error) -> SmokeflowError {
    match error.kind() {
        ErrorKind::NotFound => SmokeflowError::ResourceNotFound {
            service: SERVICE.to_string(),
            resource: format!("bucket '{}' or object '{}'", bucket, key),
            help: Some("Check that the bucket exists and the key prefix is writable".to_string()),
        },
        ErrorKind::PermissionDenied => SmokeflowError::AuthFailed {
            service: SERVICE.to_string(),
            message: error.to_string(),
        },
        _ => SmokeflowError::Network {
            service: SERVICE.to_string(),
            message: error.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store() -> OpendalObjectStore {
        OpendalObjectStore::new(
            "memory_test",
            ObjectStoreProfile {
                provider: ObjectStoreProvider::Memory,
                credential: None,
                credential_env: None,
                endpoint: None,
                region: None,
                root: None,
            },
        )
    }

    #[tokio::test]
    async fn test_upload_round_trip() {
        let store = memory_store();
        let payload = b"airflow connection test";

        store
            .put("demo-bucket", "tmp/airflow_connection_test.txt", payload)
            .await
            .unwrap();

        let read = store
            .get("demo-bucket", "tmp/airflow_connection_test.txt")
            .await
            .unwrap();
        assert_eq!(read, Some(payload.to_vec()));
    }

    #[tokio::test]
    async fn test_missing_object_is_none() {
        let store = memory_store();
        let read = store.get("demo-bucket", "tmp/missing.txt").await.unwrap();
        assert_eq!(read, None);
    }

    #[tokio::test]
    async fn test_operator_cached_per_bucket() {
        let store = memory_store();

        store.put("bucket-a", "k", b"a").await.unwrap();
        store.put("bucket-b", "k", b"b").await.unwrap();

        // Buckets are isolated operators
        assert_eq!(store.get("bucket-a", "k").await.unwrap(), Some(b"a".to_vec()));
        assert_eq!(store.get("bucket-b", "k").await.unwrap(), Some(b"b".to_vec()));
    }
}
