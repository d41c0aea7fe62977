// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Object-store upload probe
//!
//! Writes a small fixed payload to a bucket to prove write access.

use async_trait::async_trait;

use super::{Probe, ProbeReport};
use crate::clients::ObjectStore;
use crate::errors::{SmokeflowError, SmokeflowResult};
use crate::workflow::{Check, Target};

/// Probe for the object-store write check
pub struct ObjectStoreUploadProbe {
    store: Box<dyn ObjectStore>,
}

impl ObjectStoreUploadProbe {
    pub fn new(store: Box<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Probe for ObjectStoreUploadProbe {
    async fn run(&self, check: &Check) -> SmokeflowResult<ProbeReport> {
        let Target::ObjectStoreUpload { bucket, key, payload } = &check.target else {
            return Err(SmokeflowError::InvalidCheck {
                check: check.name.clone(),
                reason: "expected an object_store_upload target".to_string(),
            });
        };

        self.store.put(bucket, key, payload.as_bytes()).await?;

        Ok(ProbeReport::new(format!(
            "uploaded {}/{} ({} bytes)",
            bucket,
            key,
            payload.len()
        )))
    }

    fn target(&self) -> &'static str {
        "object_store_upload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::OpendalObjectStore;
    use crate::profiles::{ObjectStoreProfile, ObjectStoreProvider};
    use std::sync::{Arc, Mutex};

    fn upload_check() -> Check {
        Check {
            name: "bucket".into(),
            description: None,
            profile: "store".into(),
            target: Target::ObjectStoreUpload {
                bucket: "demo-bucket".into(),
                key: "tmp/airflow_connection_test.txt".into(),
                payload: "airflow connection test".into(),
            },
            depends_on: vec![],
        }
    }

    #[tokio::test]
    async fn test_upload_writes_payload() {
        let store = OpendalObjectStore::new(
            "memory_test",
            ObjectStoreProfile {
                provider: ObjectStoreProvider::Memory,
                credential: None,
                credential_env: None,
                endpoint: None,
                region: None,
                root: None,
            },
        );
        let probe = ObjectStoreUploadProbe::new(Box::new(store));

        let report = probe.run(&upload_check()).await.unwrap();
        assert_eq!(
            report.detail,
            "uploaded demo-bucket/tmp/airflow_connection_test.txt (23 bytes)"
        );
    }

    #[tokio::test]
    async fn test_upload_content_matches_payload() {
        let written: Arc<Mutex<Vec<(String, String, Vec<u8>)>>> = Arc::default();

        struct RecordingStore {
            written: Arc<Mutex<Vec<(String, String, Vec<u8>)>>>,
        }

        #[async_trait]
        impl ObjectStore for RecordingStore {
            async fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> SmokeflowResult<()> {
                self.written.lock().unwrap().push((
                    bucket.to_string(),
                    key.to_string(),
                    bytes.to_vec(),
                ));
                Ok(())
            }

            async fn get(&self, _bucket: &str, _key: &str) -> SmokeflowResult<Option<Vec<u8>>> {
                Ok(None)
            }
        }

        let probe = ObjectStoreUploadProbe::new(Box::new(RecordingStore {
            written: Arc::clone(&written),
        }));
        probe.run(&upload_check()).await.unwrap();

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0, "demo-bucket");
        assert_eq!(written[0].1, "tmp/airflow_connection_test.txt");
        assert_eq!(written[0].2, b"airflow connection test".to_vec());
    }
}
