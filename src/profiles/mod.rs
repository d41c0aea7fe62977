// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Connection-profile resolution
//!
//! Workflow checks reference profiles by name; the credential material lives
//! in a TOML file (or in environment variables the file points at) and is
//! resolved here. Secrets never appear in the workflow definition.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::errors::{SmokeflowError, SmokeflowResult};

/// Environment variable overriding the profiles file location
pub const PROFILES_ENV: &str = "SMOKEFLOW_PROFILES";

/// File layout: a single `[profiles.<name>]` table per profile
#[derive(Debug, Deserialize)]
struct ProfilesFile {
    #[serde(default)]
    profiles: HashMap<String, Profile>,
}

/// A named connection profile
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Profile {
    Warehouse(WarehouseProfile),
    ObjectStore(ObjectStoreProfile),
    QueryEngine(QueryEngineProfile),
}

impl Profile {
    /// Profile kind as shown in listings and mismatch errors
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Warehouse(_) => "warehouse",
            Self::ObjectStore(_) => "object_store",
            Self::QueryEngine(_) => "query_engine",
        }
    }
}

/// Credentials for the SQL warehouse REST API
#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseProfile {
    /// Account identifier, used to derive the endpoint when none is given
    pub account: String,

    /// User the statements run as
    pub user: String,

    /// Bearer token, inline
    #[serde(default)]
    pub token: Option<String>,

    /// Bearer token, read from this environment variable
    #[serde(default)]
    pub token_env: Option<String>,

    /// Endpoint override (primarily for tests)
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub warehouse: Option<String>,

    #[serde(default)]
    pub database: Option<String>,

    #[serde(default)]
    pub schema: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Credentials and placement for the object store
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStoreProfile {
    /// Backing provider
    pub provider: ObjectStoreProvider,

    /// Credential file path, inline
    #[serde(default)]
    pub credential: Option<String>,

    /// Credential file path, read from this environment variable
    #[serde(default)]
    pub credential_env: Option<String>,

    /// Endpoint override (S3-compatible stores, emulators)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Region (S3)
    #[serde(default)]
    pub region: Option<String>,

    /// Root directory (filesystem provider)
    #[serde(default)]
    pub root: Option<String>,
}

/// Supported object-store providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectStoreProvider {
    Gcs,
    S3,
    Fs,
    /// In-process store, for tests
    Memory,
}

/// Credentials for the asynchronous query engine
#[derive(Debug, Clone, Deserialize)]
pub struct QueryEngineProfile {
    /// Bearer token, inline
    #[serde(default)]
    pub token: Option<String>,

    /// Bearer token, read from this environment variable
    #[serde(default)]
    pub token_env: Option<String>,

    /// API endpoint override (primarily for tests)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Delay between job-status polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Give up waiting for a job after this long
    #[serde(default = "default_max_poll_secs")]
    pub max_poll_secs: u64,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_poll_secs() -> u64 {
    300
}

/// Resolve a secret that may be inline or indirected through the environment
pub fn resolve_secret(
    profile_name: &str,
    inline: &Option<String>,
    env_var: &Option<String>,
) -> SmokeflowResult<String> {
    if let Some(value) = inline {
        return Ok(value.clone());
    }

    if let Some(var) = env_var {
        return std::env::var(var).map_err(|_| SmokeflowError::MissingSecret {
            name: profile_name.to_string(),
            var: var.clone(),
        });
    }

    Err(SmokeflowError::InvalidProfile {
        name: profile_name.to_string(),
        reason: "neither an inline secret nor an _env indirection is set".to_string(),
    })
}

/// Loaded profile store
#[derive(Debug)]
pub struct ProfileStore {
    profiles: HashMap<String, Profile>,
    path: PathBuf,
}

impl ProfileStore {
    /// Load profiles from a TOML file
    pub fn from_file(path: &Path) -> SmokeflowResult<Self> {
        if !path.exists() {
            return Err(SmokeflowError::ProfilesNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            SmokeflowError::FileReadError {
                path: path.to_path_buf(),
                error: e.to_string(),
            }
        })?;

        Self::from_toml(&content, path.to_path_buf())
    }

    /// Parse profiles from a TOML string
    pub fn from_toml(content: &str, path: PathBuf) -> SmokeflowResult<Self> {
        let file: ProfilesFile = toml::from_str(content)?;
        Ok(Self {
            profiles: file.profiles,
            path,
        })
    }

    /// Default profiles path: `$SMOKEFLOW_PROFILES`, else the per-user config dir
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(PROFILES_ENV) {
            return PathBuf::from(path);
        }

        directories::ProjectDirs::from("", "", "smokeflow")
            .map(|dirs| dirs.config_dir().join("profiles.toml"))
            .unwrap_or_else(|| PathBuf::from("profiles.toml"))
    }

    /// Where this store was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All profile names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look up a profile by name
    pub fn get(&self, name: &str) -> SmokeflowResult<&Profile> {
        self.profiles.get(name).ok_or_else(|| {
            let known = self.names().join(", ");
            SmokeflowError::ProfileNotFound {
                name: name.to_string(),
                known: if known.is_empty() { "(none)".to_string() } else { known },
            }
        })
    }

    /// Resolve a warehouse profile
    pub fn warehouse(&self, name: &str) -> SmokeflowResult<&WarehouseProfile> {
        match self.get(name)? {
            Profile::Warehouse(p) => Ok(p),
            other => Err(SmokeflowError::ProfileKindMismatch {
                name: name.to_string(),
                expected: "warehouse",
                actual: other.kind(),
            }),
        }
    }

    /// Resolve an object-store profile
    pub fn object_store(&self, name: &str) -> SmokeflowResult<&ObjectStoreProfile> {
        match self.get(name)? {
            Profile::ObjectStore(p) => Ok(p),
            other => Err(SmokeflowError::ProfileKindMismatch {
                name: name.to_string(),
                expected: "object_store",
                actual: other.kind(),
            }),
        }
    }

    /// Resolve a query-engine profile
    pub fn query_engine(&self, name: &str) -> SmokeflowResult<&QueryEngineProfile> {
        match self.get(name)? {
            Profile::QueryEngine(p) => Ok(p),
            other => Err(SmokeflowError::ProfileKindMismatch {
                name: name.to_string(),
                expected: "query_engine",
                actual: other.kind(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[profiles.snowflake_default]
kind = "warehouse"
account = "xy12345"
user = "SMOKE"
token = "secret"

[profiles.gcs_default]
kind = "object_store"
provider = "gcs"
credential_env = "GOOGLE_APPLICATION_CREDENTIALS"

[profiles.google_cloud_default]
kind = "query_engine"
token_env = "GOOGLE_OAUTH_TOKEN"
poll_interval_ms = 250
"#;

    fn sample_store() -> ProfileStore {
        ProfileStore::from_toml(SAMPLE, PathBuf::from("profiles.toml")).unwrap()
    }

    #[test]
    fn test_parse_profiles() {
        let store = sample_store();
        assert_eq!(
            store.names(),
            vec!["gcs_default", "google_cloud_default", "snowflake_default"]
        );

        let wh = store.warehouse("snowflake_default").unwrap();
        assert_eq!(wh.account, "xy12345");
        assert_eq!(wh.user, "SMOKE");
        assert_eq!(wh.timeout_secs, 30);

        let qe = store.query_engine("google_cloud_default").unwrap();
        assert_eq!(qe.poll_interval_ms, 250);
        assert_eq!(qe.max_poll_secs, 300);

        let os = store.object_store("gcs_default").unwrap();
        assert_eq!(os.provider, ObjectStoreProvider::Gcs);
    }

    #[test]
    fn test_from_file_missing_path() {
        let err =
            ProfileStore::from_file(Path::new("/nonexistent/profiles.toml")).unwrap_err();
        assert!(matches!(err, SmokeflowError::ProfilesNotFound { .. }));
    }

    #[test]
    fn test_from_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let store = ProfileStore::from_file(&path).unwrap();
        assert_eq!(store.names().len(), 3);
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn test_unknown_profile_lists_known() {
        let store = sample_store();
        let err = store.get("missing").unwrap_err();
        match err {
            SmokeflowError::ProfileNotFound { known, .. } => {
                assert!(known.contains("snowflake_default"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_kind_mismatch() {
        let store = sample_store();
        let err = store.warehouse("gcs_default").unwrap_err();
        assert!(matches!(
            err,
            SmokeflowError::ProfileKindMismatch { expected: "warehouse", .. }
        ));
    }

    #[test]
    fn test_resolve_secret_inline_wins() {
        let secret = resolve_secret(
            "p",
            &Some("inline".to_string()),
            &Some("UNSET_VAR_XYZ".to_string()),
        )
        .unwrap();
        assert_eq!(secret, "inline");
    }

    #[test]
    fn test_resolve_secret_env() {
        std::env::set_var("SMOKEFLOW_TEST_SECRET", "from-env");
        let secret =
            resolve_secret("p", &None, &Some("SMOKEFLOW_TEST_SECRET".to_string())).unwrap();
        assert_eq!(secret, "from-env");
        std::env::remove_var("SMOKEFLOW_TEST_SECRET");
    }

    #[test]
    fn test_resolve_secret_missing_env() {
        let err = resolve_secret("p", &None, &Some("SMOKEFLOW_DEFINITELY_UNSET".to_string()))
            .unwrap_err();
        assert!(matches!(err, SmokeflowError::MissingSecret { .. }));
    }

    #[test]
    fn test_resolve_secret_nothing_configured() {
        let err = resolve_secret("p", &None, &None).unwrap_err();
        assert!(matches!(err, SmokeflowError::InvalidProfile { .. }));
    }
}
