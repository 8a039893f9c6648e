//! Store connection configuration.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use object_store::local::LocalFileSystem;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET;
use crate::backend::ObjectStoreRemote;
use crate::error::{StoreError, StoreResult};

/// Supported storage backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Directory on the local filesystem.
    #[default]
    Local,
    /// Amazon S3 or any S3-compatible service.
    S3,
}

/// Object store connection configuration.
///
/// # Environment Variables
///
/// - `SWEEP_BACKEND` - Storage backend (`local` or `s3`)
/// - `SWEEP_CONTAINER` - Bucket name (S3) or display name (local)
/// - `SWEEP_ROOT` - Root directory for the local backend
/// - `SWEEP_S3_REGION`, `SWEEP_S3_ENDPOINT` - S3 location
/// - `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_SESSION_TOKEN` - S3 credentials
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct StoreConfig {
    /// Storage backend to connect to.
    #[arg(long, env = "SWEEP_BACKEND", value_enum, default_value_t = BackendKind::Local)]
    #[serde(default)]
    pub backend: BackendKind,

    /// Container to operate on: the bucket name for S3.
    #[arg(long, env = "SWEEP_CONTAINER")]
    pub container: String,

    /// Root directory of the local backend.
    #[arg(long, env = "SWEEP_ROOT")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// S3 region.
    #[arg(long, env = "SWEEP_S3_REGION", default_value = "us-east-1")]
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom S3 endpoint (MinIO, R2, ...).
    #[arg(long, env = "SWEEP_S3_ENDPOINT")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// S3 access key id.
    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    #[serde(default, skip_serializing)]
    pub access_key_id: Option<String>,

    /// S3 secret access key.
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    #[serde(default, skip_serializing)]
    pub secret_access_key: Option<String>,

    /// S3 session token for temporary credentials.
    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    #[serde(default, skip_serializing)]
    pub session_token: Option<String>,

    /// Allow plain HTTP endpoints.
    #[arg(long, env = "SWEEP_ALLOW_HTTP", default_value_t = false)]
    #[serde(default)]
    pub allow_http: bool,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl StoreConfig {
    /// Creates a local filesystem configuration rooted at `root`.
    pub fn local(container: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendKind::Local,
            container: container.into(),
            root: Some(root.into()),
            region: default_region(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            allow_http: false,
        }
    }

    /// Creates an S3 configuration for `bucket`.
    pub fn s3(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            backend: BackendKind::S3,
            region: region.into(),
            root: None,
            ..Self::local(bucket, PathBuf::new())
        }
    }

    /// Sets the custom endpoint (for S3-compatible storage).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the access credentials.
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Validates backend-specific settings.
    pub fn validate(&self) -> StoreResult<()> {
        if self.container.trim().is_empty() {
            return Err(StoreError::other("container name cannot be empty"));
        }

        match self.backend {
            BackendKind::Local if self.root.is_none() => {
                Err(StoreError::other("the local backend requires a root directory"))
            }
            BackendKind::S3 if self.access_key_id.is_some() != self.secret_access_key.is_some() => {
                Err(StoreError::other(
                    "S3 access key id and secret access key must be set together",
                ))
            }
            _ => Ok(()),
        }
    }

    /// Builds the remote store described by this configuration.
    pub fn connect(&self) -> StoreResult<ObjectStoreRemote> {
        self.validate()?;

        let remote = match self.backend {
            BackendKind::Local => self.connect_local()?,
            BackendKind::S3 => self.connect_s3()?,
        };

        tracing::info!(
            target: TRACING_TARGET,
            backend = ?self.backend,
            container = %self.container,
            "Object store connected"
        );

        Ok(remote)
    }

    fn connect_local(&self) -> StoreResult<ObjectStoreRemote> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| StoreError::other("the local backend requires a root directory"))?;

        let store = LocalFileSystem::new_with_prefix(root).map_err(|e| {
            StoreError::other(format!("cannot open {}: {e}", root.display())).with_source(e)
        })?;

        Ok(ObjectStoreRemote::new(self.container.as_str(), store).with_ordered_listing(false))
    }

    #[cfg(feature = "s3")]
    fn connect_s3(&self) -> StoreResult<ObjectStoreRemote> {
        use object_store::aws::AmazonS3Builder;

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&self.container)
            .with_region(&self.region)
            .with_allow_http(self.allow_http);

        if let Some(endpoint) = &self.endpoint {
            builder = builder.with_endpoint(endpoint);
        }

        if let Some(access_key) = &self.access_key_id {
            builder = builder.with_access_key_id(access_key);
        }

        if let Some(secret_key) = &self.secret_access_key {
            builder = builder.with_secret_access_key(secret_key);
        }

        if let Some(token) = &self.session_token {
            builder = builder.with_token(token);
        }

        let store = builder
            .build()
            .map_err(|e| StoreError::other(format!("cannot build S3 client: {e}")).with_source(e))?;

        Ok(ObjectStoreRemote::new(self.container.as_str(), store))
    }

    #[cfg(not(feature = "s3"))]
    fn connect_s3(&self) -> StoreResult<ObjectStoreRemote> {
        Err(StoreError::unsupported(
            "the S3 backend is not enabled in this build",
        ))
    }
}
