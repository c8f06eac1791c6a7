// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Backends
//!
//! Objects are persisted as opaque bytes under `(bucket, key)` on one of three
//! providers, selected once at startup:
//!
//! - **Local** - flat per-bucket directories under `LOCAL_DIRECTORY`
//! - **S3** - AWS S3 or any S3-compatible store (MinIO, Spaces, R2, ...)
//! - **GCS** - Google Cloud Storage
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//!   {bucket}/
//!     {id}.json     # plain document or encrypted envelope
//!     {id}.png      # public binary upload
//! ```
//!
//! ## Important Notes
//!
//! - Backends never refuse to overwrite. Callers check `object_exists` first,
//!   which is best effort: two concurrent writers of one key can both pass
//!   the check and the last write wins.
//! - Keys are single path segments; nested keys are rejected.

pub mod local;
pub mod remote;
pub mod uri;

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::AppConfig;

pub use local::LocalStorage;
pub use remote::{Addressing, ObjectStorage, StoreFactory};
pub use uri::{BaseUrl, InvalidUrl, ServiceAddress};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error on the local filesystem
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Error reported by a remote object store
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),
    /// Bucket or key is not a single safe path segment
    #[error("invalid object key: {0}")]
    InvalidKey(String),
}

impl StorageError {
    /// Whether the object was already gone.
    pub fn is_not_found(&self) -> bool {
        match self {
            StorageError::Io(e) => e.kind() == io::ErrorKind::NotFound,
            StorageError::ObjectStore(object_store::Error::NotFound { .. }) => true,
            _ => false,
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Provider selection and provider-specific settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Local {
        directory: PathBuf,
    },
    S3 {
        region: String,
        endpoint: Option<BaseUrl>,
        force_path_style: bool,
    },
    Gcs,
}

/// Outcome of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub uri: String,
}

/// The configured storage provider.
pub enum StorageBackend {
    Local(LocalStorage),
    S3(ObjectStorage),
    Gcs(ObjectStorage),
}

impl StorageBackend {
    /// Build the backend named by the configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let public_url = config.public_url.clone();
        match &config.storage {
            StorageConfig::Local { directory } => StorageBackend::Local(LocalStorage::new(
                directory,
                config.service_address(),
                config.api_version.clone(),
                public_url,
            )),
            StorageConfig::S3 {
                region,
                endpoint,
                force_path_style,
            } => StorageBackend::S3(ObjectStorage::s3(
                region.clone(),
                endpoint.clone(),
                *force_path_style,
                public_url,
            )),
            StorageConfig::Gcs => StorageBackend::Gcs(ObjectStorage::gcs(public_url)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StorageBackend::Local(_) => "local",
            StorageBackend::S3(_) => "s3",
            StorageBackend::Gcs(_) => "gcs",
        }
    }

    /// Root directory of the local backend, if that is the active provider.
    pub fn local_root(&self) -> Option<&Path> {
        match self {
            StorageBackend::Local(local) => Some(local.root()),
            _ => None,
        }
    }

    pub async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        content_type: &str,
    ) -> StorageResult<StoredObject> {
        check_segments(bucket, key)?;
        match self {
            StorageBackend::Local(local) => local.upload_file(bucket, key, body).await?,
            StorageBackend::S3(remote) | StorageBackend::Gcs(remote) => {
                remote.upload_file(bucket, key, body, content_type).await?
            }
        }
        tracing::info!(backend = self.name(), bucket, key, "Object uploaded");
        Ok(StoredObject {
            uri: self.derive_uri(bucket, key),
        })
    }

    pub async fn object_exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        check_segments(bucket, key)?;
        match self {
            StorageBackend::Local(local) => local.object_exists(bucket, key).await,
            StorageBackend::S3(remote) | StorageBackend::Gcs(remote) => {
                remote.object_exists(bucket, key).await
            }
        }
    }

    pub async fn list_objects_by_prefix(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> StorageResult<Vec<String>> {
        check_segment(bucket)?;
        match self {
            StorageBackend::Local(local) => local.list_objects_by_prefix(bucket, prefix).await,
            StorageBackend::S3(remote) | StorageBackend::Gcs(remote) => {
                remote.list_objects_by_prefix(bucket, prefix).await
            }
        }
    }

    pub async fn delete_file(&self, bucket: &str, key: &str) -> StorageResult<()> {
        check_segments(bucket, key)?;
        match self {
            StorageBackend::Local(local) => local.delete_file(bucket, key).await?,
            StorageBackend::S3(remote) | StorageBackend::Gcs(remote) => {
                remote.delete_file(bucket, key).await?
            }
        }
        tracing::info!(backend = self.name(), bucket, key, "Object deleted");
        Ok(())
    }

    pub fn derive_uri(&self, bucket: &str, key: &str) -> String {
        match self {
            StorageBackend::Local(local) => local.derive_uri(bucket, key),
            StorageBackend::S3(remote) | StorageBackend::Gcs(remote) => {
                remote.derive_uri(bucket, key)
            }
        }
    }
}

fn check_segment(segment: &str) -> StorageResult<()> {
    let unsafe_segment = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0']);
    if unsafe_segment {
        return Err(StorageError::InvalidKey(segment.to_string()));
    }
    Ok(())
}

fn check_segments(bucket: &str, key: &str) -> StorageResult<()> {
    check_segment(bucket)?;
    check_segment(key)
}
