// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local filesystem backend.
//!
//! Each bucket is a directory under the configured root and each object a
//! file named after its key. Intended for development and single-node
//! deployments; objects are served back by the API's static route.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::uri::{self, BaseUrl, ServiceAddress};
use super::StorageResult;

/// Object keys never start with a dot, so in-flight writes are never listed.
const TEMP_FILE_PREFIX: &str = ".upload-";

/// Filesystem storage rooted at a single directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    address: ServiceAddress,
    api_version: String,
    public_url: Option<BaseUrl>,
}

impl LocalStorage {
    pub fn new(
        root: impl AsRef<Path>,
        address: ServiceAddress,
        api_version: String,
        public_url: Option<BaseUrl>,
    ) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            address,
            api_version,
            public_url,
        }
    }

    /// Root directory for all buckets.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for a specific bucket.
    pub fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }

    /// Path to a specific object file.
    pub fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.bucket_dir(bucket).join(key)
    }

    /// Write an object, creating the bucket directory on first use.
    ///
    /// The body goes to a hidden temp sibling which is renamed over the key
    /// once fully written, so a failed write never leaves a partial object.
    /// The temp file is removed on every error path when its guard drops.
    pub async fn upload_file(&self, bucket: &str, key: &str, body: &[u8]) -> StorageResult<()> {
        let bucket_dir = self.bucket_dir(bucket);
        fs::create_dir_all(&bucket_dir).await?;

        let (file, temp_path) = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .tempfile_in(&bucket_dir)?
            .into_parts();
        let mut file = fs::File::from_std(file);
        file.write_all(body).await?;
        file.sync_all().await?;
        drop(file);

        temp_path
            .persist(self.object_path(bucket, key))
            .map_err(|e| e.error)?;
        Ok(())
    }

    pub async fn object_exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        match fs::metadata(self.object_path(bucket, key)).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// File names in the bucket directory starting with `prefix`.
    ///
    /// A bucket directory that does not exist yet simply has no objects.
    pub async fn list_objects_by_prefix(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> StorageResult<Vec<String>> {
        let mut entries = match fs::read_dir(self.bucket_dir(bucket)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with(prefix) {
                    keys.push(name.to_string());
                }
            }
        }
        Ok(keys)
    }

    pub async fn delete_file(&self, bucket: &str, key: &str) -> StorageResult<()> {
        fs::remove_file(self.object_path(bucket, key)).await?;
        Ok(())
    }

    pub fn derive_uri(&self, bucket: &str, key: &str) -> String {
        match &self.public_url {
            Some(public_url) => uri::override_uri(public_url, key),
            None => uri::local_uri(&self.address, &self.api_version, bucket, key),
        }
    }
}
