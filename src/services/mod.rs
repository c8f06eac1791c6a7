// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Orchestration
//!
//! [`VaultService`] composes identity validation, hashing, encryption and the
//! storage backend into the operations exposed by the API:
//!
//! | Operation | Bucket | Stored as |
//! |-----------|--------|-----------|
//! | `store_public_document` / `store_document` | default / explicit | `{id}.json` |
//! | `store_public_file` / `store_file` | default / explicit | `{id}.{ext}` |
//! | `store_private_document` | default | `{id}.json` envelope |
//! | `store_private_file` | default | `{id}.json` envelope |
//! | `store_credential` | explicit | `{id}.json` envelope, no `contentType` |
//! | `delete_object` | explicit | - |
//!
//! Validation failures, conflicts and missing objects come back as typed
//! [`ApiError`]s. Any other failure is logged with its cause and replaced by a
//! generic [`ApiError::Application`] so internals never reach the client.

mod delete;
mod store;

use std::sync::Arc;

use crate::crypto::CryptographyService;
use crate::envelope::EnvelopeError;
use crate::error::ApiError;
use crate::identity::IdentityPolicy;
use crate::storage::{StorageBackend, StorageError};

pub use store::FileUpload;

/// Failure inside an orchestrated operation.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("storage: {0}")]
    Storage(#[from] StorageError),
    #[error("envelope: {0}")]
    Envelope(#[from] EnvelopeError),
    #[error("serialization: {0}")]
    Json(#[from] serde_json::Error),
    /// A failure once the target object is known.
    #[error("{bucket}/{key}: {source}")]
    Object {
        bucket: String,
        key: String,
        source: Box<ServiceError>,
    },
}

impl ServiceError {
    /// Attach the object a failure happened on. Typed API errors and
    /// already located failures are returned unchanged.
    fn at(self, bucket: &str, key: &str) -> Self {
        match self {
            ServiceError::Api(_) | ServiceError::Object { .. } => self,
            other => ServiceError::Object {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Convert at the service boundary.
    fn into_api(self, operation: &'static str, message: &'static str) -> ApiError {
        let (bucket, key, cause) = match self {
            ServiceError::Object {
                bucket,
                key,
                source,
            } => (Some(bucket), Some(key), *source),
            other => (None, None, other),
        };
        match cause {
            ServiceError::Api(err) => {
                tracing::debug!(
                    operation,
                    bucket = bucket.as_deref(),
                    key = key.as_deref(),
                    error = %err,
                    "Request rejected"
                );
                err
            }
            other => {
                tracing::error!(
                    operation,
                    bucket = bucket.as_deref(),
                    key = key.as_deref(),
                    error = %other,
                    "Operation failed"
                );
                ApiError::application(message)
            }
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Orchestrates validation, encryption and persistence.
#[derive(Clone)]
pub struct VaultService {
    storage: Arc<StorageBackend>,
    policy: Arc<IdentityPolicy>,
    crypto: CryptographyService,
}

impl VaultService {
    pub fn new(storage: Arc<StorageBackend>, policy: Arc<IdentityPolicy>) -> Self {
        Self {
            storage,
            policy,
            crypto: CryptographyService::new(),
        }
    }

    pub fn storage(&self) -> &StorageBackend {
        &self.storage
    }

    pub fn policy(&self) -> &IdentityPolicy {
        &self.policy
    }

    pub fn crypto(&self) -> &CryptographyService {
        &self.crypto
    }
}
