// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Store operations.
//!
//! Every variant runs the same sequence: resolve the bucket, validate the
//! payload, resolve the id, refuse an existing key, hash the original bytes,
//! optionally seal them in an envelope, upload. The existence check runs
//! before any key is generated or byte is written.

use std::borrow::Cow;

use base64ct::{Base64, Encoding};

use super::{ServiceError, ServiceResult, VaultService};
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::identity::{self, JSON_EXTENSION};
use crate::models::{CredentialResponse, DocumentRequest, StoreResponse};

const JSON_CONTENT_TYPE: &str = "application/json";

const DOCUMENT_EXISTS: &str = "A document with the provided ID already exists in the specified bucket.";
const FILE_EXISTS: &str = "A file with the provided ID already exists in the specified bucket.";

/// A binary payload with its declared MIME type.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileUpload<'a> {
    pub bucket: Option<&'a str>,
    pub id: Option<&'a str>,
    pub file: Option<&'a [u8]>,
    pub mime_type: Option<&'a str>,
}

/// Whether the payload is stored as-is or inside an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sealing {
    Plain,
    /// Envelope with `contentType`.
    Envelope,
    /// Envelope without `contentType`.
    Credential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BucketRule {
    FallbackToDefault,
    Explicit,
}

struct Stored {
    uri: String,
    hash: String,
    key: Option<String>,
}

impl From<Stored> for StoreResponse {
    fn from(stored: Stored) -> Self {
        StoreResponse {
            uri: stored.uri,
            hash: stored.hash,
            decryption_key: stored.key,
        }
    }
}

impl VaultService {
    pub async fn store_public_document(&self, request: &DocumentRequest) -> Result<StoreResponse, ApiError> {
        self.put_document(request, BucketRule::FallbackToDefault, Sealing::Plain)
            .await
            .map(StoreResponse::from)
            .map_err(|e| {
                e.into_api(
                    "store_public_document",
                    "An unexpected error occurred while storing the document.",
                )
            })
    }

    pub async fn store_document(&self, request: &DocumentRequest) -> Result<StoreResponse, ApiError> {
        self.put_document(request, BucketRule::Explicit, Sealing::Plain)
            .await
            .map(StoreResponse::from)
            .map_err(|e| {
                e.into_api(
                    "store_document",
                    "An unexpected error occurred while storing the document.",
                )
            })
    }

    pub async fn store_private_document(&self, request: &DocumentRequest) -> Result<StoreResponse, ApiError> {
        self.put_document(request, BucketRule::FallbackToDefault, Sealing::Envelope)
            .await
            .map(StoreResponse::from)
            .map_err(|e| {
                e.into_api(
                    "store_private_document",
                    "An unexpected error occurred while encrypting and storing the document.",
                )
            })
    }

    /// Encrypted document returned with the key under `key`.
    pub async fn store_credential(&self, request: &DocumentRequest) -> Result<CredentialResponse, ApiError> {
        let stored = self
            .put_document(request, BucketRule::Explicit, Sealing::Credential)
            .await
            .map_err(|e| {
                e.into_api(
                    "store_credential",
                    "An unexpected error occurred while encrypting and storing the document.",
                )
            })?;
        let key = stored
            .key
            .ok_or_else(|| ApiError::application("An unexpected error occurred while encrypting and storing the document."))?;
        Ok(CredentialResponse {
            uri: stored.uri,
            hash: stored.hash,
            key,
        })
    }

    pub async fn store_public_file(&self, upload: FileUpload<'_>) -> Result<StoreResponse, ApiError> {
        self.put_file(upload, BucketRule::FallbackToDefault, Sealing::Plain)
            .await
            .map(StoreResponse::from)
            .map_err(|e| {
                e.into_api(
                    "store_public_file",
                    "An unexpected error occurred while storing the file.",
                )
            })
    }

    pub async fn store_file(&self, upload: FileUpload<'_>) -> Result<StoreResponse, ApiError> {
        self.put_file(upload, BucketRule::Explicit, Sealing::Plain)
            .await
            .map(StoreResponse::from)
            .map_err(|e| e.into_api("store_file", "An unexpected error occurred while storing the file."))
    }

    pub async fn store_private_file(&self, upload: FileUpload<'_>) -> Result<StoreResponse, ApiError> {
        self.put_file(upload, BucketRule::FallbackToDefault, Sealing::Envelope)
            .await
            .map(StoreResponse::from)
            .map_err(|e| {
                e.into_api(
                    "store_private_file",
                    "An unexpected error occurred while encrypting and storing the file.",
                )
            })
    }

    // ========== Shared sequence ==========

    fn bucket_for(&self, bucket: Option<&str>, rule: BucketRule) -> Result<String, ApiError> {
        match rule {
            BucketRule::FallbackToDefault => self.policy.resolve_bucket(bucket),
            BucketRule::Explicit => self.policy.require_bucket(bucket),
        }
    }

    async fn refuse_existing(&self, bucket: &str, key: &str, message: &'static str) -> ServiceResult<()> {
        if self.storage.object_exists(bucket, key).await? {
            return Err(ApiError::conflict(message).into());
        }
        Ok(())
    }

    async fn put_document(
        &self,
        request: &DocumentRequest,
        rule: BucketRule,
        sealing: Sealing,
    ) -> ServiceResult<Stored> {
        let bucket = self.bucket_for(request.bucket.as_deref(), rule)?;
        let data = self.policy.require_json_object(request.data.as_ref())?;
        let id = self.policy.resolve_id(request.id.as_deref())?;
        let key = format!("{id}.{JSON_EXTENSION}");

        async {
            self.refuse_existing(&bucket, &key, DOCUMENT_EXISTS).await?;

            let text = serde_json::to_string(data)?;
            let hash = self.crypto.compute_hash(text.as_bytes());

            let (body, decryption_key) = match sealing {
                Sealing::Plain => (text.into_bytes(), None),
                Sealing::Envelope => self.seal(&text, Some(JSON_CONTENT_TYPE))?,
                Sealing::Credential => self.seal(&text, None)?,
            };

            let stored = self
                .storage
                .upload_file(&bucket, &key, &body, JSON_CONTENT_TYPE)
                .await?;
            Ok::<_, ServiceError>(Stored {
                uri: stored.uri,
                hash,
                key: decryption_key,
            })
        }
        .await
        .map_err(|e| e.at(&bucket, &key))
    }

    async fn put_file(
        &self,
        upload: FileUpload<'_>,
        rule: BucketRule,
        sealing: Sealing,
    ) -> ServiceResult<Stored> {
        let bucket = self.bucket_for(upload.bucket, rule)?;
        let file = upload
            .file
            .ok_or_else(|| ApiError::bad_request("File is required. Please provide a file."))?;
        let mime_type = self.policy.require_allowed_mime(upload.mime_type)?;
        let id = self.policy.resolve_id(upload.id)?;

        let key = match sealing {
            Sealing::Plain => format!("{id}.{}", identity::extension_for_mime(mime_type)?),
            Sealing::Envelope | Sealing::Credential => format!("{id}.{JSON_EXTENSION}"),
        };

        async {
            self.refuse_existing(&bucket, &key, FILE_EXISTS).await?;

            let hash = self.crypto.compute_hash(file);

            let (body, content_type, decryption_key) = match sealing {
                Sealing::Plain => (Cow::Borrowed(file), mime_type, None),
                Sealing::Envelope | Sealing::Credential => {
                    let (sealed, key) = self.seal(&Base64::encode_string(file), Some(mime_type))?;
                    (Cow::Owned(sealed), JSON_CONTENT_TYPE, key)
                }
            };

            let stored = self
                .storage
                .upload_file(&bucket, &key, &body, content_type)
                .await?;
            Ok::<_, ServiceError>(Stored {
                uri: stored.uri,
                hash,
                key: decryption_key,
            })
        }
        .await
        .map_err(|e| e.at(&bucket, &key))
    }

    /// Fresh key, encrypted envelope bytes.
    fn seal(&self, plaintext: &str, content_type: Option<&str>) -> ServiceResult<(Vec<u8>, Option<String>)> {
        let key = self.crypto.generate_encryption_key();
        let envelope = Envelope::seal(&self.crypto, plaintext, &key, content_type)?;
        Ok((envelope.to_bytes()?, Some(key)))
    }
}
