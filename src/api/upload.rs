// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request body extractors for the store routes.
//!
//! Multipart file parts are streamed into a temp file in the system temp
//! directory rather than buffered in memory. The temp file belongs to an
//! [`UploadedFile`] guard and is removed when the guard drops, on success and
//! on every error path alike.

use std::io;
use std::path::{Path, PathBuf};

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        FromRequest, Multipart, Request,
    },
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use tokio::io::AsyncWriteExt;

use crate::error::ApiError;
use crate::identity::IdentityPolicy;
use crate::models::DocumentRequest;
use crate::services::FileUpload;
use crate::state::AppState;

const TEMP_FILE_PREFIX: &str = "vault-upload-";

/// A received file part backed by a temp file.
#[derive(Debug)]
pub struct UploadedFile {
    path: PathBuf,
    mime_type: String,
    size: usize,
}

impl UploadedFile {
    fn new(path: PathBuf, mime_type: String) -> Self {
        Self {
            path,
            mime_type,
            size: 0,
        }
    }

    /// Stream a file part to disk, enforcing the MIME allow-list and size ceiling.
    async fn receive(
        mut field: Field<'_>,
        policy: &IdentityPolicy,
        max_size: usize,
    ) -> Result<Self, ApiError> {
        let mime_type = field.content_type().unwrap_or_default().to_string();
        let allowed = policy.allowed_mime_types();
        if !allowed.iter().any(|a| *a == mime_type) {
            return Err(ApiError::bad_request(format!(
                "File type '{mime_type}' is not allowed. Allowed types: {}",
                allowed.join(", ")
            )));
        }

        let (file, temp_path) = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .tempfile()
            .map_err(temp_file_error)?
            .into_parts();
        // From here on the guard owns removal.
        let path = temp_path.keep().map_err(|e| temp_file_error(e.error))?;
        let mut upload = UploadedFile::new(path, mime_type);

        let mut file = tokio::fs::File::from_std(file);
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            upload.size += chunk.len();
            if upload.size > max_size {
                return Err(ApiError::payload_too_large(format!(
                    "File exceeds the maximum allowed size of {max_size} bytes."
                )));
            }
            file.write_all(&chunk).await.map_err(temp_file_error)?;
        }
        file.flush().await.map_err(temp_file_error)?;

        tracing::debug!(
            path = %upload.path.display(),
            mime_type = %upload.mime_type,
            size = upload.size,
            "Received upload"
        );
        Ok(upload)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

impl Drop for UploadedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to clean up upload temp file"
            ),
        }
    }
}

/// Fields of a `multipart/form-data` store request.
#[derive(Debug, Default)]
pub struct MultipartUpload {
    pub bucket: Option<String>,
    pub id: Option<String>,
    pub file: Option<UploadedFile>,
}

impl MultipartUpload {
    async fn parse(
        mut multipart: Multipart,
        policy: &IdentityPolicy,
        max_size: usize,
    ) -> Result<Self, ApiError> {
        let mut upload = MultipartUpload::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "bucket" => upload.bucket = Some(field.text().await.map_err(multipart_error)?),
                "id" => upload.id = Some(field.text().await.map_err(multipart_error)?),
                "file" => {
                    if upload.file.is_some() {
                        return Err(ApiError::bad_request("Only one file may be uploaded per request."));
                    }
                    upload.file = Some(UploadedFile::receive(field, policy, max_size).await?);
                }
                other => tracing::debug!(field = other, "Ignoring unknown multipart field"),
            }
        }

        Ok(upload)
    }

    /// Read the uploaded file, failing with `missing` when the form had none.
    pub async fn read_file(&self, missing: &'static str) -> Result<Vec<u8>, ApiError> {
        let file = self.file.as_ref().ok_or_else(|| ApiError::bad_request(missing))?;
        file.read().await.map_err(temp_file_error)
    }

    /// Borrow the form as a service request around already read bytes.
    pub fn as_file_upload<'a>(&'a self, bytes: &'a [u8]) -> FileUpload<'a> {
        FileUpload {
            bucket: self.bucket.as_deref(),
            id: self.id.as_deref(),
            file: Some(bytes),
            mime_type: self.file.as_ref().map(UploadedFile::mime_type),
        }
    }
}

impl FromRequest<AppState> for MultipartUpload {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Self::parse(
            multipart,
            state.vault.policy(),
            state.config.max_binary_file_size,
        )
        .await
    }
}

/// Body of the combined public/private routes: a JSON document or a file form.
#[derive(Debug)]
pub enum StorePayload {
    Document(DocumentRequest),
    Upload(MultipartUpload),
}

impl FromRequest<AppState> for StorePayload {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        if is_multipart(&req) {
            let upload = MultipartUpload::from_request(req, state).await?;
            return Ok(StorePayload::Upload(upload));
        }
        let Json(document) = Json::<DocumentRequest>::from_request(req, state).await?;
        Ok(StorePayload::Document(document))
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Request body exceeds the maximum allowed size.")
    } else {
        ApiError::bad_request(err.body_text())
    }
}

fn temp_file_error(err: io::Error) -> ApiError {
    tracing::error!(error = %err, "Upload temp file I/O failed");
    ApiError::application("An unexpected error occurred while receiving the upload.")
}
