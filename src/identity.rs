// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bucket, identifier and payload validation.
//!
//! Every check here fails with [`ApiError::BadRequest`] carrying a message that
//! is returned to the client verbatim.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::{AppConfig, BucketConfig};
use crate::error::ApiError;

/// Extension of every JSON document and encrypted envelope.
pub const JSON_EXTENSION: &str = "json";

/// Validation rules derived from configuration.
#[derive(Debug, Clone)]
pub struct IdentityPolicy {
    buckets: BucketConfig,
    allowed_mime_types: Vec<String>,
}

impl IdentityPolicy {
    pub fn new(buckets: BucketConfig, allowed_mime_types: Vec<String>) -> Self {
        Self {
            buckets,
            allowed_mime_types,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.buckets.clone(), config.allowed_binary_types.clone())
    }

    pub fn allowed_mime_types(&self) -> &[String] {
        &self.allowed_mime_types
    }

    /// Explicit bucket, else the configured default, then the allow-list check.
    pub fn resolve_bucket(&self, bucket: Option<&str>) -> Result<String, ApiError> {
        let bucket = non_empty(bucket)
            .or(self.buckets.default_bucket())
            .ok_or_else(|| {
                ApiError::bad_request(
                    "Bucket is required. Please provide a bucket name, or set the DEFAULT_BUCKET environment variable.",
                )
            })?;
        self.check_available(bucket)
    }

    /// Explicit bucket only, then the allow-list check.
    pub fn require_bucket(&self, bucket: Option<&str>) -> Result<String, ApiError> {
        let bucket = non_empty(bucket)
            .ok_or_else(|| ApiError::bad_request("Bucket is required. Please provide a bucket name."))?;
        self.check_available(bucket)
    }

    fn check_available(&self, bucket: &str) -> Result<String, ApiError> {
        if self.buckets.available().iter().any(|b| b == bucket) {
            return Ok(bucket.to_string());
        }
        Err(ApiError::bad_request(format!(
            "Invalid bucket. Must be one of the following buckets: {}",
            self.buckets.available().join(", ")
        )))
    }

    /// Client-supplied UUID, or a fresh v4 when absent or empty.
    pub fn resolve_id(&self, id: Option<&str>) -> Result<String, ApiError> {
        match non_empty(id) {
            Some(id) => require_uuid(id),
            None => Ok(Uuid::new_v4().to_string()),
        }
    }

    pub fn require_json_object<'a>(
        &self,
        data: Option<&'a Value>,
    ) -> Result<&'a Map<String, Value>, ApiError> {
        data.and_then(Value::as_object).ok_or_else(|| {
            ApiError::bad_request("Data must be a JSON object. Please provide a valid JSON object.")
        })
    }

    pub fn require_allowed_mime<'a>(&self, mime_type: Option<&'a str>) -> Result<&'a str, ApiError> {
        match mime_type {
            Some(mime) if self.allowed_mime_types.iter().any(|allowed| allowed == mime) => Ok(mime),
            _ => Err(ApiError::bad_request(format!(
                "Invalid MIME type. Must be one of the following types: {}",
                self.allowed_mime_types.join(", ")
            ))),
        }
    }
}

/// Validate an identifier supplied by a client.
pub fn require_uuid(id: &str) -> Result<String, ApiError> {
    if is_valid_uuid(id) {
        Ok(id.to_string())
    } else {
        Err(ApiError::bad_request(format!(
            "Invalid id {id}. Please provide a valid UUID."
        )))
    }
}

/// Hyphenated UUID of version 1-5 with the RFC 4122 variant, any case.
pub fn is_valid_uuid(value: &str) -> bool {
    const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

    let groups: Vec<&str> = value.split('-').collect();
    if groups.len() != GROUPS.len() {
        return false;
    }
    let well_formed = groups
        .iter()
        .zip(GROUPS)
        .all(|(group, len)| group.len() == len && group.bytes().all(|b| b.is_ascii_hexdigit()));
    if !well_formed {
        return false;
    }

    let version = groups[2].as_bytes()[0];
    let variant = groups[3].as_bytes()[0].to_ascii_lowercase();
    matches!(version, b'1'..=b'5') && matches!(variant, b'8' | b'9' | b'a' | b'b')
}

/// File extension registered for a MIME type.
///
/// The subtype wins when it is itself a registered extension, so
/// `image/jpeg` maps to `jpeg` rather than `jpe`.
pub fn extension_for_mime(mime_type: &str) -> Result<String, ApiError> {
    let unknown = || {
        ApiError::bad_request(format!(
            "Unable to determine file extension for MIME type '{mime_type}'."
        ))
    };
    let extensions = mime_guess::get_mime_extensions_str(mime_type).ok_or_else(unknown)?;

    let subtype = mime_type
        .split_once('/')
        .map(|(_, subtype)| subtype.to_ascii_lowercase())
        .unwrap_or_default();
    if extensions.contains(&subtype.as_str()) {
        return Ok(subtype);
    }
    extensions
        .first()
        .map(|ext| ext.to_string())
        .ok_or_else(unknown)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
