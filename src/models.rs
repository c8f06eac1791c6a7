// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. All types derive `ToSchema`
//! for the OpenAPI document.
//!
//! ## Model Categories
//!
//! - **Requests**: JSON document bodies and the multipart upload form
//! - **Responses**: URI and content hash of a stored object, plus the
//!   decryption key for encrypted objects

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

// =============================================================================
// Request Models
// =============================================================================

/// JSON document to store.
///
/// Fields are optional at the parsing layer so that missing values surface
/// as validation messages rather than deserialization errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DocumentRequest {
    /// Target bucket. Public and private routes fall back to `DEFAULT_BUCKET`.
    #[schema(example = "documents")]
    pub bucket: Option<String>,
    /// Object identifier (UUID). Generated when omitted.
    #[schema(example = "3f2504e0-4f89-41d3-9a0c-0305e82c3301")]
    pub id: Option<String>,
    /// The document itself. Must be a JSON object.
    #[schema(value_type = Object)]
    pub data: Option<Value>,
}

/// Multipart form accepted by the file upload routes.
#[derive(Debug, ToSchema)]
#[allow(dead_code)] // Documentation only; the form is parsed by `MultipartUpload`.
pub struct FileUploadForm {
    /// Target bucket.
    pub bucket: Option<String>,
    /// Object identifier (UUID). Generated when omitted.
    pub id: Option<String>,
    /// The file. Its part `Content-Type` must be an allowed binary type.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

// =============================================================================
// Response Models
// =============================================================================

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreResponse {
    /// Public URI of the stored object.
    pub uri: String,
    /// Hex SHA-256 of the original content (before any encryption).
    pub hash: String,
    /// Hex AES-256 key; present only for encrypted objects and never stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decryption_key: Option<String>,
}

/// A stored credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CredentialResponse {
    pub uri: String,
    pub hash: String,
    /// Hex AES-256 key; never stored.
    pub key: String,
}
