// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON envelope stored in place of private payloads.
//!
//! ```json
//! {"cipherText":"...","iv":"...","tag":"...","type":"aes-256-gcm","contentType":"image/png"}
//! ```
//!
//! Binary payloads are base64-encoded before encryption, so the recovered
//! plaintext of a binary envelope is base64 text and `contentType` names the
//! original MIME type. Credential envelopes omit `contentType`.

use serde::{Deserialize, Serialize};

use crate::crypto::{CryptoError, CryptographyService, EncryptedData};

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(flatten)]
    pub encrypted: EncryptedData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Envelope {
    /// Encrypt `plaintext` under `key` and wrap it.
    pub fn seal(
        crypto: &CryptographyService,
        plaintext: &str,
        key: &str,
        content_type: Option<&str>,
    ) -> Result<Self, EnvelopeError> {
        Ok(Self {
            encrypted: crypto.encrypt_string(plaintext, key)?,
            content_type: content_type.map(str::to_string),
        })
    }

    /// Decrypt the wrapped cipher text.
    pub fn open(&self, crypto: &CryptographyService, key: &str) -> Result<String, EnvelopeError> {
        Ok(crypto.decrypt_string(&self.encrypted, key)?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
