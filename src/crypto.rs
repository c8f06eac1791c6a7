// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Content hashing and AES-256-GCM encryption.
//!
//! Keys travel as 64 lowercase hex characters; cipher text, IV and tag as
//! standard base64. The GCM tag is kept apart from the cipher text so the
//! stored envelope carries all three fields separately.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64ct::{Base64, Encoding};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Algorithm tag written next to every cipher text.
pub const AES_256_GCM: &str = "aes-256-gcm";
/// AES-256 key size in bytes.
pub const KEY_SIZE: usize = 32;
/// GCM nonce size in bytes.
pub const IV_SIZE: usize = 12;
/// GCM authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key length for {AES_256_GCM}: expected {expected} hex characters, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
    #[error("encryption key is not valid hex")]
    InvalidKeyEncoding,
    #[error("unsupported encryption algorithm '{0}'")]
    UnsupportedAlgorithm(String),
    #[error("{0} is not valid base64")]
    InvalidEncoding(&'static str),
    #[error("invalid {field} length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("encryption failed")]
    Encryption,
    #[error("decryption failed: wrong key or tampered data")]
    Decryption,
    #[error("decrypted data is not valid UTF-8")]
    InvalidUtf8,
}

/// Output of [`CryptographyService::encrypt_string`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedData {
    pub cipher_text: String,
    pub iv: String,
    pub tag: String,
    #[serde(rename = "type")]
    pub algorithm: String,
}

/// Stateless hashing and symmetric encryption.
#[derive(Debug, Clone, Copy, Default)]
pub struct CryptographyService;

impl CryptographyService {
    pub fn new() -> Self {
        Self
    }

    /// Hex SHA-256 digest.
    pub fn compute_hash(&self, input: &[u8]) -> String {
        hex::encode(Sha256::digest(input))
    }

    /// Fresh random AES-256 key as 64 lowercase hex characters.
    pub fn generate_encryption_key(&self) -> String {
        let mut key = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut key);
        hex::encode(key)
    }

    /// Encrypt UTF-8 text under a hex key with a fresh random IV.
    pub fn encrypt_string(&self, input: &str, key: &str) -> Result<EncryptedData, CryptoError> {
        let cipher = cipher_for(key)?;

        let mut iv = [0u8; IV_SIZE];
        rand::thread_rng().fill_bytes(&mut iv);

        let mut sealed = cipher
            .encrypt(Nonce::from_slice(&iv), input.as_bytes())
            .map_err(|_| CryptoError::Encryption)?;
        // aes-gcm appends the tag to the cipher text
        let tag = sealed.split_off(sealed.len() - TAG_SIZE);

        Ok(EncryptedData {
            cipher_text: Base64::encode_string(&sealed),
            iv: Base64::encode_string(&iv),
            tag: Base64::encode_string(&tag),
            algorithm: AES_256_GCM.to_string(),
        })
    }

    /// Inverse of [`encrypt_string`](Self::encrypt_string).
    pub fn decrypt_string(&self, data: &EncryptedData, key: &str) -> Result<String, CryptoError> {
        if data.algorithm != AES_256_GCM {
            return Err(CryptoError::UnsupportedAlgorithm(data.algorithm.clone()));
        }
        let cipher = cipher_for(key)?;

        let iv = decode_exact("iv", &data.iv, IV_SIZE)?;
        let tag = decode_exact("tag", &data.tag, TAG_SIZE)?;
        let mut sealed = Base64::decode_vec(&data.cipher_text)
            .map_err(|_| CryptoError::InvalidEncoding("cipherText"))?;
        sealed.extend_from_slice(&tag);

        let plain = cipher
            .decrypt(Nonce::from_slice(&iv), sealed.as_slice())
            .map_err(|_| CryptoError::Decryption)?;
        String::from_utf8(plain).map_err(|_| CryptoError::InvalidUtf8)
    }
}

fn cipher_for(key: &str) -> Result<Aes256Gcm, CryptoError> {
    if key.len() != KEY_SIZE * 2 {
        return Err(CryptoError::InvalidKeyLength {
            expected: KEY_SIZE * 2,
            actual: key.len(),
        });
    }
    let bytes = hex::decode(key).map_err(|_| CryptoError::InvalidKeyEncoding)?;
    Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&bytes)))
}

fn decode_exact(field: &'static str, value: &str, expected: usize) -> Result<Vec<u8>, CryptoError> {
    let bytes = Base64::decode_vec(value).map_err(|_| CryptoError::InvalidEncoding(field))?;
    if bytes.len() != expected {
        return Err(CryptoError::InvalidLength {
            field,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(bytes)
}
