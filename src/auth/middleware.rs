// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared-secret authentication middleware for Axum.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/documents", post(store_document))
//!     .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_api_key));
//! ```

use axum::{
    extract::{Request, State},
    http::HeaderName,
    middleware::Next,
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use super::AuthError;
use crate::state::AppState;

/// Header carrying the API key.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

type HmacSha256 = Hmac<Sha256>;

/// The configured API key, held only as a keyed digest.
///
/// Candidates are digested under the same random per-process key and the
/// digests compared in constant time, so neither content nor length of the
/// configured key leaks through response timing.
#[derive(Clone)]
pub struct ApiKey {
    mac_key: [u8; 32],
    digest: Vec<u8>,
}

impl ApiKey {
    pub fn new(expected: &str) -> Self {
        let mut mac_key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut mac_key);
        let digest = Self::mac(&mac_key, expected).finalize().into_bytes().to_vec();
        Self { mac_key, digest }
    }

    fn mac(mac_key: &[u8; 32], value: &str) -> HmacSha256 {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(mac_key)
            .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
        mac.update(value.as_bytes());
        mac
    }

    pub fn matches(&self, candidate: &str) -> bool {
        Self::mac(&self.mac_key, candidate)
            .verify_slice(&self.digest)
            .is_ok()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(..)")
    }
}

/// Check the `x-api-key` header against the configured key.
pub fn authenticate(api_key: &ApiKey, request: &Request) -> Result<(), AuthError> {
    let provided = request
        .headers()
        .get(&API_KEY_HEADER)
        .map(|value| value.to_str().unwrap_or_default())
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingApiKey)?;

    if api_key.matches(provided) {
        Ok(())
    } else {
        Err(AuthError::InvalidApiKey)
    }
}

/// Authentication middleware function.
pub async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match authenticate(&state.api_key, &request) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            tracing::debug!(path = %request.uri().path(), error = %err, "Rejected request");
            err.into_response()
        }
    }
}
