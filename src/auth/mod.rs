// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Every versioned API route requires the shared secret configured in
//! `API_KEY`, sent in the `x-api-key` header.
//!
//! ## Security
//!
//! - Health endpoints, API docs and locally stored objects are public
//! - The configured key is only kept as an HMAC-SHA256 digest
//! - Comparison is constant time regardless of the candidate's length

pub mod error;
pub mod middleware;

pub use error::AuthError;
pub use middleware::{require_api_key, ApiKey, API_KEY_HEADER};
