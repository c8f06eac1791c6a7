// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Vault - Public & Private Document Storage Service
//!
//! Stores JSON documents and binary files either as-is or sealed in
//! AES-256-GCM envelopes, on the local filesystem, an S3-compatible store
//! or Google Cloud Storage.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Shared-secret API key authentication
//! - `services` - Store and delete operations over the active backend
//! - `storage` - Local, S3 and GCS providers
//! - `crypto` / `envelope` - AES-256-GCM sealing

pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
