// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Active storage backend (`local`, `s3` or `gcs`).
    pub backend: String,
    /// Local storage directory availability (local backend only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_directory: Option<String>,
}

/// Check the local storage root exists and is a directory.
async fn check_local_directory(state: &AppState) -> Option<String> {
    let root = state.vault.storage().local_root()?;
    let status = match tokio::fs::metadata(root).await {
        Ok(meta) if meta.is_dir() => "ok",
        Ok(_) => "not_a_directory",
        Err(_) => "missing",
    };
    Some(status.to_string())
}

/// Liveness probe handler.
///
/// Plain-text `OK` while the process is running.
#[utoipa::path(
    get,
    path = "/health-check",
    tag = "Health",
    responses((status = 200, description = "Service is alive", body = String))
)]
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Returns 200 if all checks pass, 503 if any check fails.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Service is unhealthy", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let local_directory = check_local_directory(&state).await;
    let all_ok = local_directory.as_deref().is_none_or(|s| s == "ok");

    let response = ReadyResponse {
        status: if all_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            backend: state.vault.storage().name().to_string(),
            local_directory,
        },
    };

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
