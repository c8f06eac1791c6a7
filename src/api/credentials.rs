// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{ApiError, ErrorBody},
    models::{CredentialResponse, DocumentRequest},
    state::AppState,
};

/// Encrypt and store a credential document.
///
/// Kept for existing clients; new integrations should use `/private`.
#[utoipa::path(
    post,
    path = "/credentials",
    request_body = DocumentRequest,
    tag = "Credentials",
    security(("api_key" = [])),
    responses(
        (status = 201, description = "Credential encrypted and stored", body = CredentialResponse),
        (status = 400, body = ErrorBody),
        (status = 401, body = ErrorBody),
        (status = 409, body = ErrorBody),
        (status = 500, body = ErrorBody)
    )
)]
pub async fn store_credential(
    State(state): State<AppState>,
    payload: Result<Json<DocumentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CredentialResponse>), ApiError> {
    let Json(request) = payload?;
    let response = state.vault.store_credential(&request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
