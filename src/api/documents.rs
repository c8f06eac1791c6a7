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
    models::{DocumentRequest, StoreResponse},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/documents",
    request_body = DocumentRequest,
    tag = "Documents",
    security(("api_key" = [])),
    responses(
        (status = 201, description = "Document stored", body = StoreResponse),
        (status = 400, description = "Invalid bucket, id or data", body = ErrorBody),
        (status = 401, body = ErrorBody),
        (status = 409, description = "Id already taken in this bucket", body = ErrorBody),
        (status = 500, body = ErrorBody)
    )
)]
pub async fn store_document(
    State(state): State<AppState>,
    payload: Result<Json<DocumentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StoreResponse>), ApiError> {
    let Json(request) = payload?;
    let response = state.vault.store_document(&request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
