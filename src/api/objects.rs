// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    error::{ApiError, ErrorBody},
    state::AppState,
};

#[utoipa::path(
    delete,
    path = "/{bucket}/{id}",
    params(
        ("bucket" = String, Path, description = "Bucket holding the object"),
        ("id" = String, Path, description = "Object identifier (UUID), without extension")
    ),
    tag = "Objects",
    security(("api_key" = [])),
    responses(
        (status = 204, description = "Object deleted"),
        (status = 400, body = ErrorBody),
        (status = 401, body = ErrorBody),
        (status = 404, body = ErrorBody),
        (status = 500, body = ErrorBody)
    )
)]
pub async fn delete_object(
    Path((bucket, id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state.vault.delete_object(&bucket, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
