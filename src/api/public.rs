// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    api::upload::StorePayload,
    error::{ApiError, ErrorBody},
    models::{DocumentRequest, FileUploadForm, StoreResponse},
    state::AppState,
};

/// Store a JSON document or a binary file unencrypted.
#[utoipa::path(
    post,
    path = "/public",
    request_body(content(
        (DocumentRequest = "application/json"),
        (FileUploadForm = "multipart/form-data")
    )),
    tag = "Public",
    security(("api_key" = [])),
    responses(
        (status = 201, description = "Object stored", body = StoreResponse),
        (status = 400, body = ErrorBody),
        (status = 401, body = ErrorBody),
        (status = 409, body = ErrorBody),
        (status = 413, body = ErrorBody),
        (status = 500, body = ErrorBody)
    )
)]
pub async fn store_public(
    State(state): State<AppState>,
    payload: StorePayload,
) -> Result<(StatusCode, Json<StoreResponse>), ApiError> {
    let response = match payload {
        StorePayload::Document(request) => state.vault.store_public_document(&request).await?,
        StorePayload::Upload(upload) => {
            let bytes = upload
                .read_file("File is required for multipart uploads.")
                .await?;
            state
                .vault
                .store_public_file(upload.as_file_upload(&bytes))
                .await?
        }
    };
    Ok((StatusCode::CREATED, Json(response)))
}
