// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    api::upload::MultipartUpload,
    error::{ApiError, ErrorBody},
    models::{FileUploadForm, StoreResponse},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/files",
    request_body(content = FileUploadForm, content_type = "multipart/form-data"),
    tag = "Files",
    security(("api_key" = [])),
    responses(
        (status = 201, description = "File stored", body = StoreResponse),
        (status = 400, description = "Missing file, bucket or disallowed type", body = ErrorBody),
        (status = 401, body = ErrorBody),
        (status = 409, body = ErrorBody),
        (status = 413, description = "File exceeds MAX_BINARY_FILE_SIZE", body = ErrorBody),
        (status = 500, body = ErrorBody)
    )
)]
pub async fn upload_file(
    State(state): State<AppState>,
    upload: MultipartUpload,
) -> Result<(StatusCode, Json<StoreResponse>), ApiError> {
    let bytes = upload
        .read_file("File is required. Please upload a file.")
        .await?;
    let response = state.vault.store_file(upload.as_file_upload(&bytes)).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
