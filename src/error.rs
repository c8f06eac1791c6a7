// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

/// Errors surfaced to API callers.
///
/// Every variant maps to exactly one HTTP status. Only `Application` hides its
/// cause: services log the underlying failure and hand back a generic message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Application(String),
}

/// Error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::PayloadTooLarge(message.into())
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self::Application(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Application(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(message)
            | ApiError::Unauthorized(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message)
            | ApiError::PayloadTooLarge(message)
            | ApiError::Application(message) => message,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::payload_too_large("Request body exceeds the maximum allowed size.")
        } else {
            ApiError::bad_request(rejection.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            message: self.message().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body, Bytes},
        extract::FromRequest,
        http,
    };
    use serde_json::Value;

    async fn json_rejection(body: Body) -> ApiError {
        let request = http::Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let rejection = Json::<Value>::from_request(request, &()).await.unwrap_err();
        ApiError::from(rejection)
    }

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status(), StatusCode::NOT_FOUND);
        assert_eq!(nf.message(), "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        assert_eq!(bad.message(), "bad");

        let conflict = ApiError::conflict("taken");
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let unauthorized = ApiError::unauthorized("no key");
        assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);

        let too_large = ApiError::payload_too_large("big");
        assert_eq!(too_large.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let app = ApiError::application("oops");
        assert_eq!(app.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(app.to_string(), "oops");
    }

    #[tokio::test]
    async fn into_response_returns_message_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"message":"bad data"}"#);
    }

    #[tokio::test]
    async fn oversized_json_body_is_payload_too_large() {
        // Larger than axum's default 2 MiB body limit.
        let err = json_rejection(Body::from(vec![b' '; 3 * 1024 * 1024])).await;
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn broken_body_stream_is_bad_request() {
        let chunks: Vec<Result<Bytes, std::io::Error>> =
            vec![Err(std::io::Error::other("connection reset"))];
        let err = json_rejection(Body::from_stream(futures::stream::iter(chunks))).await;
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let err = json_rejection(Body::from("{not json")).await;
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
