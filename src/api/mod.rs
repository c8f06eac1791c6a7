// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, get_service, post, MethodRouter},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::{
    openapi::{
        security::{ApiKey, ApiKeyValue, SecurityScheme},
        server::Server,
    },
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{require_api_key, API_KEY_HEADER},
    config::JSON_BODY_LIMIT,
    error::ErrorBody,
    models::{CredentialResponse, DocumentRequest, FileUploadForm, StoreResponse},
    state::AppState,
};

pub mod credentials;
pub mod documents;
pub mod files;
pub mod health;
pub mod objects;
pub mod private;
pub mod public;
pub mod upload;

/// Room for multipart boundaries and text fields on top of the file itself.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/credentials", post(credentials::store_credential))
        .route("/documents", post(documents::store_document))
        .route("/files", post(files::upload_file))
        .route("/public", post(public::store_public))
        .route("/private", post(private::store_private))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .route("/{bucket}/{id}", object_routes(&state));

    let mut openapi = ApiDoc::openapi();
    openapi.servers = Some(vec![Server::new(state.config.api_prefix())]);

    let body_limit = JSON_BODY_LIMIT.max(
        state
            .config
            .max_binary_file_size
            .saturating_add(MULTIPART_OVERHEAD),
    );

    Router::new()
        .route("/health-check", get(health::health_check))
        .route("/health", get(health::health))
        .nest(&state.config.api_prefix(), api_routes)
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", openapi))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `DELETE` requires the API key; `GET` serves locally stored objects as-is.
fn object_routes(state: &AppState) -> MethodRouter<AppState> {
    let routes = delete(objects::delete_object).route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_api_key,
    ));
    match state.vault.storage().local_root() {
        Some(root) => routes.merge(get_service(ServeDir::new(root))),
        None => routes,
    }
}

struct ApiKeyScheme;

impl Modify for ApiKeyScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(API_KEY_HEADER.as_str()))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        credentials::store_credential,
        documents::store_document,
        files::upload_file,
        public::store_public,
        private::store_private,
        objects::delete_object,
        health::health_check,
        health::health
    ),
    components(
        schemas(
            DocumentRequest,
            FileUploadForm,
            StoreResponse,
            CredentialResponse,
            ErrorBody,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    modifiers(&ApiKeyScheme),
    tags(
        (name = "Credentials", description = "Legacy encrypted credential storage"),
        (name = "Documents", description = "Plain JSON documents"),
        (name = "Files", description = "Plain binary files"),
        (name = "Public", description = "Unencrypted documents and files"),
        (name = "Private", description = "AES-256-GCM encrypted documents and files"),
        (name = "Objects", description = "Stored object management"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;


#[cfg(test)]
mod tests {
    use super::test_support::{multipart_request, test_state, Part, API_KEY};
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const ID: &str = "3f2504e0-4f89-41d3-9a0c-0305e82c3301";

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-api-key", API_KEY)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_check_is_public() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path(), &[]));

        let response = app
            .oneshot(Request::get("/health-check").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn api_routes_require_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path(), &[]));

        let missing = Request::post("/api/v1/public")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"data":{"a":1}}"#))
            .unwrap();
        let response = app.clone().oneshot(missing).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await["message"],
            "API key is required. Please provide a valid API key in the X-API-Key header."
        );

        let wrong = Request::delete(format!("/api/v1/documents/{ID}"))
            .header("x-api-key", "wrong")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(wrong).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await["message"],
            "Invalid API key. Please provide a valid API key."
        );
    }

    #[tokio::test]
    async fn public_document_store_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path(), &[]));

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/public",
                json!({"id": ID, "data": {"hello": "world"}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(
            body["uri"],
            format!("http://localhost:3333/api/v1/documents/{ID}.json")
        );
        assert!(body.get("decryptionKey").is_none());

        let fetched = app
            .clone()
            .oneshot(
                Request::get(format!("/api/v1/documents/{ID}.json"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(fetched.status(), StatusCode::OK);
        assert_eq!(body_json(fetched).await, json!({"hello": "world"}));

        let deleted = app
            .clone()
            .oneshot(
                Request::delete(format!("/api/v1/documents/{ID}"))
                    .header("x-api-key", API_KEY)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let gone = app
            .oneshot(
                Request::get(format!("/api/v1/documents/{ID}.json"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn repeated_id_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path(), &[]));
        let body = json!({"bucket": "files", "id": ID, "data": {"v": 1}});

        let first = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/documents", body.clone()))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app
            .oneshot(json_request("POST", "/api/v1/documents", body))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        assert_eq!(
            body_json(second).await["message"],
            "A document with the provided ID already exists in the specified bucket."
        );
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path(), &[]));

        let request = Request::post("/api/v1/private")
            .header("content-type", "application/json")
            .header("x-api-key", API_KEY)
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn private_multipart_upload_returns_key() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path(), &[]));

        let response = app
            .oneshot(multipart_request(
                "/api/v1/private",
                &[
                    Part::text("bucket", "files"),
                    Part::text("id", ID),
                    Part::file("file", "image/png", b"\x89PNG"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(
            body["uri"],
            format!("http://localhost:3333/api/v1/files/{ID}.json")
        );
        assert_eq!(body["decryptionKey"].as_str().map(str::len), Some(64));
        assert!(dir.path().join("files").join(format!("{ID}.json")).exists());
    }

    #[tokio::test]
    async fn multipart_without_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path(), &[]));

        let response = app
            .oneshot(multipart_request(
                "/api/v1/public",
                &[Part::text("bucket", "files")],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["message"],
            "File is required for multipart uploads."
        );
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path(), &[("MAX_BINARY_FILE_SIZE", "8")]));

        let response = app
            .oneshot(multipart_request(
                "/api/v1/files",
                &[
                    Part::text("bucket", "files"),
                    Part::file("file", "image/png", b"more than eight bytes"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(!dir.path().join("files").exists());
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path(), &[]));

        let response = app
            .oneshot(
                Request::delete(format!("/api/v1/files/{ID}"))
                    .header("x-api-key", API_KEY)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path(), &[]));

        let response = app
            .oneshot(
                Request::get("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let doc = body_json(response).await;
        assert_eq!(doc["servers"][0]["url"], "/api/v1");
        assert!(doc["paths"].get("/documents").is_some());
        assert!(doc["components"]["securitySchemes"].get("api_key").is_some());
    }
}
