use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use bson::oid::ObjectId;

use super::models::Resource;
use super::repo::Repo;
use super::store::DocumentStore;
use super::{bugs, lanes, tasks};
use crate::errors::StoreError;

/// Prefix shared by every resource route.
pub const API_PREFIX: &str = "/api/v1";

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub request_timeout: Duration,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, request_timeout: Duration) -> Self {
        Self {
            store,
            request_timeout,
        }
    }

    pub fn repo<R: Resource>(&self) -> Repo<'_, R> {
        Repo::new(self.store.as_ref(), self.request_timeout)
    }
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    InvalidInput,
    InvalidId,
    Validation(String),
    NoFieldsToUpdate,
    NotFound(String),
    Store(String),
}

impl ApiError {
    /// Log the underlying store failure and hide it behind `message`.
    pub fn store(message: &str, err: StoreError) -> Self {
        tracing::error!(error = %err, "{}", message);
        ApiError::Store(message.to_string())
    }

    pub fn not_found<R: Resource>() -> Self {
        ApiError::NotFound(format!("{} not found", R::NAME))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidInput => (StatusCode::BAD_REQUEST, "Invalid Input".to_string()),
            ApiError::InvalidId => (StatusCode::BAD_REQUEST, "Invalid ID".to_string()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NoFieldsToUpdate => {
                (StatusCode::BAD_REQUEST, "No fields to update".to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Store(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Rejected request body");
        ApiError::InvalidInput
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    let v1 = Router::new()
        .merge(bugs::routes())
        .merge(lanes::routes())
        .merge(tasks::routes());

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest(API_PREFIX, v1)
}

// ── Helpers ───────────────────────────────────────────────────────────

/// Parse a path segment as a document id.
pub fn parse_id(raw: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::InvalidId)
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({"data": "Hello world to the API"}))
}

async fn health_check() -> &'static str {
    "ok"
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_check() {
        let app = test_app();
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_root_greeting() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "Hello world to the API");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = test_app();
        let (status, _) = send(&app, "GET", "/api/v2/bugs", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_store_timeout_is_500() {
        let app = stalled_app();
        for uri in ["/api/v1/bugs", "/api/v1/lanes/5f1d7f1c2b3a4c5d6e7f8a9b"] {
            let (status, body) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
            assert!(body["error"].is_string(), "{}", body);
        }
    }

    #[test]
    fn test_parse_id() {
        let id = ObjectId::new();
        assert_eq!(parse_id(&id.to_hex()).unwrap(), id);
        assert!(matches!(parse_id("xyz"), Err(ApiError::InvalidId)));
        assert!(matches!(parse_id("0123456789abcdef0123456"), Err(ApiError::InvalidId)));
        assert!(matches!(
            parse_id("zzzzzzzzzzzzzzzzzzzzzzzz"),
            Err(ApiError::InvalidId)
        ));
    }

    #[test]
    fn test_api_error_status_codes() {
        let cases = [
            (ApiError::InvalidInput, StatusCode::BAD_REQUEST),
            (ApiError::InvalidId, StatusCode::BAD_REQUEST),
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::NoFieldsToUpdate, StatusCode::BAD_REQUEST),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Store("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
