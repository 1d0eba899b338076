// HTTP API - JSON routes over the registry
//
// Every request locks the shared registry, so submissions from concurrent
// clients are allocated one at a time within this process.

use crate::error::Error;
use crate::record::{Registration, RegistrationForm};
use crate::registry::{Registry, Submission};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    registry: Arc<Mutex<Registry>>,
}

impl AppState {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(Mutex::new(registry)),
        }
    }

    fn with_registry<T>(&self, f: impl FnOnce(&Registry) -> crate::Result<T>) -> Result<T, ApiError> {
        let registry = self
            .registry
            .lock()
            .map_err(|_| ApiError::internal("registry lock poisoned"))?;
        f(&registry).map_err(ApiError::from)
    }
}

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub document: String,
}

/// Registry failure carried to the client with a matching status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

/// Malformed or mistyped request bodies get the same envelope as form errors
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: rejection.body_text(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if !err.is_user_error() {
            error!(error = %err, "request failed");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::err(self.message))).into_response()
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/students - Every stored registration, in file order
async fn list_students(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Registration>>>, ApiError> {
    let records = state.with_registry(Registry::records)?;
    Ok(Json(ApiResponse::ok(records)))
}

/// GET /api/students/:key - Lookup by registration number or mobile
async fn get_student(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<Registration>>, ApiError> {
    let record = state.with_registry(|registry| registry.lookup(&key))?;
    Ok(Json(ApiResponse::ok(record)))
}

/// POST /api/students - Register a student
async fn create_student(
    State(state): State<AppState>,
    payload: Result<Json<RegistrationForm>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Submission>>), ApiError> {
    let Json(form) = payload?;
    let submission = state.with_registry(|registry| registry.submit(&form))?;
    info!(id = %submission.record.id, "registered via api");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(submission))))
}

/// POST /api/students/:key/document - Re-render the registration document
async fn render_student_document(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ApiResponse<DocumentResponse>>, ApiError> {
    let response = state.with_registry(|registry| {
        let record = registry.lookup(&key)?;
        let path = registry.render_document(&record)?;
        Ok(DocumentResponse {
            id: record.id,
            document: path.display().to_string(),
        })
    })?;
    Ok(Json(ApiResponse::ok(response)))
}

/// Router with every route nested under `/api`
pub fn router(registry: Registry) -> Router {
    let state = AppState::new(registry);

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/students", get(list_students).post(create_student))
        .route("/students/:key", get(get_student))
        .route("/students/:key/document", post(render_student_document))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PdfRenderer;
    use crate::store::RecordStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn create_test_router(dir: &TempDir) -> Router {
        let registry = Registry::new(
            RecordStore::open(dir.path().join("registrations.csv")),
            Box::new(PdfRenderer::new("YUG COMPUTER CENTER", None)),
            dir.path(),
        );
        router(registry)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = TempDir::new().unwrap();
        let app = create_test_router(&dir);

        let (status, body) = send(&app, get_request("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_create_then_lookup() {
        let dir = TempDir::new().unwrap();
        let app = create_test_router(&dir);

        let (status, body) = send(
            &app,
            post_json(
                "/api/students",
                json!({"name": "Asha", "mobile": "9999999999", "aadhaar": "123412341234"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["record"]["Registration No"], "REG001");
        assert!(dir.path().join("registration_REG001.pdf").is_file());

        let (status, body) = send(&app, get_request("/api/students/9999999999")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["Name"], "Asha");

        let (status, body) = send(&app, get_request("/api/students")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_fields_is_unprocessable() {
        let dir = TempDir::new().unwrap();
        let app = create_test_router(&dir);

        let (status, body) = send(&app, post_json("/api/students", json!({"name": "Asha"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "please fill Mobile and Aadhaar");
        assert!(!dir.path().join("registrations.csv").exists());
    }

    #[tokio::test]
    async fn test_malformed_body_keeps_envelope() {
        let dir = TempDir::new().unwrap();
        let app = create_test_router(&dir);

        let request = Request::builder()
            .method("POST")
            .uri("/api/students")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\": \"Asha\""))
            .unwrap();
        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
        assert!(!dir.path().join("registrations.csv").exists());
    }

    #[tokio::test]
    async fn test_unknown_student_is_not_found() {
        let dir = TempDir::new().unwrap();
        let app = create_test_router(&dir);

        let (status, body) = send(&app, get_request("/api/students/0000000000")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        let (status, _) = send(
            &app,
            post_json("/api/students/REG404/document", json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_render_document_route() {
        let dir = TempDir::new().unwrap();
        let app = create_test_router(&dir);
        send(
            &app,
            post_json(
                "/api/students",
                json!({"name": "Asha", "mobile": "9999999999", "aadhaar": "1"}),
            ),
        )
        .await;
        std::fs::remove_file(dir.path().join("registration_REG001.pdf")).unwrap();

        let (status, body) = send(&app, post_json("/api/students/REG001/document", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], "REG001");
        assert!(dir.path().join("registration_REG001.pdf").is_file());
    }

    #[tokio::test]
    async fn test_malformed_store_is_internal_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("registrations.csv"),
            "Registration No,Name\r\nXYZ,Broken\r\n",
        )
        .unwrap();
        let app = create_test_router(&dir);

        let (status, body) = send(
            &app,
            post_json(
                "/api/students",
                json!({"name": "Asha", "mobile": "9999999999", "aadhaar": "1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
    }
}
