//! Upload session API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use lumiere_core::upload::{
    FileCandidate, IntakeReport, MetadataPatch, SessionError, StoreError, SubmissionSummary,
    SubmitError, UploadEntry, UploadSession, UploadStats,
};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Full view of one session: entries in order, validity, stats.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: String,
    pub entries: Vec<UploadEntry>,
    pub is_valid: bool,
    pub stats: UploadStats,
}

impl SessionView {
    fn from_session(session: &UploadSession) -> Self {
        Self {
            id: session.id().to_string(),
            entries: session.entries(),
            is_valid: session.is_valid(),
            stats: session.stats(),
        }
    }
}

/// Request body for offering files to a session.
#[derive(Debug, Deserialize)]
pub struct AddFilesBody {
    pub files: Vec<FileCandidate>,
}

/// Response for clearing a session's entries.
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub removed: usize,
}

/// Response for a submission refused by the validation gate.
#[derive(Debug, Serialize)]
pub struct SubmitRejection {
    pub error: String,
    pub invalid_count: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn session_not_found(id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Session not found: {}", id),
        }),
    )
}

fn map_session_error(e: SessionError) -> ApiError {
    let status = match &e {
        SessionError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
        SessionError::Store(StoreError::InvalidTransition { .. }) => StatusCode::CONFLICT,
        SessionError::Validation(_) => StatusCode::CONFLICT,
        SessionError::Submit(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new upload session
pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SessionView>) {
    let session = state.create_session().await;
    (StatusCode::CREATED, Json(SessionView::from_session(&session)))
}

/// Get a session view by ID
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.session(&id).await.ok_or_else(|| session_not_found(&id))?;
    Ok(Json(SessionView::from_session(&session)))
}

/// Tear down a session, releasing its preview resources
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.remove_session(&id).await {
        state.ws_broadcaster().session_closed(&id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(&id))
    }
}

/// Offer a batch of file candidates for intake
pub async fn add_files(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<AddFilesBody>,
) -> Result<Json<IntakeReport>, ApiError> {
    let session = state.session(&id).await.ok_or_else(|| session_not_found(&id))?;
    Ok(Json(session.offer_files(body.files)))
}

/// Patch one entry's metadata
pub async fn patch_entry(
    State(state): State<Arc<AppState>>,
    Path((id, entry_id)): Path<(String, String)>,
    Json(patch): Json<MetadataPatch>,
) -> Result<Json<UploadEntry>, ApiError> {
    let session = state.session(&id).await.ok_or_else(|| session_not_found(&id))?;
    session
        .patch_entry(&entry_id, &patch)
        .map(Json)
        .map_err(map_session_error)
}

/// Remove one entry
pub async fn remove_entry(
    State(state): State<Arc<AppState>>,
    Path((id, entry_id)): Path<(String, String)>,
) -> Result<Json<UploadEntry>, ApiError> {
    let session = state.session(&id).await.ok_or_else(|| session_not_found(&id))?;
    session
        .remove_entry(&entry_id)
        .map(Json)
        .map_err(map_session_error)
}

/// Remove every entry in a session
pub async fn clear_entries(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ClearResponse>, ApiError> {
    let session = state.session(&id).await.ok_or_else(|| session_not_found(&id))?;
    Ok(Json(ClearResponse {
        removed: session.clear(),
    }))
}

/// Run a submission over all pending entries
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SubmissionSummary>, axum::response::Response> {
    use axum::response::IntoResponse;

    let session = state
        .session(&id)
        .await
        .ok_or_else(|| session_not_found(&id).into_response())?;

    match session.submit().await {
        Ok(summary) => Ok(Json(summary)),
        Err(SessionError::Submit(SubmitError::ValidationFailed { invalid_count })) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(SubmitRejection {
                error: "Pipeline is not ready for submission".to_string(),
                invalid_count,
            }),
        )
            .into_response()),
        Err(e) => Err(map_session_error(e).into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{create_router, WsBroadcaster};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use lumiere_core::config::{Config, SimulatorConfig};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_config() -> Config {
        Config {
            simulator: SimulatorConfig {
                failure_probability: 0.0,
                ..SimulatorConfig::instant()
            },
            ..Config::default()
        }
    }

    fn app() -> Router {
        let state = Arc::new(AppState::new(test_config(), WsBroadcaster::default()));
        create_router(state)
    }

    async fn request(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        let request = match body {
            Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn candidate(name: &str, mime: &str, size_bytes: u64) -> Value {
        json!({ "name": name, "mime_type": mime, "size_bytes": size_bytes })
    }

    async fn create_test_session(app: &Router) -> String {
        let (status, body) = request(app, "POST", "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let (status, body) = request(&app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_categories_and_licenses() {
        let app = app();

        let (status, body) = request(&app, "GET", "/api/v1/categories", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 6);

        let (status, body) = request(&app, "GET", "/api/v1/licenses", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 5);
        assert_eq!(body[0]["id"], "CC0");
    }

    #[tokio::test]
    async fn test_get_unknown_session_is_404() {
        let app = app();
        let (status, body) = request(&app, "GET", "/api/v1/sessions/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn test_add_files_reports_rejections() {
        let app = app();
        let id = create_test_session(&app).await;

        let (status, body) = request(
            &app,
            "POST",
            &format!("/api/v1/sessions/{}/files", id),
            Some(json!({ "files": [
                candidate("sunset.jpg", "image/jpeg", 2 * 1024 * 1024),
                candidate("notes.pdf", "application/pdf", 1024),
                candidate("huge.mp4", "video/mp4", 60 * 1024 * 1024),
            ]})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accepted"].as_array().unwrap().len(), 1);
        assert_eq!(body["accepted"][0]["metadata"]["title"], "sunset");
        assert_eq!(body["rejected"].as_array().unwrap().len(), 2);
        assert_eq!(body["rejected"][0]["reason"], "unsupported_type");
        assert_eq!(body["rejected"][1]["reason"], "too_large");
    }

    #[tokio::test]
    async fn test_duplicate_custom_category_is_409() {
        let app = app();
        let id = create_test_session(&app).await;

        let (_, report) = request(
            &app,
            "POST",
            &format!("/api/v1/sessions/{}/files", id),
            Some(json!({ "files": [candidate("a.jpg", "image/jpeg", 1024)] })),
        )
        .await;
        let entry_id = report["accepted"][0]["id"].as_str().unwrap().to_string();

        let (status, body) = request(
            &app,
            "PATCH",
            &format!("/api/v1/sessions/{}/entries/{}", id, entry_id),
            Some(json!({ "category": "other", "custom_category": "NATURE" })),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("already exists"));
    }

    #[tokio::test]
    async fn test_submit_invalid_pipeline_is_422() {
        let app = app();
        let id = create_test_session(&app).await;

        let (status, body) = request(
            &app,
            "POST",
            &format!("/api/v1/sessions/{}/submit", id),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["invalid_count"], 0);
    }

    #[tokio::test]
    async fn test_full_upload_flow() {
        let app = app();
        let id = create_test_session(&app).await;

        let (_, report) = request(
            &app,
            "POST",
            &format!("/api/v1/sessions/{}/files", id),
            Some(json!({ "files": [candidate("sunset.jpg", "image/jpeg", 2 * 1024 * 1024)] })),
        )
        .await;
        let entry_id = report["accepted"][0]["id"].as_str().unwrap().to_string();

        let (status, _) = request(
            &app,
            "PATCH",
            &format!("/api/v1/sessions/{}/entries/{}", id, entry_id),
            Some(json!({ "tags": ["golden hour"], "category": "nature" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, summary) = request(
            &app,
            "POST",
            &format!("/api/v1/sessions/{}/submit", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["total"], 1);
        assert_eq!(summary["succeeded"], 1);
        assert_eq!(summary["failed"], 0);

        let (_, view) = request(&app, "GET", &format!("/api/v1/sessions/{}", id), None).await;
        assert_eq!(view["entries"][0]["status"], "success");
        assert_eq!(view["entries"][0]["progress"], 100);
        assert_eq!(view["stats"]["succeeded"], 1);
    }

    #[tokio::test]
    async fn test_remove_entry_then_404_on_second_delete() {
        let app = app();
        let id = create_test_session(&app).await;

        let (_, report) = request(
            &app,
            "POST",
            &format!("/api/v1/sessions/{}/files", id),
            Some(json!({ "files": [candidate("a.jpg", "image/jpeg", 1024)] })),
        )
        .await;
        let entry_id = report["accepted"][0]["id"].as_str().unwrap().to_string();
        let uri = format!("/api/v1/sessions/{}/entries/{}", id, entry_id);

        let (status, _) = request(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = request(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_clear_entries() {
        let app = app();
        let id = create_test_session(&app).await;

        request(
            &app,
            "POST",
            &format!("/api/v1/sessions/{}/files", id),
            Some(json!({ "files": [
                candidate("a.jpg", "image/jpeg", 1024),
                candidate("b.jpg", "image/jpeg", 1024),
            ]})),
        )
        .await;

        let (status, body) =
            request(&app, "DELETE", &format!("/api/v1/sessions/{}/entries", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removed"], 2);

        let (_, view) = request(&app, "GET", &format!("/api/v1/sessions/{}", id), None).await;
        assert!(view["entries"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_session() {
        let app = app();
        let id = create_test_session(&app).await;

        let (status, _) = request(&app, "DELETE", &format!("/api/v1/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = request(&app, "GET", &format!("/api/v1/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let app = app();
        create_test_session(&app).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("lumiere_sessions_active"));
    }
}
