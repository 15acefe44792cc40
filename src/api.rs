//! REST API Server for the Financial Document Analyzer
//!
//! Accepts a PDF upload, runs the crew over it and returns the analysis.
//! Uploaded bytes live in a temp file for the duration of one request.

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::crew::Crew;
use crate::error::AnalyzerError;
use crate::models::{AnalysisResponse, CrewInputs};
use crate::Result;

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub crew: Arc<Crew>,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

/// =============================
/// Error Response
/// =============================

/// Every failure surfaces as a 500 with a `detail` message
struct ApiError(AnalyzerError);

impl From<AnalyzerError> for ApiError {
    fn from(e: AnalyzerError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self.0, "Request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "detail": format!("Error processing financial document: {}", self.0)
            })),
        )
            .into_response()
    }
}

/// =============================
/// Temp File Guard
/// =============================

/// Removes the uploaded file when the request ends, including on early
/// return, error or cancellation.
struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    fn new(upload_dir: &Path) -> Self {
        Self {
            path: upload_dir.join(format!("financial_document_{}.pdf", Uuid::new_v4())),
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => info!(path = %self.path.display(), "Temp upload removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove temp upload"),
        }
    }
}

/// =============================
/// Health Endpoints
/// =============================

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Financial Document Analyzer API is running"
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Analyze Endpoint
/// =============================

async fn analyze_financial_document(
    State(state): State<ApiState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> std::result::Result<Json<AnalysisResponse>, ApiError> {
    let mut multipart =
        multipart.map_err(|e| AnalyzerError::UploadError(e.body_text()))?;

    let upload = TempUpload::new(&state.upload_dir);
    let response = process_upload(&state, &mut multipart, upload.path()).await?;
    drop(upload);

    Ok(Json(response))
}

async fn process_upload(
    state: &ApiState,
    multipart: &mut Multipart,
    path: &Path,
) -> Result<AnalysisResponse> {
    let mut file_name: Option<String> = None;
    let mut query: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);

        match name.as_deref() {
            Some("file") => {
                let original = field.file_name().unwrap_or("upload.pdf").to_string();
                let bytes = field.bytes().await?;

                tokio::fs::create_dir_all(&state.upload_dir).await?;
                tokio::fs::write(path, &bytes).await?;

                info!(
                    file = %original,
                    bytes = bytes.len(),
                    path = %path.display(),
                    "Upload stored"
                );
                file_name = Some(original);
            }
            Some("query") => query = Some(field.text().await?),
            other => warn!(field = ?other, "Ignoring unexpected multipart field"),
        }
    }

    let file_name = file_name.ok_or_else(|| {
        AnalyzerError::UploadError("no file uploaded; expected multipart field 'file'".to_string())
    })?;

    let inputs = CrewInputs::new(query.as_deref(), path);
    info!(file = %file_name, query = %inputs.query, "Received analysis request");

    let query = inputs.query.clone();
    let output = state.crew.kickoff(inputs).await?;

    Ok(AnalysisResponse {
        status: "success".to_string(),
        query,
        analysis: output.to_string(),
        file_processed: file_name,
    })
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/analyze", post(analyze_financial_document))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    addr: &str,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("API Server listening on http://{}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
