use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::{
    analysis::result::AnalysisResult,
    auth::jwt::AuthUser,
    state::AppState,
};

pub fn analysis_routes() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub message: String,
    pub filename: String,
    pub analysis: AnalysisResult,
}

type JsonError = (StatusCode, Json<serde_json::Value>);

fn json_error(status: StatusCode, message: &str) -> JsonError {
    (status, Json(json!({ "message": message })))
}

/// POST /analyze — runs the stored file through the provider and attaches the
/// result to the matching upload record. The distinct orchestration failures
/// stay apart in logs but collapse to one 500 for the client.
#[instrument(skip(state, payload))]
pub async fn analyze(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, JsonError> {
    let Some(filename) = payload.filename.filter(|f| !f.is_empty()) else {
        return Err(json_error(StatusCode::BAD_REQUEST, "filename is required"));
    };

    let Some(record) = state.store.find_upload_by_filename(user_id, &filename).await else {
        warn!(user_id = %user_id, filename = %filename, "analyze for unknown upload");
        return Err(json_error(StatusCode::NOT_FOUND, "Upload not found"));
    };

    // Already analyzed: the field transitions once, so hand back what we have.
    if let Some(analysis) = record.analysis {
        return Ok(Json(AnalyzeResponse {
            message: "Analysis completed!".into(),
            filename,
            analysis,
        }));
    }

    let body = state.storage.read_object(&filename).await.map_err(|e| {
        error!(error = %e, filename = %filename, "reading stored upload failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Analysis failed", "error": e.to_string() })),
        )
    })?;

    let analysis = state.orchestrator.analyze(body).await.map_err(|e| {
        error!(error = %e, filename = %filename, "analysis orchestration failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Analysis failed", "error": e.to_string() })),
        )
    })?;

    if let Err(e) = state.store.attach_analysis(&filename, analysis.clone()).await {
        error!(error = %e, filename = %filename, "attach_analysis failed");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Analysis failed", "error": e.to_string() })),
        ));
    }

    info!(user_id = %user_id, filename = %filename, "analysis attached");
    Ok(Json(AnalyzeResponse {
        message: "Analysis completed!".into(),
        filename,
        analysis,
    }))
}
