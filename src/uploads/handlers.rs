use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{error, instrument, warn};

use crate::{
    auth::jwt::AuthUser,
    state::AppState,
    uploads::{record::UploadRecord, service},
};

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/uploads", get(list_uploads))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

/// POST /upload (multipart, field `image`)
#[instrument(skip(state, mp))]
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<Json<UploadRecord>, (StatusCode, String)> {
    let mut file: Option<(Bytes, Option<String>)> = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() == Some("image") {
            let original = field.file_name().map(|s| s.to_string());
            let data = field.bytes().await.map_err(|e| {
                error!(error = %e, "reading multipart field failed");
                (StatusCode::BAD_REQUEST, "could not read image field".to_string())
            })?;
            file = Some((data, original));
        }
    }

    let Some((body, original)) = file else {
        warn!(user_id = %user_id, "upload without image field");
        return Err((StatusCode::BAD_REQUEST, "image file is required".into()));
    };
    if body.is_empty() {
        warn!(user_id = %user_id, "upload with empty image");
        return Err((StatusCode::BAD_REQUEST, "image file is required".into()));
    }

    let Some(user) = state.store.find_user_by_id(user_id).await else {
        warn!(user_id = %user_id, "upload for unknown user");
        return Err((StatusCode::NOT_FOUND, "User not found".into()));
    };

    let record = service::receive(&state, &user, body, original.as_deref())
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user_id, "receive failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(record))
}

/// GET /uploads — the caller's records, newest first.
#[instrument(skip(state))]
pub async fn list_uploads(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Json<Vec<UploadRecord>> {
    Json(state.store.find_uploads_by_user(user_id).await)
}
