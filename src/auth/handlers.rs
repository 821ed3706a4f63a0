use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, SignupRequest, SignupResponse},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        user::User,
    },
    state::AppState,
    store::StoreError,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), (StatusCode, String)> {
    let (Some(username), Some(password), Some(skin_type)) =
        (payload.username, payload.password, payload.skin_type)
    else {
        warn!("signup with missing fields");
        return Err((
            StatusCode::BAD_REQUEST,
            "username, password and skinType are required".into(),
        ));
    };
    let username = username.trim().to_lowercase();
    if username.is_empty() || password.is_empty() || skin_type.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "username, password and skinType are required".into(),
        ));
    }

    let hash = match hash_password(&password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "hash_password failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    let user = User::new(&username, &hash, &skin_type);
    match state.store.append_user(user.clone()).await {
        Ok(()) => {}
        Err(StoreError::DuplicateUser) => {
            warn!(username = %username, "username already registered");
            return Err((StatusCode::BAD_REQUEST, "User already exists".into()));
        }
        Err(e) => {
            error!(error = %e, "append_user failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    }

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            id: user.id,
            username: user.username,
            skin_type: user.skin_type,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, String)> {
    let (Some(username), Some(password)) = (payload.username, payload.password) else {
        return Err((
            StatusCode::BAD_REQUEST,
            "username and password are required".into(),
        ));
    };
    let username = username.trim().to_lowercase();

    let user = match state.store.find_user_by_username(&username).await {
        Some(u) => u,
        None => {
            warn!(username = %username, "login unknown username");
            return Err((StatusCode::BAD_REQUEST, "Invalid credentials".into()));
        }
    };

    let ok = match verify_password(&password, &user.password_hash) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "verify_password failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };
    if !ok {
        warn!(username = %username, user_id = %user.id, "login invalid password");
        return Err((StatusCode::BAD_REQUEST, "Invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = match keys.sign(&user) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "jwt sign failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(LoginResponse { token }))
}
