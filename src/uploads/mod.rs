use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod record;
pub mod service;

pub fn router() -> Router<AppState> {
    handlers::upload_routes()
}
