use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod orchestrator;
pub mod provider;
pub mod result;

pub fn router() -> Router<AppState> {
    handlers::analysis_routes()
}
