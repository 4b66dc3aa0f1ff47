use crate::state::AppState;
use axum::routing::get;
use axum::Router;

pub mod dto;
pub mod handler;
pub mod model;
pub mod registry;

pub fn router() -> Router<AppState> {
    Router::new().route("/job/{job_id}/status", get(handler::job_status))
}
