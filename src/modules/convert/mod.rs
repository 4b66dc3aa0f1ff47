use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;

pub mod dto;
pub mod handler;
pub mod service;

/// Uploads are bounded at 500MB.
pub const MAX_UPLOAD_BYTES: usize = 500 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/convert", post(handler::convert))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
