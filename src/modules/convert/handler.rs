use crate::modules::convert::dto::ConvertResponse;
use crate::modules::convert::service::ConvertService;
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

#[utoipa::path(
    post,
    path = "/convert",
    responses(
        (status = 200, description = "Job accepted, processing in background", body = ConvertResponse),
        (status = 400, description = "Invalid upload"),
        (status = 409, description = "A job with this id is still in progress"),
    ),
    tag = "Convert"
)]
pub async fn convert(State(state): State<AppState>, multipart: Multipart) -> impl IntoResponse {
    match ConvertService::intake(state, multipart).await {
        Ok(res) => (StatusCode::OK, Json(res)).into_response(),
        Err(e) => e.into_response(),
    }
}
