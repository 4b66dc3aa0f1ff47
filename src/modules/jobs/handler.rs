use crate::common::response::ApiError;
use crate::modules::jobs::dto::JobStatusResponse;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

#[utoipa::path(
    get,
    path = "/job/{job_id}/status",
    params(
        ("job_id" = String, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job status", body = JobStatusResponse),
        (status = 404, description = "Job not found")
    ),
    tag = "Jobs"
)]
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    match state.jobs.get(&job_id) {
        Some(job) => Json(JobStatusResponse {
            job_id: job.job_id,
            status: job.status,
            progress: job.progress.round() as u8,
        })
        .into_response(),
        None => ApiError("Job not found".to_string(), StatusCode::NOT_FOUND).into_response(),
    }
}
