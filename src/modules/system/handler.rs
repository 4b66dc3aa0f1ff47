use crate::common::response::ApiError;
use crate::modules::system::dto::{HealthResponse, StatsResponse};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is live", body = HealthResponse)
    ),
    tag = "System"
)]
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Runtime statistics", body = StatsResponse),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "System"
)]
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let mut scratch_files = 0;
    let mut scratch_dirs = 0;

    let mut entries = match tokio::fs::read_dir(&state.config.scratch_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            return ApiError(
                format!("Failed to read scratch directory: {e}"),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .into_response()
        }
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        match entry.file_type().await {
            Ok(kind) if kind.is_dir() => scratch_dirs += 1,
            Ok(_) => scratch_files += 1,
            Err(_) => {}
        }
    }

    Json(StatsResponse {
        scratch_files,
        scratch_dirs,
        jobs_total: state.jobs.len(),
        jobs_active: state.jobs.active_count(),
        encoders_active: state.processes.active_count().await,
        uptime_seconds: state.started_at.elapsed().as_secs(),
        memory_rss_bytes: resident_memory_bytes(),
    })
    .into_response()
}

/// Resident set size from /proc; `None` off Linux.
fn resident_memory_bytes() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            let kb: u64 = rest.trim().trim_end_matches("kB").trim().parse().ok()?;
            return Some(kb * 1024);
        }
    }
    None
}
