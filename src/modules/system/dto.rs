use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub scratch_files: usize,
    pub scratch_dirs: usize,
    pub jobs_total: usize,
    pub jobs_active: usize,
    pub encoders_active: usize,
    pub uptime_seconds: u64,
    pub memory_rss_bytes: Option<u64>,
}
