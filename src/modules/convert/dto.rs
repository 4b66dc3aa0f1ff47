use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub success: bool,
    pub job_id: String,
    pub hls_url: String,
    pub thumbnail_url: String,
    pub status: String,
}
