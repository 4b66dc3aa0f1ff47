use std::path::PathBuf;

use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::workers::playlist::MASTER_NAME;
use crate::workers::thumbnail::THUMBNAIL_NAME;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Transcoding,
    Uploading,
    Notifying,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// In-memory record of one transcode job. Only the orchestrator task that
/// owns the job writes status/progress; everything else reads.
#[derive(Debug, Clone)]
pub struct Job {
    pub job_id: String,
    pub owner_id: String,
    pub caption: Option<String>,
    pub source_path: PathBuf,
    pub status: JobStatus,
    pub progress: f64,
    pub created_at: OffsetDateTime,
    pub started_at: Option<OffsetDateTime>,
    pub completed_at: Option<OffsetDateTime>,
    pub last_error: Option<String>,
    pub hls_url: String,
    pub thumbnail_url: String,
}

impl Job {
    /// Output URLs are a deterministic function of the job id, so they are
    /// known here, before any work starts.
    pub fn new(
        job_id: String,
        owner_id: String,
        caption: Option<String>,
        source_path: PathBuf,
        cdn_base: &str,
    ) -> Self {
        let hls_url = hls_url(cdn_base, &job_id);
        let thumbnail_url = thumbnail_url(cdn_base, &job_id);
        Self {
            job_id,
            owner_id,
            caption,
            source_path,
            status: JobStatus::Queued,
            progress: 0.0,
            created_at: OffsetDateTime::now_utc(),
            started_at: None,
            completed_at: None,
            last_error: None,
            hls_url,
            thumbnail_url,
        }
    }
}

/// Storage key namespace for one job's artifacts.
pub fn storage_prefix(job_id: &str) -> String {
    format!("reels/hls/{job_id}")
}

pub fn hls_url(cdn_base: &str, job_id: &str) -> String {
    format!(
        "{}/{}/{}",
        cdn_base.trim_end_matches('/'),
        storage_prefix(job_id),
        MASTER_NAME
    )
}

pub fn thumbnail_url(cdn_base: &str, job_id: &str) -> String {
    format!(
        "{}/{}/{}",
        cdn_base.trim_end_matches('/'),
        storage_prefix(job_id),
        THUMBNAIL_NAME
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_urls_are_deterministic_in_the_job_id() {
        assert_eq!(storage_prefix("abc123"), "reels/hls/abc123");
        assert_eq!(
            hls_url("https://cdn.example.com", "abc123"),
            "https://cdn.example.com/reels/hls/abc123/master.m3u8"
        );
        assert_eq!(
            thumbnail_url("https://cdn.example.com", "abc123"),
            "https://cdn.example.com/reels/hls/abc123/thumbnail.jpg"
        );
    }

    #[test]
    fn new_job_is_queued_with_urls_precomputed() {
        let job = Job::new(
            "abc123".to_string(),
            "user-1".to_string(),
            Some("hello".to_string()),
            PathBuf::from("/tmp/abc123_source.mp4"),
            "https://cdn.example.com",
        );
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.progress, 0.0);
        assert_eq!(
            job.hls_url,
            "https://cdn.example.com/reels/hls/abc123/master.m3u8"
        );
        assert!(job.started_at.is_none());
        assert!(job.last_error.is_none());
    }
}
