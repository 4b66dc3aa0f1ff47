use std::path::PathBuf;

use axum::extract::{multipart::Field, Multipart};
use axum::http::StatusCode;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::info;
use uuid::Uuid;

use crate::common::response::ApiError;
use crate::modules::convert::dto::ConvertResponse;
use crate::modules::jobs::model::Job;
use crate::state::AppState;
use crate::workers::orchestrator;

pub struct ConvertService;

impl ConvertService {
    /// Accept the upload, stage the source in scratch, register the job and
    /// hand it to the orchestrator as a detached task. The HTTP response
    /// never waits on transcoding: the output URLs are a deterministic
    /// function of the job id, so they are correct before any work runs.
    pub async fn intake(
        state: AppState,
        mut multipart: Multipart,
    ) -> Result<ConvertResponse, ApiError> {
        let mut video_id: Option<String> = None;
        let mut owner_id: Option<String> = None;
        let mut caption: Option<String> = None;
        let mut staged: Option<(PathBuf, String)> = None;

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => {
                    if let Some((temp_path, _)) = staged {
                        let _ = tokio::fs::remove_file(&temp_path).await;
                    }
                    return Err(bad_request(format!("Malformed multipart request: {e}")));
                }
            };
            let name = field.name().map(|s| s.to_string());
            match name.as_deref() {
                Some("video") => staged = Some(Self::stage_upload(&state, field).await?),
                Some("videoId") => video_id = Some(read_text(field).await?),
                Some("userId") => owner_id = Some(read_text(field).await?),
                Some("caption") => caption = Some(read_text(field).await?),
                _ => {}
            }
        }

        let (temp_path, ext) = match staged {
            Some(staged) => staged,
            None => return Err(bad_request("Missing video field")),
        };

        let owner_id = match owner_id.filter(|s| !s.trim().is_empty()) {
            Some(owner_id) => owner_id,
            None => {
                let _ = tokio::fs::remove_file(&temp_path).await;
                return Err(bad_request("Missing userId field"));
            }
        };

        let job_id = match video_id.filter(|s| !s.is_empty()) {
            Some(id) => {
                if let Err(e) = validate_job_id(&id) {
                    let _ = tokio::fs::remove_file(&temp_path).await;
                    return Err(e);
                }
                id
            }
            None => Uuid::new_v4().as_simple().to_string(),
        };

        // A finished job id may be re-submitted; the new run overwrites the
        // objects under the same storage prefix. While the previous run is
        // still live the two would share a source path and work dir, so that
        // intake is refused instead.
        if let Some(existing) = state.jobs.get(&job_id) {
            if !existing.status.is_terminal() {
                let _ = tokio::fs::remove_file(&temp_path).await;
                return Err(ApiError(
                    format!("Job {job_id} is already in progress"),
                    StatusCode::CONFLICT,
                ));
            }
        }

        let source_path = state
            .config
            .scratch_dir
            .join(format!("{job_id}_source.{ext}"));
        if let Err(e) = tokio::fs::rename(&temp_path, &source_path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(internal(format!("Failed to stage source: {e}")));
        }

        let job = Job::new(
            job_id.clone(),
            owner_id.clone(),
            caption.filter(|c| !c.trim().is_empty()),
            source_path,
            &state.config.cdn_base_url,
        );
        state.jobs.insert(job.clone());

        info!("🎬 Accepted job {} for user {}", job_id, owner_id);

        let response = ConvertResponse {
            success: true,
            job_id,
            hls_url: job.hls_url.clone(),
            thumbnail_url: job.thumbnail_url.clone(),
            status: "processing".to_string(),
        };

        tokio::spawn(orchestrator::run_job(state, job));

        Ok(response)
    }

    /// Stream the video field to a staging file in scratch. The job id may
    /// arrive in a later field, so the file gets its final name afterwards.
    async fn stage_upload(
        state: &AppState,
        mut field: Field<'_>,
    ) -> Result<(PathBuf, String), ApiError> {
        let content_type = field.content_type().unwrap_or("").to_string();
        if !content_type.starts_with("video/") {
            return Err(bad_request(format!(
                "Invalid content type {content_type:?}: only video/* uploads are accepted"
            )));
        }

        let ext = source_extension(field.file_name());

        let temp_path = state
            .config
            .scratch_dir
            .join(format!("{}.upload", Uuid::new_v4().as_simple()));
        let mut file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| internal(format!("Failed to create staging file: {e}")))?;

        while let Some(chunk) = field.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let _ = tokio::fs::remove_file(&temp_path).await;
                    return Err(bad_request(format!("Upload stream interrupted: {e}")));
                }
            };
            if let Err(e) = file.write_all(&chunk).await {
                let _ = tokio::fs::remove_file(&temp_path).await;
                return Err(internal(format!("Failed to write staging file: {e}")));
            }
        }
        if let Err(e) = file.flush().await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(internal(format!("Failed to write staging file: {e}")));
        }

        Ok((temp_path, ext))
    }
}

async fn read_text(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| bad_request(format!("Malformed multipart field: {e}")))
}

fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError(message.into(), StatusCode::BAD_REQUEST)
}

fn internal(message: impl Into<String>) -> ApiError {
    ApiError(message.into(), StatusCode::INTERNAL_SERVER_ERROR)
}

/// Job ids double as storage key namespaces and scratch directory names.
fn validate_job_id(id: &str) -> Result<(), ApiError> {
    let valid = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(bad_request(
            "Invalid videoId: use up to 64 alphanumeric, '-' or '_' characters",
        ));
    }
    Ok(())
}

fn source_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| "mp4".to_string())
}
