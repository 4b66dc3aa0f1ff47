use std::path::Path;

use tracing::{error, info};

use crate::common::error::PipelineError;
use crate::modules::jobs::model::{storage_prefix, Job, JobStatus};
use crate::state::AppState;
use crate::workers::notifier::SuccessPayload;
use crate::workers::{cleanup, encoder, playlist, thumbnail, uploader};

// Stage offsets on the job progress scale. Encoding owns 0..80; the rest of
// the pipeline shares the final 20 points.
const PROGRESS_MANIFEST: f64 = 85.0;
const PROGRESS_THUMBNAIL: f64 = 90.0;
const UPLOAD_PROGRESS_SHARE: f64 = 10.0;

/// Drive one job through the pipeline. Runs as a detached task; errors never
/// reach the intake response. Cleanup runs on every terminal path, and a
/// failure is additionally reported through the (best-effort) dispatcher.
pub async fn run_job(state: AppState, job: Job) {
    info!("🎬 Job {} started for user {}", job.job_id, job.owner_id);
    let work_dir = state.config.scratch_dir.join(&job.job_id);

    match run_pipeline(&state, &job, &work_dir).await {
        Ok(()) => {
            state.jobs.set_status(&job.job_id, JobStatus::Notifying);
            state
                .notifier
                .notify_success(
                    &job.owner_id,
                    SuccessPayload {
                        job_id: job.job_id.clone(),
                        hls_url: job.hls_url.clone(),
                        thumbnail_url: job.thumbnail_url.clone(),
                        caption: job.caption.clone(),
                    },
                )
                .await;

            cleanup::cleanup(&job.source_path, &work_dir).await;
            state.jobs.complete(&job.job_id);
            info!("✅ Job {} completed: {}", job.job_id, job.hls_url);
        }
        Err(e) => {
            error!("❌ Job {} failed: {}", job.job_id, e);
            cleanup::cleanup(&job.source_path, &work_dir).await;
            state
                .notifier
                .notify_failure(&job.owner_id, &job.job_id, &e.to_string())
                .await;
            state.jobs.fail(&job.job_id, e.to_string());
        }
    }
}

/// The fallible stages: transcode the full ladder, assemble the master
/// manifest, extract the thumbnail, then publish. Upload starts only once the
/// complete local package exists, so a late rendition failure never leaves a
/// half-published prefix.
async fn run_pipeline(
    state: &AppState,
    job: &Job,
    work_dir: &Path,
) -> Result<(), PipelineError> {
    tokio::fs::create_dir_all(work_dir).await?;

    state.jobs.set_status(&job.job_id, JobStatus::Transcoding);
    {
        let jobs = state.jobs.clone();
        let job_id = job.job_id.clone();
        encoder::encode_ladder(
            &state.processes,
            &job.source_path,
            work_dir,
            &encoder::LADDER,
            move |overall| jobs.set_progress(&job_id, overall),
        )
        .await?;
    }

    playlist::write_master(work_dir, &encoder::LADDER).await?;
    state.jobs.set_progress(&job.job_id, PROGRESS_MANIFEST);

    thumbnail::extract_thumbnail(&state.processes, &job.source_path, work_dir).await?;
    state.jobs.set_progress(&job.job_id, PROGRESS_THUMBNAIL);

    state.jobs.set_status(&job.job_id, JobStatus::Uploading);
    let prefix = storage_prefix(&job.job_id);
    {
        let jobs = state.jobs.clone();
        let job_id = job.job_id.clone();
        uploader::upload_directory(
            &state.storage,
            work_dir,
            &prefix,
            &state.config.cdn_base_url,
            move |percent| {
                jobs.set_progress(
                    &job_id,
                    PROGRESS_THUMBNAIL + percent / 100.0 * UPLOAD_PROGRESS_SHARE,
                )
            },
        )
        .await?;
    }

    Ok(())
}
