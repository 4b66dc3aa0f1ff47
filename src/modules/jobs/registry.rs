use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use time::OffsetDateTime;

use super::model::{Job, JobStatus};

/// Process-lifetime job table behind the status endpoint. Does not survive a
/// restart; an interrupted job is simply gone along with its scratch files.
#[derive(Clone, Default)]
pub struct JobRegistry {
    inner: Arc<RwLock<HashMap<String, Job>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, job: Job) {
        self.inner.write().unwrap().insert(job.job_id.clone(), job);
    }

    pub fn get(&self, job_id: &str) -> Option<Job> {
        self.inner.read().unwrap().get(job_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn active_count(&self) -> usize {
        self.inner
            .read()
            .unwrap()
            .values()
            .filter(|job| !job.status.is_terminal())
            .count()
    }

    /// Move a job to a new non-terminal stage. A job that already reached a
    /// terminal status keeps it; there is exactly one terminal transition.
    pub fn set_status(&self, job_id: &str, status: JobStatus) {
        let mut jobs = self.inner.write().unwrap();
        if let Some(job) = jobs.get_mut(job_id) {
            if job.status.is_terminal() {
                return;
            }
            if status == JobStatus::Transcoding && job.started_at.is_none() {
                job.started_at = Some(OffsetDateTime::now_utc());
            }
            job.status = status;
        }
    }

    /// Progress only moves forward; stages hand over at increasing offsets so
    /// a monotone clamp is enough.
    pub fn set_progress(&self, job_id: &str, progress: f64) {
        let mut jobs = self.inner.write().unwrap();
        if let Some(job) = jobs.get_mut(job_id) {
            if job.status.is_terminal() {
                return;
            }
            job.progress = job.progress.max(progress.clamp(0.0, 100.0));
        }
    }

    pub fn complete(&self, job_id: &str) {
        let mut jobs = self.inner.write().unwrap();
        if let Some(job) = jobs.get_mut(job_id) {
            if job.status.is_terminal() {
                return;
            }
            job.status = JobStatus::Completed;
            job.progress = 100.0;
            job.completed_at = Some(OffsetDateTime::now_utc());
        }
    }

    pub fn fail(&self, job_id: &str, error: String) {
        let mut jobs = self.inner.write().unwrap();
        if let Some(job) = jobs.get_mut(job_id) {
            if job.status.is_terminal() {
                return;
            }
            job.status = JobStatus::Failed;
            job.last_error = Some(error);
            job.completed_at = Some(OffsetDateTime::now_utc());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn job(id: &str) -> Job {
        Job::new(
            id.to_string(),
            "user-1".to_string(),
            None,
            PathBuf::from(format!("/tmp/{id}_source.mp4")),
            "https://cdn.example.com",
        )
    }

    #[test]
    fn walks_through_the_pipeline_stages() {
        let registry = JobRegistry::new();
        registry.insert(job("a"));

        registry.set_status("a", JobStatus::Transcoding);
        let current = registry.get("a").unwrap();
        assert_eq!(current.status, JobStatus::Transcoding);
        assert!(current.started_at.is_some());

        registry.set_status("a", JobStatus::Uploading);
        registry.set_status("a", JobStatus::Notifying);
        registry.complete("a");

        let done = registry.get("a").unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.progress, 100.0);
        assert!(done.completed_at.is_some());
    }

    #[test]
    fn progress_is_monotone_and_clamped() {
        let registry = JobRegistry::new();
        registry.insert(job("a"));

        registry.set_progress("a", 40.0);
        registry.set_progress("a", 35.0);
        assert_eq!(registry.get("a").unwrap().progress, 40.0);

        registry.set_progress("a", 250.0);
        assert_eq!(registry.get("a").unwrap().progress, 100.0);
    }

    #[test]
    fn terminal_status_is_exclusive() {
        let registry = JobRegistry::new();
        registry.insert(job("a"));

        registry.fail("a", "encoder exploded".to_string());
        let failed = registry.get("a").unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.last_error.as_deref(), Some("encoder exploded"));

        // A failed job cannot be revived or re-terminated.
        registry.complete("a");
        registry.set_status("a", JobStatus::Uploading);
        registry.set_progress("a", 99.0);
        let still_failed = registry.get("a").unwrap();
        assert_eq!(still_failed.status, JobStatus::Failed);
        assert!(still_failed.progress < 99.0);
    }

    #[test]
    fn counts_only_live_jobs_as_active() {
        let registry = JobRegistry::new();
        registry.insert(job("a"));
        registry.insert(job("b"));
        registry.complete("b");

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.active_count(), 1);
    }
}
