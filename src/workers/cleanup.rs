use std::io::ErrorKind;
use std::path::Path;

use tracing::warn;

/// Remove the job's source file and working directory. Idempotent: missing
/// paths are fine, anything else is logged and never escalated.
pub async fn cleanup(source_path: &Path, work_dir: &Path) {
    if let Err(e) = tokio::fs::remove_file(source_path).await {
        if e.kind() != ErrorKind::NotFound {
            warn!("⚠️ Failed to remove source {}: {}", source_path.display(), e);
        }
    }

    if let Err(e) = tokio::fs::remove_dir_all(work_dir).await {
        if e.kind() != ErrorKind::NotFound {
            warn!("⚠️ Failed to remove work dir {}: {}", work_dir.display(), e);
        }
    }
}
