use std::path::Path;

use tracing::info;

use crate::common::error::PipelineError;
use crate::infrastructure::storage::s3::StorageService;
use crate::workers::playlist::MASTER_NAME;

/// Re-encodes must propagate immediately, so manifests are never cached;
/// segments and the thumbnail are content-addressed by job id and can be
/// cached for a year.
const CACHE_FOREVER: &str = "public, max-age=31536000";
const CACHE_NEVER: &str = "public, max-age=0";

pub fn content_type_for(file_name: &str) -> &'static str {
    match extension(file_name) {
        "m3u8" => "application/vnd.apple.mpegurl",
        "ts" => "video/MP2T",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

pub fn cache_control_for(file_name: &str) -> &'static str {
    match extension(file_name) {
        "m3u8" => CACHE_NEVER,
        _ => CACHE_FOREVER,
    }
}

fn extension(file_name: &str) -> &str {
    file_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("")
}

/// Canonical published manifest URL for a remote prefix.
pub fn canonical_url(cdn_base: &str, remote_prefix: &str) -> String {
    format!(
        "{}/{}/{}",
        cdn_base.trim_end_matches('/'),
        remote_prefix.trim_matches('/'),
        MASTER_NAME
    )
}

/// Upload every file of the finished local package under `remote_prefix`,
/// sequentially. Progress is file-count granularity (0..100). The first
/// failing file aborts the rest; there is no partial-publish retry.
pub async fn upload_directory<F>(
    storage: &StorageService,
    local_dir: &Path,
    remote_prefix: &str,
    cdn_base: &str,
    mut on_progress: F,
) -> Result<String, PipelineError>
where
    F: FnMut(f64),
{
    let mut file_names = Vec::new();
    let mut entries = tokio::fs::read_dir(local_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            file_names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    // read_dir order is filesystem-dependent
    file_names.sort();

    let total = file_names.len();
    info!("⬆️ Uploading {} files to {}", total, remote_prefix);

    for (done, name) in file_names.iter().enumerate() {
        let key = format!("{}/{}", remote_prefix.trim_matches('/'), name);
        let body = tokio::fs::read(local_dir.join(name)).await?;

        storage
            .put_object(&key, body, content_type_for(name), cache_control_for(name))
            .await
            .map_err(|e| PipelineError::UploadFailed {
                key: key.clone(),
                reason: e.to_string(),
            })?;

        on_progress((done + 1) as f64 / total as f64 * 100.0);
    }

    Ok(canonical_url(cdn_base, remote_prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for("master.m3u8"), "application/vnd.apple.mpegurl");
        assert_eq!(content_type_for("720p.m3u8"), "application/vnd.apple.mpegurl");
        assert_eq!(content_type_for("720p_000.ts"), "video/MP2T");
        assert_eq!(content_type_for("thumbnail.jpg"), "image/jpeg");
        assert_eq!(content_type_for("frame.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("notes.txt"), "application/octet-stream");
        assert_eq!(content_type_for("no-extension"), "application/octet-stream");
    }

    #[test]
    fn manifests_are_uncached_and_media_is_immutable() {
        assert_eq!(cache_control_for("master.m3u8"), "public, max-age=0");
        assert_eq!(cache_control_for("480p.m3u8"), "public, max-age=0");
        assert_eq!(cache_control_for("480p_001.ts"), "public, max-age=31536000");
        assert_eq!(cache_control_for("thumbnail.jpg"), "public, max-age=31536000");
    }

    #[test]
    fn canonical_url_points_at_the_master_manifest() {
        assert_eq!(
            canonical_url("https://cdn.example.com", "reels/hls/abc123"),
            "https://cdn.example.com/reels/hls/abc123/master.m3u8"
        );
        // trailing slash on the base must not double up
        assert_eq!(
            canonical_url("https://cdn.example.com/", "reels/hls/abc123"),
            "https://cdn.example.com/reels/hls/abc123/master.m3u8"
        );
    }
}
