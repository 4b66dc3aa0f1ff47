use std::path::{Path, PathBuf};

use crate::common::error::PipelineError;
use crate::workers::encoder::Rendition;

pub const MASTER_NAME: &str = "master.m3u8";

/// Write the master adaptive-bitrate manifest referencing every rendition
/// playlist by relative filename, in ladder order (not sorted by bitrate).
pub async fn write_master(
    out_dir: &Path,
    renditions: &[Rendition],
) -> Result<PathBuf, PipelineError> {
    let path = out_dir.join(MASTER_NAME);
    tokio::fs::write(&path, render_master(renditions)).await?;
    Ok(path)
}

/// Deterministic: the same ladder always yields byte-identical output.
pub fn render_master(renditions: &[Rendition]) -> String {
    let mut manifest = String::from("#EXTM3U\n#EXT-X-VERSION:3\n");
    for rendition in renditions {
        manifest.push_str(&format!(
            "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={}x{}\n{}.m3u8\n",
            rendition.video_bitrate_kbps * 1000,
            rendition.width,
            rendition.height,
            rendition.name
        ));
    }
    manifest
}
