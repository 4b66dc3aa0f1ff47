use std::path::{Path, PathBuf};

use crate::common::error::PipelineError;
use crate::infrastructure::process::runner::{ensure_tool, ProcessEvent, ProcessRegistry};
use crate::workers::encoder::push_tail;

pub const THUMBNAIL_NAME: &str = "thumbnail.jpg";

/// Grab one representative frame at t=1s, scaled to width 640.
pub async fn extract_thumbnail(
    processes: &ProcessRegistry,
    input: &Path,
    out_dir: &Path,
) -> Result<PathBuf, PipelineError> {
    ensure_tool("ffmpeg")?;

    let output = out_dir.join(THUMBNAIL_NAME);
    let args = thumbnail_args(input, &output);
    let mut extract = processes.spawn("ffmpeg", &args).await?;

    let mut tail = String::new();
    let mut code = -1;
    while let Some(event) = extract.next_event().await {
        match event {
            ProcessEvent::Stdout(line) | ProcessEvent::Stderr(line) => {
                push_tail(&mut tail, &line);
            }
            ProcessEvent::Exited(c) => code = c,
        }
    }

    if code != 0 {
        return Err(PipelineError::ThumbnailFailed { tail });
    }

    Ok(output)
}

pub fn thumbnail_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-ss".to_string(),
        "1".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
        "-vframes".to_string(),
        "1".to_string(),
        // -2 keeps the computed height even, which libjpeg insists on
        "-vf".to_string(),
        "scale=640:-2".to_string(),
        "-q:v".to_string(),
        "2".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}
