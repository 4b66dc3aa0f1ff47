use std::path::Path;

use tracing::info;

use crate::common::error::PipelineError;
use crate::infrastructure::process::runner::{ensure_tool, ProcessEvent, ProcessRegistry};

pub const SEGMENT_SECONDS: u32 = 6;

/// Encoding takes the first 80 points of the job's progress scale; manifest,
/// thumbnail and upload share the rest.
pub const ENCODE_PROGRESS_SHARE: f64 = 80.0;

// Tuned for bounded memory/CPU per encode rather than maximal quality: fast
// preset, fixed quality factor, capped threads and mux queue.
const PRESET: &str = "veryfast";
const CRF: u32 = 28;
const ENCODE_THREADS: u32 = 2;
const MUX_QUEUE_SIZE: u32 = 1024;

const STDERR_TAIL_BYTES: usize = 500;
const PROGRESS_STEP_POINTS: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendition {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub video_bitrate_kbps: u32,
    pub audio_bitrate_kbps: u32,
}

/// The fixed rendition ladder. Order is preserved end-to-end: encode order,
/// manifest order. Every job gets both renditions regardless of source size.
pub const LADDER: [Rendition; 2] = [
    Rendition {
        name: "720p",
        width: 1280,
        height: 720,
        video_bitrate_kbps: 2500,
        audio_bitrate_kbps: 128,
    },
    Rendition {
        name: "480p",
        width: 854,
        height: 480,
        video_bitrate_kbps: 1200,
        audio_bitrate_kbps: 96,
    },
];

/// Probe the source duration in seconds via ffprobe.
pub async fn probe_duration(
    processes: &ProcessRegistry,
    input: &Path,
) -> Result<f64, PipelineError> {
    ensure_tool("ffprobe")?;

    let mut args: Vec<String> = [
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(input.to_string_lossy().into_owned());

    let mut probe = processes.spawn("ffprobe", &args).await?;

    let mut stdout = String::new();
    let mut code = -1;
    while let Some(event) = probe.next_event().await {
        match event {
            ProcessEvent::Stdout(line) => {
                stdout.push_str(line.trim());
                stdout.push('\n');
            }
            ProcessEvent::Stderr(_) => {}
            ProcessEvent::Exited(c) => code = c,
        }
    }

    if code != 0 {
        return Err(PipelineError::ProbeFailed(format!(
            "ffprobe exited with status {code}"
        )));
    }

    let seconds: f64 = stdout.trim().parse().map_err(|_| {
        PipelineError::ProbeFailed(format!("unparseable duration {:?}", stdout.trim()))
    })?;

    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(PipelineError::ProbeFailed(format!(
            "non-positive duration {seconds}"
        )));
    }

    Ok(seconds)
}

/// Encode the full ladder, strictly one rendition at a time to bound peak
/// memory and CPU. `on_progress` receives the overall encode progress on the
/// job's 0..80 scale.
pub async fn encode_ladder<F>(
    processes: &ProcessRegistry,
    input: &Path,
    out_dir: &Path,
    renditions: &[Rendition],
    mut on_progress: F,
) -> Result<(), PipelineError>
where
    F: FnMut(f64),
{
    ensure_tool("ffmpeg")?;

    let total_seconds = probe_duration(processes, input).await?;
    info!(
        "🎞 Source is {:.2}s, encoding {} renditions sequentially",
        total_seconds,
        renditions.len()
    );

    let count = renditions.len();
    for (index, rendition) in renditions.iter().enumerate() {
        info!(
            "🎞 Encoding {} ({}x{} @ {}kbps)",
            rendition.name, rendition.width, rendition.height, rendition.video_bitrate_kbps
        );
        encode_rendition(processes, input, out_dir, rendition, total_seconds, |fraction| {
            on_progress(ladder_progress(index, fraction, count));
        })
        .await?;
    }

    Ok(())
}

/// Overall ladder progress on the job scale: `(completed + fraction) / count * 80`.
pub fn ladder_progress(completed: usize, fraction: f64, count: usize) -> f64 {
    (completed as f64 + fraction) / count as f64 * ENCODE_PROGRESS_SHARE
}

async fn encode_rendition<F>(
    processes: &ProcessRegistry,
    input: &Path,
    out_dir: &Path,
    rendition: &Rendition,
    total_seconds: f64,
    mut on_fraction: F,
) -> Result<(), PipelineError>
where
    F: FnMut(f64),
{
    let args = rendition_args(input, out_dir, rendition);
    let mut encode = processes.spawn("ffmpeg", &args).await?;

    let mut tail = String::new();
    let mut gate = ProgressGate::new();
    let mut code = -1;

    while let Some(event) = encode.next_event().await {
        match event {
            ProcessEvent::Stderr(line) => {
                push_tail(&mut tail, &line);
                // ffmpeg reports elapsed output time on its diagnostic stream
                if let Some(elapsed) = parse_time_marker(&line) {
                    let fraction = (elapsed / total_seconds).clamp(0.0, 1.0);
                    if gate.advance(fraction * 100.0) {
                        on_fraction(fraction);
                    }
                }
            }
            ProcessEvent::Stdout(line) => push_tail(&mut tail, &line),
            ProcessEvent::Exited(c) => code = c,
        }
    }

    if code != 0 {
        return Err(PipelineError::TranscodeFailed {
            rendition: rendition.name.to_string(),
            tail,
        });
    }

    // Mandatory final report so the denoise gate can never swallow completion.
    on_fraction(1.0);
    Ok(())
}

/// ffmpeg arguments for one rendition: scale-and-pad to the target box
/// preserving aspect ratio, then segment into 6s independent HLS chunks.
pub fn rendition_args(input: &Path, out_dir: &Path, rendition: &Rendition) -> Vec<String> {
    let filter = format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
        w = rendition.width,
        h = rendition.height
    );

    vec![
        "-y".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
        "-vf".to_string(),
        filter,
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        PRESET.to_string(),
        "-crf".to_string(),
        CRF.to_string(),
        "-maxrate".to_string(),
        format!("{}k", rendition.video_bitrate_kbps),
        "-bufsize".to_string(),
        format!("{}k", rendition.video_bitrate_kbps * 2),
        "-threads".to_string(),
        ENCODE_THREADS.to_string(),
        "-max_muxing_queue_size".to_string(),
        MUX_QUEUE_SIZE.to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        format!("{}k", rendition.audio_bitrate_kbps),
        "-f".to_string(),
        "hls".to_string(),
        "-hls_time".to_string(),
        SEGMENT_SECONDS.to_string(),
        "-hls_playlist_type".to_string(),
        "vod".to_string(),
        "-hls_flags".to_string(),
        "independent_segments".to_string(),
        "-hls_segment_filename".to_string(),
        out_dir
            .join(format!("{}_%03d.ts", rendition.name))
            .to_string_lossy()
            .into_owned(),
        out_dir
            .join(format!("{}.m3u8", rendition.name))
            .to_string_lossy()
            .into_owned(),
    ]
}

/// Pull the elapsed encode time out of an ffmpeg stderr line, e.g.
/// `frame=  120 fps= 30 ... time=00:00:05.00 bitrate=...`.
fn parse_time_marker(line: &str) -> Option<f64> {
    let idx = line.find("time=")?;
    let token = line[idx + 5..].split_whitespace().next()?;
    if token.starts_with('-') || token == "N/A" {
        return None;
    }

    let mut parts = token.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Rolling tail of the diagnostic stream, kept for operator diagnosis when an
/// encode dies.
pub(crate) fn push_tail(tail: &mut String, line: &str) {
    tail.push_str(line);
    tail.push('\n');
    if tail.len() > STDERR_TAIL_BYTES {
        let mut cut = tail.len() - STDERR_TAIL_BYTES;
        while !tail.is_char_boundary(cut) {
            cut += 1;
        }
        tail.drain(..cut);
    }
}

/// Denoise gate: only report once progress advanced at least 5 points since
/// the previous report.
struct ProgressGate {
    last: f64,
}

impl ProgressGate {
    fn new() -> Self {
        Self { last: 0.0 }
    }

    fn advance(&mut self, percent: f64) -> bool {
        if percent - self.last >= PROGRESS_STEP_POINTS {
            self.last = percent;
            return true;
        }
        false
    }
}
