use thiserror::Error;

/// Fatal pipeline errors. Any of these moves the owning job straight to
/// `Failed`; notification problems are swallowed by the dispatcher and never
/// appear here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to spawn {command}: {reason}")]
    SpawnFailed { command: String, reason: String },

    #[error("could not determine source duration: {0}")]
    ProbeFailed(String),

    #[error("transcode failed for rendition {rendition}: {tail}")]
    TranscodeFailed { rendition: String, tail: String },

    #[error("thumbnail extraction failed: {tail}")]
    ThumbnailFailed { tail: String },

    #[error("upload failed for {key}: {reason}")]
    UploadFailed { key: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
