//! Error types for graph compilation and media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while compiling or running media commands.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("scene {scene_index} ({stage}): main reference is missing")]
    MissingMainReference { stage: String, scene_index: usize },

    #[error("layout {layout} requires template asset {asset}")]
    MissingTemplateAsset { layout: String, asset: &'static str },

    #[error("duplicate graph input key: {0}")]
    DuplicateInput(String),

    #[error("graph input not registered: {0}")]
    InputNotRegistered(String),

    #[error("no clips supplied for concatenation")]
    EmptyConcat,

    #[error("transcript has no usable words")]
    EmptyTranscript,

    #[error("target duration must be positive, got {0}")]
    InvalidTargetDuration(f64),

    #[error("no usable background music tracks")]
    NoMusicTracks,

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid media file: {0}")]
    InvalidMedia(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a missing-main-reference error for one scene.
    pub fn missing_main_reference(stage: impl Into<String>, scene_index: usize) -> Self {
        Self::MissingMainReference {
            stage: stage.into(),
            scene_index,
        }
    }
}
