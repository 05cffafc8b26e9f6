//! Video encoding configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "veryfast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 18;
/// Default pixel format
pub const DEFAULT_PIX_FMT: &str = "yuv420p";
/// Default audio bitrate for music/extraction outputs
pub const DEFAULT_AUDIO_BITRATE: &str = "160k";

/// Video encoding configuration shared by every emitted command.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "veryfast", "medium")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Pixel format
    #[serde(default = "default_pix_fmt")]
    pub pix_fmt: String,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate for music/extraction outputs
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_pix_fmt() -> String {
    DEFAULT_PIX_FMT.to_string()
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: default_video_codec(),
            preset: default_preset(),
            crf: default_crf(),
            pix_fmt: default_pix_fmt(),
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
        }
    }
}

impl EncodingConfig {
    /// Standard output arguments for a re-encoded video.
    pub fn video_args(&self) -> Vec<String> {
        vec![
            "-c:v".into(),
            self.codec.clone(),
            "-preset".into(),
            self.preset.clone(),
            "-crf".into(),
            self.crf.to_string(),
            "-pix_fmt".into(),
            self.pix_fmt.clone(),
        ]
    }

    /// Standard output arguments for the audio track.
    pub fn audio_args(&self) -> Vec<String> {
        vec!["-c:a".into(), self.audio_codec.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_contract() {
        let cfg = EncodingConfig::default();
        assert_eq!(cfg.codec, "libx264");
        assert_eq!(cfg.preset, "veryfast");
        assert_eq!(cfg.crf, 18);
        assert_eq!(cfg.pix_fmt, "yuv420p");
        assert_eq!(cfg.audio_codec, "aac");
    }

    #[test]
    fn video_args_shape() {
        let args = EncodingConfig::default().video_args();
        assert_eq!(args[0], "-c:v");
        assert!(args.contains(&"yuv420p".to_string()));
    }
}
