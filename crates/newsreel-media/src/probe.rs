//! FFprobe media measurement.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::warn;

use crate::error::{MediaError, MediaResult};

/// Media file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Width in pixels (zero for audio-only files)
    pub width: u32,
    /// Height in pixels (zero for audio-only files)
    pub height: u32,
    /// Frame rate (fps)
    pub fps: f64,
    /// Codec of the first video stream, if any
    pub codec: String,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

/// Probe a media file for information.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

    let duration = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");

    let fps = video_stream
        .and_then(|s| s.avg_frame_rate.as_deref().or(s.r_frame_rate.as_deref()))
        .and_then(parse_frame_rate)
        .unwrap_or(0.0);

    Ok(MediaInfo {
        duration,
        width: video_stream.and_then(|s| s.width).unwrap_or(0),
        height: video_stream.and_then(|s| s.height).unwrap_or(0),
        fps,
        codec: video_stream
            .and_then(|s| s.codec_name.clone())
            .unwrap_or_default(),
    })
}

/// Measure a duration, absorbing every failure into the zero sentinel.
///
/// Downstream logic treats zero as "unknown/unusable", never as a real
/// duration; batch assembly must survive unreadable or truncated source
/// assets, so this never returns an error.
pub async fn duration_or_zero(path: impl AsRef<Path>) -> f64 {
    let path = path.as_ref();
    match probe_media(path).await {
        Ok(info) if info.duration.is_finite() && info.duration > 0.0 => info.duration,
        Ok(_) => {
            warn!(path = %path.display(), "probe returned non-positive duration, using 0");
            0.0
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "probe failed, using 0");
            0.0
        }
    }
}

/// Parse frame rate string (e.g., "30/1" or "29.97").
fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_frame_rates() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
        assert!(parse_frame_rate("n/a").is_none());
    }

    #[tokio::test]
    async fn missing_file_yields_zero_sentinel() {
        let d = duration_or_zero("/definitely/not/here.mp4").await;
        assert_eq!(d, 0.0);
    }

    #[tokio::test]
    async fn unreadable_media_yields_zero_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.mp4");
        std::fs::write(&path, b"not a video").unwrap();
        assert_eq!(duration_or_zero(&path).await, 0.0);
    }

    #[test]
    fn ffprobe_json_shape() {
        let json = r#"{
            "format": {"duration": "12.500"},
            "streams": [
                {"codec_type": "audio", "codec_name": "aac"},
                {"codec_type": "video", "codec_name": "h264",
                 "width": 1920, "height": 1080, "avg_frame_rate": "30000/1001"}
            ]
        }"#;
        let out: FfprobeOutput = serde_json::from_str(json).unwrap();
        assert_eq!(out.streams.len(), 2);
        assert_eq!(out.format.duration.as_deref(), Some("12.500"));
    }
}
