//! Duration cap enforcement via uniform playback speed-up.

use std::path::Path;

use tracing::debug;

use newsreel_models::EncodingConfig;

use crate::command::TranscodeCommand;
use crate::error::MediaResult;
use crate::graph::{FilterGraph, InputKey, InputRegistry, InputSpec};

/// Videos longer than this are sped up.
const MAX_DURATION_SECS: f64 = 180.0;
/// Retimed videos land just under the cap.
const RETIMED_TARGET_SECS: f64 = 179.0;

/// What the cap pass decided to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedDecision {
    /// Within the cap (or unmeasured): plain stream copy
    Copy,
    /// Uniform speed-up by this factor
    Retimed { factor: f64 },
}

/// A planned speed pass.
#[derive(Debug)]
pub struct SpeedPlan {
    pub command: TranscodeCommand,
    pub decision: SpeedDecision,
}

/// Re-time a finished video to fit under the duration cap. Only ever speeds
/// up; a video within the cap (or with an unknown duration) is stream-copied
/// unchanged.
pub fn cap_duration(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    measured_duration: f64,
    encoding: &EncodingConfig,
) -> MediaResult<SpeedPlan> {
    let mut inputs = InputRegistry::new();
    inputs.add(InputKey::Primary, InputSpec::media(input.as_ref()))?;

    if measured_duration <= MAX_DURATION_SECS {
        let command = TranscodeCommand::new(inputs, output.as_ref()).copy_streams();
        return Ok(SpeedPlan { command, decision: SpeedDecision::Copy });
    }

    let factor = measured_duration / RETIMED_TARGET_SECS;
    debug!(measured_duration, factor, "video exceeds cap, retiming");

    let mut g = FilterGraph::new();
    let video = g.step(
        &[&inputs.video(&InputKey::Primary)?],
        format!("setpts=PTS/{factor:.6}"),
        "v",
    );
    let audio = g.step(
        &[&inputs.audio(&InputKey::Primary)?],
        format!("atempo={factor:.6}"),
        "a",
    );

    let command = TranscodeCommand::new(inputs, output.as_ref())
        .filter_complex(g.render())
        .map_pad(&video)
        .map_pad(&audio)
        .encode_video(encoding)
        .encode_audio(encoding)
        .output_args(["-b:a".to_string(), encoding.audio_bitrate.clone()]);

    Ok(SpeedPlan { command, decision: SpeedDecision::Retimed { factor } })
}
