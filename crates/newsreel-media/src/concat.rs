//! Crossfade concatenation planning for scene and stage clips.

use std::path::{Path, PathBuf};

use newsreel_models::EncodingConfig;

use crate::command::TranscodeCommand;
use crate::config::ComposeConfig;
use crate::error::{MediaError, MediaResult};
use crate::graph::{FilterGraph, InputKey, InputRegistry, InputSpec, Pad};

/// One already-rendered clip with its measured duration. A zero duration
/// means "unknown" and is floored to the crossfade length during offset
/// arithmetic so offsets never go negative.
#[derive(Debug, Clone)]
pub struct ClipSource {
    pub path: PathBuf,
    pub duration: f64,
}

impl ClipSource {
    pub fn new(path: impl AsRef<Path>, duration: f64) -> Self {
        Self { path: path.as_ref().to_path_buf(), duration }
    }
}

/// Which level of the pipeline is being joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatMode {
    /// Scene clips within one stage originate from heterogeneous source
    /// material, so frame rate and sample rate are normalized before the
    /// timestamp reset.
    ScenesWithinStage,
    /// Stage clips are already normalized; only timestamps are reset.
    StagesWithinVideo,
}

/// A planned concatenation: the renderer command plus the resulting duration.
#[derive(Debug)]
pub struct ConcatPlan {
    pub command: TranscodeCommand,
    pub output: PathBuf,
    pub duration: f64,
}

/// Plan the concatenation of an ordered clip list.
///
/// A single clip becomes a pass-through re-encode with no graph. Two or more
/// clips are chained with a fixed-length cross-dissolve on video and an equal
/// cross-fade on audio; clip *i*'s trailing crossfade and clip *i+1*'s
/// leading crossfade are the same operation.
pub fn plan_concat(
    clips: &[ClipSource],
    output: impl AsRef<Path>,
    mode: ConcatMode,
    cfg: &ComposeConfig,
    encoding: &EncodingConfig,
) -> MediaResult<ConcatPlan> {
    let output = output.as_ref().to_path_buf();
    if clips.is_empty() {
        return Err(MediaError::EmptyConcat);
    }

    let mut inputs = InputRegistry::new();
    for (i, clip) in clips.iter().enumerate() {
        inputs.add(InputKey::Clip(i), InputSpec::media(&clip.path))?;
    }

    if clips.len() == 1 {
        let command = TranscodeCommand::new(inputs, &output)
            .encode_video(encoding)
            .encode_audio(encoding);
        return Ok(ConcatPlan { command, output, duration: clips[0].duration });
    }

    let cross = cfg.crossfade;
    let mut g = FilterGraph::new();

    // Time-reset every stream so internal timestamps start at zero; scene
    // clips additionally land on one frame rate and sample rate.
    let reset: Vec<(Pad, Pad)> = clips
        .iter()
        .enumerate()
        .map(|(i, _)| -> MediaResult<(Pad, Pad)> {
            let (v_expr, a_expr) = match mode {
                ConcatMode::ScenesWithinStage => (
                    format!("fps={},settb=AVTB,setpts=PTS-STARTPTS", cfg.concat_fps),
                    format!(
                        "aresample={},aformat=channel_layouts=stereo,asetpts=PTS-STARTPTS",
                        cfg.concat_sample_rate
                    ),
                ),
                ConcatMode::StagesWithinVideo => (
                    "setpts=PTS-STARTPTS".to_string(),
                    "asetpts=PTS-STARTPTS".to_string(),
                ),
            };
            let v = g.step(&[&inputs.video(&InputKey::Clip(i))?], v_expr, "v");
            let a = g.step(&[&inputs.audio(&InputKey::Clip(i))?], a_expr, "a");
            Ok((v, a))
        })
        .collect::<MediaResult<_>>()?;

    let (mut v_prev, mut a_prev) = reset[0].clone();
    let mut offset = 0.0_f64;
    for (i, (v_next, a_next)) in reset.iter().enumerate().skip(1) {
        offset = (offset + clips[i - 1].duration.max(cross) - cross).max(0.0);
        v_prev = g.step(
            &[&v_prev, v_next],
            format!("xfade=transition=fade:duration={cross}:offset={offset:.3}"),
            "vmix",
        );
        a_prev = g.step(&[&a_prev, a_next], format!("acrossfade=d={cross}"), "amix");
    }

    let duration =
        clips.iter().map(|c| c.duration).sum::<f64>() - (clips.len() - 1) as f64 * cross;

    let command = TranscodeCommand::new(inputs, &output)
        .filter_complex(g.render())
        .map_pad(&v_prev)
        .map_pad(&a_prev)
        .encode_video(encoding)
        .encode_audio(encoding);

    Ok(ConcatPlan { command, output, duration })
}
