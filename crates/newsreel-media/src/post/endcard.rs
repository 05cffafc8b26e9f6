//! Terminal still-frame append.

use std::path::Path;

use newsreel_models::EncodingConfig;

use crate::command::TranscodeCommand;
use crate::config::ComposeConfig;
use crate::error::MediaResult;
use crate::graph::{FilterGraph, InputKey, InputRegistry, InputSpec};

/// How long the terminal card stays on screen.
pub const END_CARD_SECS: f64 = 3.0;

/// Append a fixed-duration still frame with silent audio to a finished
/// video via a final concatenation.
pub fn append_end_card(
    input: impl AsRef<Path>,
    card_image: impl AsRef<Path>,
    output: impl AsRef<Path>,
    cfg: &ComposeConfig,
    encoding: &EncodingConfig,
) -> MediaResult<TranscodeCommand> {
    let mut inputs = InputRegistry::new();
    inputs.add(InputKey::Primary, InputSpec::media(input.as_ref()))?;
    inputs.add(
        InputKey::EndCard,
        InputSpec::looped_still_for(card_image.as_ref(), END_CARD_SECS),
    )?;
    inputs.add(
        InputKey::SilentAudio,
        InputSpec::lavfi(format!(
            "anullsrc=channel_layout=stereo:sample_rate={}",
            cfg.concat_sample_rate
        ))
        .with_duration(END_CARD_SECS),
    )?;

    let mut g = FilterGraph::new();
    let card = g.step(
        &[&inputs.video(&InputKey::EndCard)?],
        format!(
            "scale={}:{},setsar=1,fps={}",
            cfg.canvas.w, cfg.canvas.h, cfg.concat_fps
        ),
        "card",
    );
    let joined = g.step_multi(
        &[
            &inputs.video(&InputKey::Primary)?,
            &inputs.audio(&InputKey::Primary)?,
            &card,
            &inputs.audio(&InputKey::SilentAudio)?,
        ],
        "concat=n=2:v=1:a=1",
        &["v", "a"],
    );

    Ok(TranscodeCommand::new(inputs, output.as_ref())
        .filter_complex(g.render())
        .map_pad(&joined[0])
        .map_pad(&joined[1])
        .encode_video(encoding)
        .encode_audio(encoding))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_is_bounded_and_silent() {
        let cmd = append_end_card(
            "in.mp4",
            "card.png",
            "out.mp4",
            &ComposeConfig::default(),
            &EncodingConfig::default(),
        )
        .unwrap();
        let shell = cmd.to_shell_string();
        assert!(shell.contains("-loop 1 -t 3.000 -i \"card.png\""));
        assert!(shell.contains("-f lavfi -t 3.000 -i \"anullsrc=channel_layout=stereo:sample_rate=44100\""));
        assert!(shell.contains("scale=1920:1080,setsar=1,fps=30000/1001"));
        assert!(shell.contains("concat=n=2:v=1:a=1"));
        assert_eq!(shell.matches("-map").count(), 2);
    }
}
