//! Caption burn-in.

use std::path::Path;

use newsreel_models::EncodingConfig;

use crate::command::TranscodeCommand;
use crate::config::RegionSize;
use crate::error::MediaResult;
use crate::graph::{InputKey, InputRegistry, InputSpec};

/// Burn an ASS caption file onto a finished video. The `original_size` hint
/// must match the play resolution the script was compiled for, so subtitle
/// geometry survives any later rescale.
pub fn burn_subtitles(
    input: impl AsRef<Path>,
    captions: impl AsRef<Path>,
    fonts_dir: impl AsRef<Path>,
    play_res: RegionSize,
    output: impl AsRef<Path>,
    encoding: &EncodingConfig,
) -> MediaResult<TranscodeCommand> {
    let mut inputs = InputRegistry::new();
    inputs.add(InputKey::Primary, InputSpec::media(input.as_ref()))?;

    let filter = format!(
        "ass='{}':fontsdir='{}':original_size={}x{}",
        escape_filter_path(captions.as_ref()),
        escape_filter_path(fonts_dir.as_ref()),
        play_res.w,
        play_res.h,
    );

    Ok(TranscodeCommand::new(inputs, output.as_ref())
        .output_args(["-vf".to_string(), filter])
        .encode_video(encoding)
        .output_args(["-c:a", "copy"]))
}

/// The `ass` filter parses `\` and `:` as syntax even inside quotes.
fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").replace(':', "\\:")
}
