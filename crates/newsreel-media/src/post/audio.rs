//! Audio track extraction for transcription.

use std::path::Path;

use newsreel_models::EncodingConfig;

use crate::command::TranscodeCommand;
use crate::error::MediaResult;
use crate::graph::{InputKey, InputRegistry, InputSpec};

/// Extract the primary audio track to mp3 for the speech-to-text service.
pub fn extract_audio(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    encoding: &EncodingConfig,
) -> MediaResult<TranscodeCommand> {
    let mut inputs = InputRegistry::new();
    inputs.add(InputKey::Primary, InputSpec::media(input.as_ref()))?;

    Ok(TranscodeCommand::new(inputs, output.as_ref()).output_args([
        "-vn".to_string(),
        "-acodec".to_string(),
        "libmp3lame".to_string(),
        "-b:a".to_string(),
        encoding.audio_bitrate.clone(),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_video_and_encodes_mp3() {
        let cmd = extract_audio("in.mp4", "audio.mp3", &EncodingConfig::default()).unwrap();
        let shell = cmd.to_shell_string();
        assert!(shell.contains("-vn -acodec libmp3lame -b:a 160k"));
        assert!(shell.ends_with("\"audio.mp3\""));
    }
}
