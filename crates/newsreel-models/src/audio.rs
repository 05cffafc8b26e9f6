//! Scene audio mode.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which audio track drives a scene. Derived from the section, never
/// supplied by the storyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AudioMode {
    /// Narrated scene: the generated voice-over is the audio track
    VoiceOverFocus,
    /// Silent-script scene: the main reference's own audio is kept
    ReferenceFocus,
}

impl AudioMode {
    /// A scene is voice-over focused iff it carries non-empty speech.
    pub fn from_speech(speech: Option<&str>) -> AudioMode {
        match speech {
            Some(s) if !s.is_empty() => AudioMode::VoiceOverFocus,
            _ => AudioMode::ReferenceFocus,
        }
    }

    pub fn is_voice_over(&self) -> bool {
        matches!(self, AudioMode::VoiceOverFocus)
    }
}
