//! Word-level transcript records from the speech-to-text service.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One word with its spoken time window, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WordStamp {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

impl WordStamp {
    pub fn new(word: impl Into<String>, start: f64, end: f64) -> Self {
        Self { word: word.into(), start, end }
    }

    /// Well-formed: non-empty text with finite timestamps. The raw service
    /// output contains empty tokens and NaN stamps often enough that every
    /// consumer filters through this.
    pub fn is_well_formed(&self) -> bool {
        !self.word.trim().is_empty() && self.start.is_finite() && self.end.is_finite()
    }
}

/// Transcript of one finished audio track.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Transcript {
    /// Word-level timestamps, in service order
    #[serde(default)]
    pub words: Vec<WordStamp>,
    /// Overall measured duration of the transcribed audio, in seconds
    #[serde(default)]
    pub duration: f64,
}
