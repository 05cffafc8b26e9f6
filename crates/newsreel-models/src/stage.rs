//! Narrative stage names and their fixed ordering.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Narrative phases of a news video, in the order they are assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Introduction,
    Problem,
    Explanation,
    Resolution,
    Opinion,
}

impl StageName {
    /// The fixed narrative order used when concatenating stage clips.
    pub const NARRATIVE_ORDER: &'static [StageName] = &[
        StageName::Introduction,
        StageName::Problem,
        StageName::Explanation,
        StageName::Resolution,
        StageName::Opinion,
    ];

    /// Stage name as used in directory and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Introduction => "introduction",
            StageName::Problem => "problem",
            StageName::Explanation => "explanation",
            StageName::Resolution => "resolution",
            StageName::Opinion => "opinion",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
