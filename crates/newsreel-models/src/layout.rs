//! Scene layout definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Available scene layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Main reference fills the full frame
    Fullscreen,
    /// Observer pose fills the full frame, no reference inset
    ObserverClean,
    /// Observer in the full frame with a small reference inset on the left
    ObserverInsetLeft,
    /// Observer in the full frame with a small reference inset on the right
    ObserverInsetRight,
    /// Reference in a medium frame on the left, observer pointing at it from
    /// a side column that also hosts the extras slideshow
    PointingLeft,
    /// Mirror of [`Layout::PointingLeft`]
    PointingRight,
}

impl Layout {
    /// All layouts, in storyboard-facing order.
    pub const ALL: &'static [Layout] = &[
        Layout::Fullscreen,
        Layout::ObserverClean,
        Layout::ObserverInsetLeft,
        Layout::ObserverInsetRight,
        Layout::PointingLeft,
        Layout::PointingRight,
    ];

    /// Returns the layout name as used in storyboards and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Fullscreen => "fullscreen",
            Layout::ObserverClean => "observer_clean",
            Layout::ObserverInsetLeft => "observer_inset_left",
            Layout::ObserverInsetRight => "observer_inset_right",
            Layout::PointingLeft => "observer_pointing_left",
            Layout::PointingRight => "observer_pointing_right",
        }
    }

    /// Whether the layout shows a primary visual and therefore requires a
    /// main reference on reference-focus scenes.
    pub fn requires_main_reference(&self) -> bool {
        !matches!(self, Layout::ObserverClean)
    }

    /// Whether the layout hosts an extras slideshow column.
    pub fn has_slideshow_column(&self) -> bool {
        matches!(self, Layout::PointingLeft | Layout::PointingRight)
    }

    /// Lenient parse: unknown ids fall back to [`Layout::Fullscreen`].
    /// Storyboards come from an upstream generator that occasionally invents
    /// layout names; the pipeline renders those scenes fullscreen instead of
    /// failing the whole batch.
    pub fn parse_lenient(s: &str) -> Layout {
        s.parse().unwrap_or(Layout::Fullscreen)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Layout {
    type Err = LayoutParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fullscreen" => Ok(Layout::Fullscreen),
            "observer_clean" => Ok(Layout::ObserverClean),
            "observer_inset_left" => Ok(Layout::ObserverInsetLeft),
            "observer_inset_right" => Ok(Layout::ObserverInsetRight),
            "observer_pointing_left" => Ok(Layout::PointingLeft),
            "observer_pointing_right" => Ok(Layout::PointingRight),
            _ => Err(LayoutParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown layout: {0}")]
pub struct LayoutParseError(String);
