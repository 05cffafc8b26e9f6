//! Observer pose definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Observer poses available in the global asset tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Pose {
    /// Looping talking-head clip, the default
    #[default]
    TalkingDefault,
    /// Still pointing to the left
    PointLeft,
    /// Still pointing to the right
    PointRight,
    /// Still with a surprised expression
    Surprised,
    /// Looping clip of the observer reading a phone
    ReadingPhone,
}

impl Pose {
    /// Asset file name under the global asset directory.
    pub fn asset_file(&self) -> &'static str {
        match self {
            Pose::TalkingDefault => "observer_talking_default.mp4",
            Pose::PointLeft => "observer_point_left.png",
            Pose::PointRight => "observer_point_right.png",
            Pose::Surprised => "observer_surprised.png",
            Pose::ReadingPhone => "observer_reading_phone.mp4",
        }
    }

    /// Whether the pose asset is a looping clip rather than a still.
    pub fn is_clip(&self) -> bool {
        matches!(self, Pose::TalkingDefault | Pose::ReadingPhone)
    }

    /// Lenient parse: unknown pose ids fall back to the default talking pose.
    pub fn parse_lenient(s: &str) -> Pose {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pose::TalkingDefault => "talking_default",
            Pose::PointLeft => "point_left",
            Pose::PointRight => "point_right",
            Pose::Surprised => "surprised",
            Pose::ReadingPhone => "reading_phone",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Pose {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "talking_default" => Ok(Pose::TalkingDefault),
            "point_left" => Ok(Pose::PointLeft),
            "point_right" => Ok(Pose::PointRight),
            "surprised" => Ok(Pose::Surprised),
            "reading_phone" => Ok(Pose::ReadingPhone),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_poses_use_mp4_assets() {
        assert!(Pose::TalkingDefault.asset_file().ends_with(".mp4"));
        assert!(Pose::PointLeft.asset_file().ends_with(".png"));
        assert!(Pose::TalkingDefault.is_clip());
        assert!(!Pose::Surprised.is_clip());
    }

    #[test]
    fn unknown_pose_defaults_to_talking() {
        assert_eq!(Pose::parse_lenient("moonwalking"), Pose::TalkingDefault);
    }
}
