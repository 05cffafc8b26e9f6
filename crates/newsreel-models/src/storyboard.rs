//! Storyboard and scene section models.
//!
//! A storyboard carries one stage map per video kind; each stage holds an
//! ordered list of sections, the raw unit the scene normalizer consumes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::stage::StageName;

/// Which of the two deliverables a path or geometry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum VideoKind {
    /// Vertical short-form cut
    Short,
    /// Horizontal long-form cut
    Long,
}

impl VideoKind {
    /// Directory name under the project's video tree.
    pub fn dir_name(&self) -> &'static str {
        match self {
            VideoKind::Short => "short",
            VideoKind::Long => "long",
        }
    }
}

impl fmt::Display for VideoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// Slot a reference occupies within a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// The scene's primary visual
    Main,
    /// Secondary material shown in slideshow regions
    #[serde(other)]
    #[default]
    Extra,
}

/// Media kind of a reference asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Sniff the kind from a file extension. Upstream generators do not
    /// always fill the `kind` field; the extension is authoritative enough
    /// for the asset trees this pipeline consumes.
    pub fn from_path(path: impl AsRef<Path>) -> Option<MediaKind> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "webp" | "bmp" => Some(MediaKind::Image),
            "mp4" | "mov" | "mkv" | "m4v" | "webm" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

/// One media reference attached to a scene section.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Reference {
    /// File name under the project's reference directory
    pub file: String,
    /// Main or extra slot
    #[serde(default)]
    pub slot: Slot,
    /// Image/video kind; sniffed from the extension when absent
    #[serde(default)]
    pub kind: Option<MediaKind>,
    /// Measured duration in seconds, when known (videos are probed upstream)
    #[serde(default)]
    pub duration: Option<f64>,
    /// Credited source text for the lower-third overlay
    #[serde(default)]
    pub credit: Option<String>,
    /// Free-form description from the storyboard generator
    #[serde(default)]
    pub description: Option<String>,
}

impl Reference {
    /// Resolved media kind: explicit field first, extension sniff second,
    /// image as the final assumption (stills are the common case).
    pub fn resolved_kind(&self) -> MediaKind {
        self.kind
            .or_else(|| MediaKind::from_path(&self.file))
            .unwrap_or(MediaKind::Image)
    }

    /// Duration if it is a usable positive number.
    pub fn known_duration(&self) -> Option<f64> {
        self.duration.filter(|d| d.is_finite() && *d > 0.0)
    }
}

/// Raw scene section as delivered by the storyboard generator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Section {
    /// Layout id; unknown values render fullscreen
    pub layout: String,
    /// Pose id; unknown values use the default talking pose
    #[serde(default)]
    pub pose: String,
    /// Narration text; empty or absent means the scene keeps reference audio
    #[serde(default)]
    pub speech: Option<String>,
    /// Media references, main slot plus ordered extras
    #[serde(default)]
    pub references: Vec<Reference>,
}

/// Ordered sections of one narrative stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct StagePlan {
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Full storyboard for one project: a stage map per deliverable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Storyboard {
    #[serde(default)]
    pub short_video: BTreeMap<StageName, StagePlan>,
    #[serde(default)]
    pub long_video: BTreeMap<StageName, StagePlan>,
}

impl Storyboard {
    /// Stages of one deliverable that actually have content, in narrative order.
    pub fn populated_stages(&self, kind: VideoKind) -> Vec<(StageName, &StagePlan)> {
        let map = match kind {
            VideoKind::Short => &self.short_video,
            VideoKind::Long => &self.long_video,
        };
        StageName::NARRATIVE_ORDER
            .iter()
            .filter_map(|stage| {
                map.get(stage)
                    .filter(|plan| !plan.sections.is_empty())
                    .map(|plan| (*stage, plan))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_sniffing() {
        assert_eq!(MediaKind::from_path("a/photo.JPG"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_path("clip.mp4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_path("notes.txt"), None);
    }

    #[test]
    fn reference_kind_prefers_explicit_field() {
        let r = Reference {
            file: "misnamed.mp4".into(),
            slot: Slot::Main,
            kind: Some(MediaKind::Image),
            duration: None,
            credit: None,
            description: None,
        };
        assert_eq!(r.resolved_kind(), MediaKind::Image);
    }

    #[test]
    fn unknown_slot_deserializes_as_extra() {
        let r: Reference =
            serde_json::from_str(r#"{"file":"x.png","slot":"support"}"#).unwrap();
        assert_eq!(r.slot, Slot::Extra);
    }

    #[test]
    fn populated_stages_follow_narrative_order() {
        let section = Section {
            layout: "fullscreen".into(),
            pose: String::new(),
            speech: None,
            references: Vec::new(),
        };
        let mut board = Storyboard::default();
        board.long_video.insert(
            StageName::Opinion,
            StagePlan { sections: vec![section.clone()] },
        );
        board.long_video.insert(
            StageName::Introduction,
            StagePlan { sections: vec![section] },
        );
        board.long_video.insert(StageName::Problem, StagePlan::default());

        let stages = board.populated_stages(VideoKind::Long);
        let names: Vec<_> = stages.iter().map(|(s, _)| *s).collect();
        assert_eq!(names, vec![StageName::Introduction, StageName::Opinion]);
    }
}
