//! Scene normalization: raw storyboard sections become canonical scene
//! descriptors with resolved template assets, pose, audio mode and a
//! main/extra reference split.

use newsreel_models::{AudioMode, Layout, MediaKind, Pose, Reference, Section, Slot, StageName};

use crate::error::{MediaError, MediaResult};

/// Background plate shared by every layout.
pub const BACKGROUND_ASSET: &str = "background.png";
/// Full-size decorative frame.
pub const FRAME_FULL_ASSET: &str = "frame_full_1820x980.png";
/// Medium frame used by the pointing layouts.
pub const FRAME_MEDIUM_ASSET: &str = "frame_medium_1180x980.png";
/// Small side frame.
pub const FRAME_SMALL_ASSET: &str = "frame_small_590x465.png";

/// Template assets resolved for one layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutTemplate {
    pub background: &'static str,
    pub primary_frame: &'static str,
    pub secondary_frame: Option<&'static str>,
}

impl LayoutTemplate {
    /// Static lookup keyed by layout id.
    pub fn for_layout(layout: Layout) -> LayoutTemplate {
        match layout {
            Layout::Fullscreen | Layout::ObserverClean => LayoutTemplate {
                background: BACKGROUND_ASSET,
                primary_frame: FRAME_FULL_ASSET,
                secondary_frame: None,
            },
            Layout::ObserverInsetLeft | Layout::ObserverInsetRight => LayoutTemplate {
                background: BACKGROUND_ASSET,
                primary_frame: FRAME_FULL_ASSET,
                secondary_frame: Some(FRAME_SMALL_ASSET),
            },
            Layout::PointingLeft | Layout::PointingRight => LayoutTemplate {
                background: BACKGROUND_ASSET,
                primary_frame: FRAME_MEDIUM_ASSET,
                secondary_frame: Some(FRAME_SMALL_ASSET),
            },
        }
    }

    /// The secondary frame, or a descriptive error for layouts that need one.
    pub fn require_secondary(&self, layout: Layout) -> MediaResult<&'static str> {
        self.secondary_frame.ok_or(MediaError::MissingTemplateAsset {
            layout: layout.as_str().to_string(),
            asset: "secondary_frame",
        })
    }
}

/// One resolved media reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceMedia {
    /// File name under the project's reference directory
    pub file: String,
    pub kind: MediaKind,
    /// Measured duration, when known and positive
    pub duration: Option<f64>,
    /// Credited source text for the lower-third overlay
    pub credit: Option<String>,
}

impl ReferenceMedia {
    pub fn is_still(&self) -> bool {
        self.kind == MediaKind::Image
    }

    /// On-screen duration: explicit first, the slide default for stills,
    /// zero ("unknown") for clips that were never probed.
    pub fn slot_duration(&self, slide_default: f64) -> f64 {
        match (self.duration, self.kind) {
            (Some(d), _) => d,
            (None, MediaKind::Image) => slide_default,
            (None, MediaKind::Video) => 0.0,
        }
    }

    fn from_reference(r: &Reference) -> ReferenceMedia {
        ReferenceMedia {
            file: r.file.clone(),
            kind: r.resolved_kind(),
            duration: r.known_duration(),
            credit: r.credit.clone().filter(|c| !c.is_empty()),
        }
    }
}

/// Canonical scene descriptor consumed by the layout compositors.
#[derive(Debug, Clone)]
pub struct SceneDescriptor {
    pub layout: Layout,
    pub template: LayoutTemplate,
    pub pose: Pose,
    pub speech: String,
    pub audio_mode: AudioMode,
    pub main_reference: Option<ReferenceMedia>,
    pub extra_references: Vec<ReferenceMedia>,
}

impl SceneDescriptor {
    /// Main plus extras, in slideshow order.
    pub fn all_references(&self) -> Vec<&ReferenceMedia> {
        self.main_reference
            .iter()
            .chain(self.extra_references.iter())
            .collect()
    }

    /// The main reference, or the scene's hard error.
    pub fn require_main(&self, stage: StageName, scene_index: usize) -> MediaResult<&ReferenceMedia> {
        self.main_reference
            .as_ref()
            .ok_or_else(|| MediaError::missing_main_reference(stage.as_str(), scene_index))
    }
}

/// Normalize a raw section into a scene descriptor.
///
/// Pure and total except for one hard error: a reference-focus scene whose
/// layout shows a primary visual must carry a main-slot reference. Unknown
/// layout and pose ids fall back to their documented defaults instead of
/// failing, keeping the batch resilient to storyboard-generator drift.
pub fn normalize_section(
    section: &Section,
    stage: StageName,
    scene_index: usize,
) -> MediaResult<SceneDescriptor> {
    let layout = Layout::parse_lenient(&section.layout);
    let template = LayoutTemplate::for_layout(layout);
    let pose = Pose::parse_lenient(&section.pose);
    let audio_mode = AudioMode::from_speech(section.speech.as_deref());

    let main_reference = section
        .references
        .iter()
        .find(|r| r.slot == Slot::Main)
        .map(ReferenceMedia::from_reference);

    let extra_references: Vec<ReferenceMedia> = section
        .references
        .iter()
        .filter(|r| r.slot != Slot::Main)
        .map(ReferenceMedia::from_reference)
        .collect();

    if main_reference.is_none()
        && layout.requires_main_reference()
        && audio_mode == AudioMode::ReferenceFocus
    {
        return Err(MediaError::missing_main_reference(stage.as_str(), scene_index));
    }

    Ok(SceneDescriptor {
        layout,
        template,
        pose,
        speech: section.speech.clone().unwrap_or_default(),
        audio_mode,
        main_reference,
        extra_references,
    })
}
