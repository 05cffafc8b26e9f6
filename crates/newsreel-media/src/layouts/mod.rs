//! Layout compositors.
//!
//! One compositor per layout tag, sharing the sub-patterns in [`patterns`]:
//! blur-backdrop composites, picture-in-picture placement, the extras
//! slideshow and the timed credit overlay. [`compose_scene`] handles
//! reference-focus scenes; [`compose_narrated_scene`] handles voice-over
//! scenes, with the probed narration duration driving still-image slots.

pub mod patterns;

mod narrated;
mod silent;

use std::path::PathBuf;

use newsreel_models::{EncodingConfig, StageName};

use crate::command::TranscodeCommand;
use crate::config::ComposeConfig;
use crate::error::{MediaError, MediaResult};
use crate::graph::{FilterGraph, Pad};
use crate::paths::ProjectPaths;
use crate::probe::duration_or_zero;
use crate::scene::SceneDescriptor;

use patterns::escape_drawtext;

/// Lower-third plate sized for the full frame.
pub const CREDIT_PLATE_FULL_ASSET: &str = "credit_plate_full.png";
/// Lower-third plate sized for the small frame.
pub const CREDIT_PLATE_SMALL_ASSET: &str = "credit_plate_small.png";

/// Everything a compositor needs besides the scene itself.
#[derive(Debug, Clone)]
pub struct ComposeContext {
    pub paths: ProjectPaths,
    pub cfg: ComposeConfig,
    pub encoding: EncodingConfig,
}

impl ComposeContext {
    pub fn new(paths: ProjectPaths) -> Self {
        Self {
            paths,
            cfg: ComposeConfig::default(),
            encoding: EncodingConfig::default(),
        }
    }
}

/// A compiled scene: the renderer command plus bookkeeping for the caller.
#[derive(Debug)]
pub struct CompiledScene {
    pub command: TranscodeCommand,
    pub output: PathBuf,
    /// Planned clip duration in seconds; zero means "unknown" (the renderer
    /// stops at the shortest stream instead)
    pub duration: f64,
}

/// Compile a reference-focus scene into a renderer command.
///
/// Fails before building anything if the main reference or a required
/// template asset is missing; no partial command is ever emitted.
pub fn compose_scene(
    scene: &SceneDescriptor,
    stage: StageName,
    scene_index: usize,
    ctx: &ComposeContext,
) -> MediaResult<CompiledScene> {
    silent::compose(scene, stage, scene_index, ctx)
}

/// Compile a voice-over scene, probing the narration clip for its duration.
/// Probing is the only suspension point; a failed probe yields the zero
/// sentinel and still-image slots fall back to their defaults.
pub async fn compose_narrated_scene(
    scene: &SceneDescriptor,
    stage: StageName,
    scene_index: usize,
    ctx: &ComposeContext,
) -> MediaResult<CompiledScene> {
    let narration = ctx.paths.narration_file(stage, scene_index);
    let narration_duration = duration_or_zero(&narration).await;
    compose_narrated_scene_with_duration(scene, stage, scene_index, narration_duration, ctx)
}

/// Pure variant of [`compose_narrated_scene`] for callers that already
/// measured the narration.
pub fn compose_narrated_scene_with_duration(
    scene: &SceneDescriptor,
    stage: StageName,
    scene_index: usize,
    narration_duration: f64,
    ctx: &ComposeContext,
) -> MediaResult<CompiledScene> {
    if !scene.audio_mode.is_voice_over() {
        return Err(MediaError::InvalidMedia(
            "narrated compositor requires a voice_over_focus scene".to_string(),
        ));
    }
    narrated::compose(scene, stage, scene_index, narration_duration, ctx)
}

/// Text styling of one credit overlay variant.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CreditStyle {
    pub label_size: u32,
    pub text_size: u32,
    pub label_dx: i64,
    pub label_dy: i64,
    pub text_dx: i64,
    pub text_dy: i64,
}

impl CreditStyle {
    /// Full-frame plate on a silent scene.
    pub fn silent_full(cfg: &ComposeConfig) -> Self {
        Self {
            label_size: 20,
            text_size: 24,
            label_dx: 20 + cfg.credit.text_offset_x,
            label_dy: 19,
            text_dx: 30 + cfg.credit.text_offset_x,
            text_dy: 65,
        }
    }

    /// Full-frame plate on a narrated slideshow.
    pub fn narrated_full(cfg: &ComposeConfig) -> Self {
        Self {
            label_size: 22,
            text_size: 20,
            label_dx: 20 + cfg.credit.text_offset_x,
            label_dy: 19,
            text_dx: 30 + cfg.credit.text_offset_x,
            text_dy: 65,
        }
    }

    /// Small-frame plate beside a slideshow segment.
    pub fn narrated_small(cfg: &ComposeConfig) -> Self {
        Self {
            label_size: 18,
            text_size: 20,
            label_dx: cfg.credit.text_offset_x,
            label_dy: 16,
            text_dx: cfg.credit.text_offset_x + 10,
            text_dy: 50,
        }
    }
}

/// Timed credit overlay: plate plus label and source text, optionally gated
/// by an `enable` expression while the associated reference is on screen.
#[allow(clippy::too_many_arguments)]
pub(crate) fn credit_overlay(
    g: &mut FilterGraph,
    base: &Pad,
    plate: &Pad,
    font: &str,
    credit: &str,
    x: i64,
    y: i64,
    style: &CreditStyle,
    enable: Option<&str>,
    eof_pass: bool,
) -> Pad {
    let eof = if eof_pass { ":eof_action=pass" } else { "" };
    let gate = enable.map(|e| format!(":enable='{e}'")).unwrap_or_default();

    let plated = g.step(&[base, plate], format!("overlay={x}:{y}{eof}{gate}"), "lt");
    let labeled = g.step(
        &[&plated],
        format!(
            "drawtext=fontfile='{font}':text='Credit:':x={lx}:y={ly}:fontsize={ls}:fontcolor=black{gate}",
            lx = x + style.label_dx,
            ly = y + style.label_dy,
            ls = style.label_size,
        ),
        "lt",
    );
    g.step(
        &[&labeled],
        format!(
            "drawtext=fontfile='{font}':text='{text}':x={tx}:y={ty}:fontsize={ts}:fontcolor=black{gate}",
            text = escape_drawtext(credit),
            tx = x + style.text_dx,
            ty = y + style.text_dy,
            ts = style.text_size,
        ),
        "lt",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsreel_models::{Section, VideoKind};

    #[test]
    fn narrated_entry_rejects_silent_scenes() {
        let section = Section {
            layout: "fullscreen".into(),
            pose: String::new(),
            speech: None,
            references: vec![newsreel_models::Reference {
                file: "a.png".into(),
                slot: newsreel_models::Slot::Main,
                kind: None,
                duration: None,
                credit: None,
                description: None,
            }],
        };
        let scene =
            crate::scene::normalize_section(&section, StageName::Introduction, 0).unwrap();
        let ctx = ComposeContext::new(ProjectPaths::new("/work", "p", VideoKind::Long));
        let err =
            compose_narrated_scene_with_duration(&scene, StageName::Introduction, 0, 5.0, &ctx);
        assert!(matches!(err, Err(MediaError::InvalidMedia(_))));
    }

    #[test]
    fn credit_overlay_escapes_and_gates() {
        let cfg = ComposeConfig::default();
        let mut g = FilterGraph::new();
        let base = Pad::video(0);
        let plate = Pad::video(1);
        credit_overlay(
            &mut g,
            &base,
            &plate,
            "/fonts/font.ttf",
            "O'Neill Press",
            90,
            876,
            &CreditStyle::silent_full(&cfg),
            Some("lte(t,4.000)"),
            true,
        );
        let script = g.render();
        assert!(script.contains("overlay=90:876:eof_action=pass:enable='lte(t,4.000)'"));
        assert!(script.contains("text='Credit:'"));
        assert!(script.contains("O\\'Neill Press"));
        assert_eq!(script.matches("drawtext").count(), 2);
    }

    #[test]
    fn ungated_credit_has_no_enable() {
        let cfg = ComposeConfig::default();
        let mut g = FilterGraph::new();
        let base = Pad::video(0);
        let plate = Pad::video(1);
        credit_overlay(
            &mut g,
            &base,
            &plate,
            "f.ttf",
            "Agency",
            90,
            876,
            &CreditStyle::narrated_full(&cfg),
            None,
            false,
        );
        assert!(!g.render().contains("enable"));
    }
}
