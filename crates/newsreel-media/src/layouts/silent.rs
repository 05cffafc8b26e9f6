//! Reference-focus scene compositor: the main reference's own audio (when
//! present) carries the scene, and still references read as slides with the
//! default slide duration.

use newsreel_models::{Layout, StageName};

use crate::command::TranscodeCommand;
use crate::error::MediaResult;
use crate::graph::{FilterGraph, InputKey, InputRegistry, InputSpec, Pad};
use crate::scene::{ReferenceMedia, SceneDescriptor};

use super::patterns::{fill_blur, fill_crop, fit_within, slideshow, stretch_blur, SlideshowSegment};
use super::{credit_overlay, CompiledScene, ComposeContext, CreditStyle, CREDIT_PLATE_FULL_ASSET};

pub(super) fn compose(
    scene: &SceneDescriptor,
    stage: StageName,
    scene_index: usize,
    ctx: &ComposeContext,
) -> MediaResult<CompiledScene> {
    let cfg = &ctx.cfg;
    let main = scene.require_main(stage, scene_index)?;
    let duration = main.slot_duration(cfg.slide_duration);

    let wants_credit = main.credit.is_some() && layout_shows_main_credit(scene.layout);

    // Input enumeration. Order is stable but immaterial: the graph looks
    // every stream up through the registry.
    let mut inputs = InputRegistry::new();
    inputs.add(
        InputKey::Background,
        InputSpec::looped_still(ctx.paths.global_asset(scene.template.background)),
    )?;
    inputs.add(InputKey::MainReference, reference_spec(main, ctx))?;

    let uses_pose = !matches!(scene.layout, Layout::Fullscreen | Layout::ObserverClean);
    if uses_pose {
        let pose_path = ctx.paths.global_asset(scene.pose.asset_file());
        let spec = if scene.pose.is_clip() {
            InputSpec::media(pose_path)
        } else {
            InputSpec::looped_still(pose_path)
        };
        inputs.add(InputKey::Pose, spec)?;
    }

    inputs.add(
        InputKey::PrimaryFrame,
        InputSpec::looped_still(ctx.paths.global_asset(scene.template.primary_frame)),
    )?;

    if uses_pose {
        let secondary = scene.template.require_secondary(scene.layout)?;
        inputs.add(
            InputKey::SecondaryFrame,
            InputSpec::looped_still(ctx.paths.global_asset(secondary)),
        )?;
    }

    if wants_credit {
        inputs.add(
            InputKey::CreditPlate,
            InputSpec::looped_still(ctx.paths.global_asset(CREDIT_PLATE_FULL_ASSET)),
        )?;
    }

    let extras: Vec<(usize, &ReferenceMedia, f64)> = if scene.layout.has_slideshow_column() {
        usable_extras(scene, cfg.slide_duration)
    } else {
        Vec::new()
    };
    for (i, extra, _) in &extras {
        let spec = if extra.is_still() {
            InputSpec::looped_still(ctx.paths.reference(&extra.file))
        } else {
            InputSpec::endless(ctx.paths.reference(&extra.file))
        };
        inputs.add(InputKey::Slide(*i), spec)?;
    }

    // Graph synthesis.
    let mut g = FilterGraph::new();
    let bg = g.step(
        &[&inputs.video(&InputKey::Background)?],
        format!("scale={}:{}", cfg.canvas.w, cfg.canvas.h),
        "bg",
    );
    let font = ctx.paths.font().to_string_lossy().into_owned();
    let credit_gate = format!("lte(t,{duration:.3})");

    let video = match scene.layout {
        Layout::Fullscreen | Layout::ObserverClean => fullscreen_reference(
            &mut g,
            &bg,
            &inputs,
            ctx,
            wants_credit.then(|| CreditBlock {
                font: &font,
                text: main.credit.as_deref().unwrap_or_default(),
                gate: &credit_gate,
            }),
        )?,
        Layout::ObserverInsetLeft | Layout::ObserverInsetRight => {
            observer_with_inset(&mut g, &bg, &inputs, scene.layout, ctx)?
        }
        Layout::PointingLeft | Layout::PointingRight => pointing(
            &mut g,
            &bg,
            &inputs,
            scene.layout,
            &extras,
            ctx,
            wants_credit.then(|| CreditBlock {
                font: &font,
                text: main.credit.as_deref().unwrap_or_default(),
                gate: &credit_gate,
            }),
        )?,
    };

    let main_index = inputs.index_of(&InputKey::MainReference)?;
    let output = ctx.paths.scene_file(stage, scene_index);

    let mut command = TranscodeCommand::new(inputs, &output)
        .filter_complex(g.render())
        .map_pad(&video)
        .map_stream(format!("{main_index}:a?"))
        .encode_video(&ctx.encoding)
        .encode_audio(&ctx.encoding);
    if duration > 0.0 {
        command = command.limit_duration(duration);
    }
    command = command.shortest();

    Ok(CompiledScene { command, output, duration })
}

/// Layouts that host the main reference's lower-third credit.
fn layout_shows_main_credit(layout: Layout) -> bool {
    matches!(
        layout,
        Layout::Fullscreen | Layout::PointingLeft | Layout::PointingRight
    )
}

fn reference_spec(reference: &ReferenceMedia, ctx: &ComposeContext) -> InputSpec {
    let path = ctx.paths.reference(&reference.file);
    if reference.is_still() {
        InputSpec::looped_still(path)
    } else {
        InputSpec::media(path)
    }
}

/// Extras with a usable duration, keeping their input key index.
fn usable_extras(
    scene: &SceneDescriptor,
    slide_default: f64,
) -> Vec<(usize, &ReferenceMedia, f64)> {
    scene
        .extra_references
        .iter()
        .enumerate()
        .filter_map(|(i, extra)| {
            let duration = extra.slot_duration(slide_default);
            (duration > 0.0).then_some((i, extra, duration))
        })
        .collect()
}

struct CreditBlock<'a> {
    font: &'a str,
    text: &'a str,
    gate: &'a str,
}

/// Main reference fills the full frame over its own blurred plate.
fn fullscreen_reference(
    g: &mut FilterGraph,
    bg: &Pad,
    inputs: &InputRegistry,
    ctx: &ComposeContext,
    credit: Option<CreditBlock<'_>>,
) -> MediaResult<Pad> {
    let cfg = &ctx.cfg;
    let (blur_branch, fg_branch) = g.fork(&inputs.video(&InputKey::MainReference)?, "ref");
    let blurred = stretch_blur(g, &blur_branch, cfg.full.blur, cfg.blur_filter);
    let fg = fill_crop(g, &fg_branch, cfg.full.fg);

    let (bx, by) = cfg.full.blur_pos();
    let (fx, fy) = cfg.full.fg_pos();
    let s1 = g.step(&[bg, &blurred], format!("overlay={bx}:{by}:eof_action=pass"), "step");
    let s2 = g.step(&[&s1, &fg], format!("overlay={fx}:{fy}:eof_action=pass"), "step");
    let framed = g.step(
        &[&s2, &inputs.video(&InputKey::PrimaryFrame)?],
        format!("overlay={}:{}:eof_action=pass", cfg.full.x, cfg.full.y),
        "framed",
    );

    match credit {
        Some(block) => {
            let (lx, ly) = cfg.credit_full_pos();
            Ok(credit_overlay(
                g,
                &framed,
                &inputs.video(&InputKey::CreditPlate)?,
                block.font,
                block.text,
                lx,
                ly,
                &CreditStyle::silent_full(cfg),
                Some(block.gate),
                true,
            ))
        }
        None => Ok(framed),
    }
}

/// Observer pose fills the full frame; the main reference sits in a small
/// framed inset, mirrored between the left/right variants.
fn observer_with_inset(
    g: &mut FilterGraph,
    bg: &Pad,
    inputs: &InputRegistry,
    layout: Layout,
    ctx: &ComposeContext,
) -> MediaResult<Pad> {
    let cfg = &ctx.cfg;
    let pose_fg = fill_crop(g, &inputs.video(&InputKey::Pose)?, cfg.full.fg);
    let (fx, fy) = cfg.full.fg_pos();
    let s1 = g.step(&[bg, &pose_fg], format!("overlay={fx}:{fy}:eof_action=pass"), "step");
    let framed = g.step(
        &[&s1, &inputs.video(&InputKey::PrimaryFrame)?],
        format!("overlay={}:{}:eof_action=pass", cfg.full.x, cfg.full.y),
        "framed",
    );

    let inset_margin = 50;
    let sx = match layout {
        Layout::ObserverInsetLeft => cfg.full.x + inset_margin,
        _ => cfg.full.x + cfg.full.frame.w as i64 - cfg.small.frame.w as i64 - inset_margin,
    };
    let sy = cfg.full.y + inset_margin;

    let small = fit_within(g, &inputs.video(&InputKey::MainReference)?, cfg.small.frame);
    let s2 = g.step(&[&framed, &small], format!("overlay={sx}:{sy}:eof_action=pass"), "step");
    Ok(g.step(
        &[&s2, &inputs.video(&InputKey::SecondaryFrame)?],
        format!("overlay={sx}:{sy}:eof_action=pass"),
        "inset",
    ))
}

/// Main reference in the medium frame, pose in the top small frame, extras
/// slideshow (when present) in the bottom small frame. Left/right variants
/// mirror the column.
fn pointing(
    g: &mut FilterGraph,
    bg: &Pad,
    inputs: &InputRegistry,
    layout: Layout,
    extras: &[(usize, &ReferenceMedia, f64)],
    ctx: &ComposeContext,
    credit: Option<CreditBlock<'_>>,
) -> MediaResult<Pad> {
    let cfg = &ctx.cfg;
    let (big_x, small_x) = match layout {
        Layout::PointingLeft => (cfg.medium.left_x, cfg.small.right_x),
        _ => (cfg.medium.right_x, cfg.small.left_x),
    };
    let big_y = cfg.medium.y;
    let top_y = cfg.small.top_y;
    let bottom_y = cfg.small.bottom_y;

    // Medium frame hosting the main reference.
    let (ma, mb) = g.fork(&inputs.video(&InputKey::MainReference)?, "ref");
    let med_bg = fill_blur(g, &ma, cfg.medium.blur, cfg.blur_filter);
    let med_fg = fill_crop(g, &mb, cfg.medium.inner);
    let r1 = g.step(
        &[bg, &med_bg],
        format!("overlay={}:{}:eof_action=pass", big_x + 5, big_y + 5),
        "step",
    );
    let r2 = g.step(
        &[&r1, &med_fg],
        format!(
            "overlay={big_x}+({mw}-w)/2:{big_y}+({mh}-h)/2:eof_action=pass",
            mw = cfg.medium.frame.w,
            mh = cfg.medium.frame.h,
        ),
        "step",
    );
    let r3 = g.step(
        &[&r2, &inputs.video(&InputKey::PrimaryFrame)?],
        format!("overlay={big_x}:{big_y}:eof_action=pass"),
        "framed",
    );

    // The small frame art decorates both the pose (top) and the slideshow
    // (bottom), so the input stream is forked once.
    let (sf_top, sf_bottom) = g.fork(&inputs.video(&InputKey::SecondaryFrame)?, "sframe");

    // Pose in the top small frame.
    let (pa, pb) = g.fork(&inputs.video(&InputKey::Pose)?, "pose");
    let pose_bg = fill_blur(g, &pa, cfg.small.blur, cfg.blur_filter);
    let pose_fg = fill_crop(g, &pb, cfg.small.fg);
    let r4 = g.step(
        &[&r3, &pose_bg],
        format!("overlay={}:{}:eof_action=pass", small_x + 10, top_y + 10),
        "step",
    );
    let r5 = g.step(
        &[&r4, &pose_fg],
        format!("overlay={}:{}:eof_action=pass", small_x + 20, top_y + 20),
        "step",
    );
    let r6 = g.step(
        &[&r5, &sf_top],
        format!("overlay={small_x}:{top_y}:eof_action=pass"),
        "step",
    );

    let base = match credit {
        Some(block) => {
            let (lx, ly) = ctx.cfg.credit_medium_pos(big_x);
            credit_overlay(
                g,
                &r6,
                &inputs.video(&InputKey::CreditPlate)?,
                block.font,
                block.text,
                lx,
                ly,
                &CreditStyle::silent_full(cfg),
                Some(block.gate),
                true,
            )
        }
        None => r6,
    };

    // Bottom small frame: empty frame art alone, or the extras slideshow
    // underneath it.
    if extras.is_empty() {
        return Ok(g.step(
            &[&base, &sf_bottom],
            format!("overlay={small_x}:{bottom_y}:eof_action=pass"),
            "column",
        ));
    }

    let segments: Vec<SlideshowSegment> = extras
        .iter()
        .map(|(i, _, duration)| -> MediaResult<SlideshowSegment> {
            let (ea, eb) = g.fork(&inputs.video(&InputKey::Slide(*i))?, "extra");
            let patch_bg = fill_blur(g, &ea, cfg.small.blur, cfg.blur_filter);
            let patch_fg = fill_crop(g, &eb, cfg.small.fg);
            let patch = g.step(&[&patch_bg, &patch_fg], "overlay=10:10:eof_action=pass", "patch");
            Ok(SlideshowSegment { pad: patch, duration: *duration })
        })
        .collect::<MediaResult<_>>()?;

    let (looped, _span) = slideshow(&mut *g, &segments, cfg.slideshow_crossfade, cfg.loop_size);
    let with_extras = g.step(
        &[&base, &looped],
        format!("overlay={}:{}:eof_action=pass", small_x + 10, bottom_y + 10),
        "step",
    );
    Ok(g.step(
        &[&with_extras, &sf_bottom],
        format!("overlay={small_x}:{bottom_y}:eof_action=pass"),
        "column",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::ProjectPaths;
    use crate::scene::normalize_section;
    use newsreel_models::{Reference, Section, Slot, VideoKind};

    fn ctx() -> ComposeContext {
        ComposeContext::new(ProjectPaths::new("/work", "story", VideoKind::Long))
    }

    fn reference(file: &str, slot: Slot, duration: Option<f64>, credit: Option<&str>) -> Reference {
        Reference {
            file: file.into(),
            slot,
            kind: None,
            duration,
            credit: credit.map(Into::into),
            description: None,
        }
    }

    fn scene_for(layout: &str, refs: Vec<Reference>) -> SceneDescriptor {
        let section = Section {
            layout: layout.into(),
            pose: "talking_default".into(),
            speech: None,
            references: refs,
        };
        normalize_section(&section, StageName::Introduction, 0).unwrap()
    }

    #[test]
    fn fullscreen_still_gets_slide_duration_and_reference_audio() {
        let scene = scene_for("fullscreen", vec![reference("photo.png", Slot::Main, None, None)]);
        let compiled = compose(&scene, StageName::Introduction, 0, &ctx()).unwrap();
        assert_eq!(compiled.duration, 4.0);

        let shell = compiled.command.to_shell_string();
        assert!(shell.contains("-t 4.000"));
        assert!(shell.contains("-map \"1:a?\""));
        assert!(shell.contains("boxblur=40:1"));
        assert!(shell.contains("scale=1780:940:force_original_aspect_ratio=increase,crop=1780:940"));
        assert!(shell.contains("overlay=70:70:eof_action=pass"));
        assert!(shell.contains("-shortest"));
        assert!(shell.ends_with("scene_000.mp4\""));
    }

    #[test]
    fn fullscreen_credit_is_time_gated() {
        let scene = scene_for(
            "fullscreen",
            vec![reference("clip.mp4", Slot::Main, Some(7.5), Some("Wire Agency"))],
        );
        let compiled = compose(&scene, StageName::Introduction, 0, &ctx()).unwrap();
        let shell = compiled.command.to_shell_string();
        assert!(shell.contains("enable='lte(t,7.500)'"));
        assert!(shell.contains("text='Wire Agency'"));
        assert!(shell.contains("credit_plate_full.png"));
    }

    #[test]
    fn observer_clean_renders_reference_without_credit() {
        let scene = scene_for(
            "observer_clean",
            vec![reference("clip.mp4", Slot::Main, Some(3.0), Some("Agency"))],
        );
        let compiled = compose(&scene, StageName::Introduction, 0, &ctx()).unwrap();
        let shell = compiled.command.to_shell_string();
        assert!(!shell.contains("drawtext"));
        assert!(!shell.contains("observer_talking_default"));
    }

    #[test]
    fn inset_variants_mirror_the_inset_position() {
        let left = scene_for(
            "observer_inset_left",
            vec![reference("p.png", Slot::Main, None, None)],
        );
        let right = scene_for(
            "observer_inset_right",
            vec![reference("p.png", Slot::Main, None, None)],
        );
        let l = compose(&left, StageName::Introduction, 0, &ctx()).unwrap();
        let r = compose(&right, StageName::Introduction, 0, &ctx()).unwrap();
        assert!(l.command.to_shell_string().contains("overlay=100:100:eof_action=pass"));
        assert!(r.command.to_shell_string().contains("overlay=1230:100:eof_action=pass"));
    }

    #[test]
    fn pointing_layout_builds_extras_slideshow() {
        let scene = scene_for(
            "observer_pointing_left",
            vec![
                reference("main.mp4", Slot::Main, Some(10.0), None),
                reference("extra_a.png", Slot::Extra, None, None),
                reference("extra_b.mp4", Slot::Extra, Some(6.0), None),
            ],
        );
        let compiled = compose(&scene, StageName::Introduction, 0, &ctx()).unwrap();
        let shell = compiled.command.to_shell_string();
        assert!(shell.contains("-stream_loop -1"));
        assert!(shell.contains("trim=0:4.000"));
        assert!(shell.contains("trim=0:6.000"));
        assert!(shell.contains("xfade=transition=fade:duration=0.2:offset=3.800"));
        assert!(shell.contains("loop=loop=-1:size=32767:start=0"));
        // Pose column on the right for the pointing-left variant.
        assert!(shell.contains("overlay=1280:50:eof_action=pass"));
    }

    #[test]
    fn pointing_without_extras_keeps_empty_bottom_frame() {
        let scene = scene_for(
            "observer_pointing_right",
            vec![reference("main.mp4", Slot::Main, Some(5.0), None)],
        );
        let compiled = compose(&scene, StageName::Introduction, 0, &ctx()).unwrap();
        let shell = compiled.command.to_shell_string();
        assert!(!shell.contains("xfade"));
        assert!(shell.contains("overlay=50:565:eof_action=pass"));
    }

    #[test]
    fn extras_without_duration_are_skipped() {
        let scene = scene_for(
            "observer_pointing_left",
            vec![
                reference("main.mp4", Slot::Main, Some(5.0), None),
                reference("unprobed.mp4", Slot::Extra, None, None),
            ],
        );
        let compiled = compose(&scene, StageName::Introduction, 0, &ctx()).unwrap();
        let shell = compiled.command.to_shell_string();
        assert!(!shell.contains("unprobed.mp4"));
    }

    #[test]
    fn unknown_video_duration_omits_time_limit() {
        let scene = scene_for("fullscreen", vec![reference("clip.mp4", Slot::Main, None, None)]);
        let compiled = compose(&scene, StageName::Introduction, 0, &ctx()).unwrap();
        assert_eq!(compiled.duration, 0.0);
        assert!(!compiled.command.to_shell_string().contains("-t "));
    }
}
