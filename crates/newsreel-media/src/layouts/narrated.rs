//! Voice-over scene compositor: the generated narration is the audio track
//! and the references play as a looping slideshow while the observer (or the
//! slideshow itself) fills the primary frame.

use newsreel_models::{Layout, MediaKind, StageName};

use crate::command::TranscodeCommand;
use crate::error::MediaResult;
use crate::graph::{FilterGraph, InputKey, InputRegistry, InputSpec, Pad};
use crate::scene::{ReferenceMedia, SceneDescriptor};

use super::patterns::{
    credit_windows, fill_blur, fill_crop, fill_height_center_crop, horizontal_pan, slideshow,
    SlideshowSegment,
};
use super::{
    credit_overlay, CompiledScene, ComposeContext, CreditStyle, CREDIT_PLATE_FULL_ASSET,
    CREDIT_PLATE_SMALL_ASSET,
};

/// One slideshow slide with its resolved slot duration.
struct Slide<'a> {
    index: usize,
    reference: &'a ReferenceMedia,
    duration: f64,
}

pub(super) fn compose(
    scene: &SceneDescriptor,
    stage: StageName,
    scene_index: usize,
    narration_duration: f64,
    ctx: &ComposeContext,
) -> MediaResult<CompiledScene> {
    let slides = resolve_slides(scene, narration_duration, ctx);

    if scene.layout == Layout::Fullscreen && !slides.is_empty() {
        fullscreen_slideshow(scene, stage, scene_index, narration_duration, &slides, ctx)
    } else if slides.is_empty() || scene.template.secondary_frame.is_none() {
        pose_only(scene, stage, scene_index, narration_duration, ctx)
    } else {
        framed_slideshow(scene, stage, scene_index, narration_duration, &slides, ctx)
    }
}

/// Resolve per-slide durations. When every reference is a still and the
/// narration was measured, the narration is divided evenly across them;
/// mixed sets keep each reference's own measured or default duration.
/// Slides without a usable duration are dropped.
fn resolve_slides<'a>(
    scene: &'a SceneDescriptor,
    narration_duration: f64,
    ctx: &ComposeContext,
) -> Vec<Slide<'a>> {
    let references = scene.all_references();
    let all_stills = !references.is_empty() && references.iter().all(|r| r.is_still());
    let even_slot = (all_stills && narration_duration > 0.0)
        .then(|| narration_duration / references.len() as f64);

    references
        .into_iter()
        .enumerate()
        .filter_map(|(index, reference)| {
            let duration = match (reference.kind, even_slot) {
                (MediaKind::Image, Some(slot)) => slot,
                _ => reference.slot_duration(ctx.cfg.slide_duration),
            };
            (duration > 0.0).then_some(Slide { index, reference, duration })
        })
        .collect()
}

fn add_slide_inputs(
    inputs: &mut InputRegistry,
    slides: &[Slide<'_>],
    ctx: &ComposeContext,
) -> MediaResult<()> {
    for slide in slides {
        let path = ctx.paths.reference(&slide.reference.file);
        let spec = if slide.reference.is_still() {
            InputSpec::looped_still_for(path, slide.duration)
        } else {
            InputSpec::media(path)
        };
        inputs.add(InputKey::Slide(slide.index), spec)?;
    }
    Ok(())
}

fn finish(
    inputs: InputRegistry,
    graph: FilterGraph,
    video: &Pad,
    stage: StageName,
    scene_index: usize,
    narration_duration: f64,
    ctx: &ComposeContext,
) -> MediaResult<CompiledScene> {
    let narration = inputs.audio(&InputKey::Narration)?;
    let output = ctx.paths.scene_file(stage, scene_index);
    let command = TranscodeCommand::new(inputs, &output)
        .filter_complex(graph.render())
        .map_pad(video)
        .map_stream(narration.name().to_string())
        .encode_video(&ctx.encoding)
        .encode_audio(&ctx.encoding)
        .shortest();
    Ok(CompiledScene { command, output, duration: narration_duration })
}

/// The slideshow itself fills the full frame; a single fixed credit overlay
/// names the first credited source.
fn fullscreen_slideshow(
    scene: &SceneDescriptor,
    stage: StageName,
    scene_index: usize,
    narration_duration: f64,
    slides: &[Slide<'_>],
    ctx: &ComposeContext,
) -> MediaResult<CompiledScene> {
    let cfg = &ctx.cfg;
    let credit = slides
        .iter()
        .find_map(|s| s.reference.credit.clone())
        .or_else(|| scene.main_reference.as_ref().and_then(|m| m.credit.clone()));

    let mut inputs = InputRegistry::new();
    inputs.add(
        InputKey::Background,
        InputSpec::looped_still(ctx.paths.global_asset(scene.template.background)),
    )?;
    inputs.add(
        InputKey::PrimaryFrame,
        InputSpec::looped_still(ctx.paths.global_asset(scene.template.primary_frame)),
    )?;
    add_slide_inputs(&mut inputs, slides, ctx)?;
    inputs.add(
        InputKey::Narration,
        InputSpec::media(ctx.paths.narration_file(stage, scene_index)),
    )?;
    if credit.is_some() {
        inputs.add(
            InputKey::CreditPlate,
            InputSpec::looped_still(ctx.paths.global_asset(CREDIT_PLATE_FULL_ASSET)),
        )?;
    }

    let mut g = FilterGraph::new();
    let bg = g.step(
        &[&inputs.video(&InputKey::Background)?],
        format!("scale={}:{}", cfg.canvas.w, cfg.canvas.h),
        "bg",
    );

    let segments: Vec<SlideshowSegment> = slides
        .iter()
        .map(|slide| -> MediaResult<SlideshowSegment> {
            let src = inputs.video(&InputKey::Slide(slide.index))?;
            let pad = if slide.reference.is_still() {
                horizontal_pan(&mut g, &src, cfg.full.fg, slide.duration, cfg)
            } else {
                fill_crop(&mut g, &src, cfg.full.fg)
            };
            Ok(SlideshowSegment { pad, duration: slide.duration })
        })
        .collect::<MediaResult<_>>()?;

    let (looped, _span) = slideshow(&mut g, &segments, cfg.slideshow_crossfade, cfg.loop_size);
    let (fx, fy) = cfg.full.fg_pos();
    let s1 = g.step(&[&bg, &looped], format!("overlay={fx}:{fy}"), "step");
    let framed = g.step(
        &[&s1, &inputs.video(&InputKey::PrimaryFrame)?],
        format!("overlay={}:{}", cfg.full.x, cfg.full.y),
        "framed",
    );

    let video = match credit {
        Some(text) => {
            let (lx, ly) = cfg.credit_full_pos();
            let font = ctx.paths.font().to_string_lossy().into_owned();
            credit_overlay(
                &mut g,
                &framed,
                &inputs.video(&InputKey::CreditPlate)?,
                &font,
                &text,
                lx,
                ly,
                &CreditStyle::narrated_full(cfg),
                None,
                false,
            )
        }
        None => framed,
    };

    finish(inputs, g, &video, stage, scene_index, narration_duration, ctx)
}

/// No usable slides (or no secondary frame): the observer pose carries the
/// scene alone.
fn pose_only(
    scene: &SceneDescriptor,
    stage: StageName,
    scene_index: usize,
    narration_duration: f64,
    ctx: &ComposeContext,
) -> MediaResult<CompiledScene> {
    let cfg = &ctx.cfg;
    let mut inputs = InputRegistry::new();
    inputs.add(
        InputKey::Background,
        InputSpec::looped_still(ctx.paths.global_asset(scene.template.background)),
    )?;
    let pose_path = ctx.paths.global_asset(scene.pose.asset_file());
    inputs.add(
        InputKey::Pose,
        if scene.pose.is_clip() {
            InputSpec::media(pose_path)
        } else {
            InputSpec::looped_still(pose_path)
        },
    )?;
    inputs.add(
        InputKey::PrimaryFrame,
        InputSpec::looped_still(ctx.paths.global_asset(scene.template.primary_frame)),
    )?;
    inputs.add(
        InputKey::Narration,
        InputSpec::media(ctx.paths.narration_file(stage, scene_index)),
    )?;

    let mut g = FilterGraph::new();
    let bg = g.step(
        &[&inputs.video(&InputKey::Background)?],
        format!("scale={}:{}", cfg.canvas.w, cfg.canvas.h),
        "bg",
    );
    let pose_fg = fill_crop(&mut g, &inputs.video(&InputKey::Pose)?, cfg.full.fg);
    let (fx, fy) = cfg.full.fg_pos();
    let s1 = g.step(&[&bg, &pose_fg], format!("overlay={fx}:{fy}"), "step");
    let video = g.step(
        &[&s1, &inputs.video(&InputKey::PrimaryFrame)?],
        format!("overlay={}:{}", cfg.full.x, cfg.full.y),
        "framed",
    );

    finish(inputs, g, &video, stage, scene_index, narration_duration, ctx)
}

/// Default narrated shape: pose in the primary frame, slideshow in the small
/// frame, per-segment credits gated on the looping slideshow timeline.
fn framed_slideshow(
    scene: &SceneDescriptor,
    stage: StageName,
    scene_index: usize,
    narration_duration: f64,
    slides: &[Slide<'_>],
    ctx: &ComposeContext,
) -> MediaResult<CompiledScene> {
    let cfg = &ctx.cfg;
    let secondary = scene.template.require_secondary(scene.layout)?;
    let credited: Vec<usize> = slides
        .iter()
        .enumerate()
        .filter_map(|(pos, s)| s.reference.credit.is_some().then_some(pos))
        .collect();

    let mut inputs = InputRegistry::new();
    inputs.add(
        InputKey::Background,
        InputSpec::looped_still(ctx.paths.global_asset(scene.template.background)),
    )?;
    let pose_path = ctx.paths.global_asset(scene.pose.asset_file());
    inputs.add(
        InputKey::Pose,
        if scene.pose.is_clip() {
            InputSpec::media(pose_path)
        } else {
            InputSpec::looped_still(pose_path)
        },
    )?;
    inputs.add(
        InputKey::PrimaryFrame,
        InputSpec::looped_still(ctx.paths.global_asset(scene.template.primary_frame)),
    )?;
    inputs.add(
        InputKey::SecondaryFrame,
        InputSpec::looped_still(ctx.paths.global_asset(secondary)),
    )?;
    if !credited.is_empty() {
        inputs.add(
            InputKey::CreditPlate,
            InputSpec::looped_still(ctx.paths.global_asset(CREDIT_PLATE_SMALL_ASSET)),
        )?;
    }
    add_slide_inputs(&mut inputs, slides, ctx)?;
    inputs.add(
        InputKey::Narration,
        InputSpec::media(ctx.paths.narration_file(stage, scene_index)),
    )?;

    // Small frame anchor inside the primary frame, mirrored per layout.
    let (sf_x, sf_y) = match scene.layout {
        Layout::ObserverInsetRight => (
            cfg.full.x + cfg.full.frame.w as i64 - cfg.small.frame.w as i64 - 2,
            cfg.full.y + 5,
        ),
        _ => (cfg.full.x + 5, cfg.full.y + 5),
    };

    let mut g = FilterGraph::new();
    let bg = g.step(
        &[&inputs.video(&InputKey::Background)?],
        format!("scale={}:{}", cfg.canvas.w, cfg.canvas.h),
        "bg",
    );
    let pose_fg = fill_crop(&mut g, &inputs.video(&InputKey::Pose)?, cfg.full.fg);
    let (fx, fy) = cfg.full.fg_pos();
    let b1 = g.step(&[&bg, &pose_fg], format!("overlay={fx}:{fy}"), "step");
    let big_ready = g.step(
        &[&b1, &inputs.video(&InputKey::PrimaryFrame)?],
        format!("overlay={}:{}", cfg.full.x, cfg.full.y),
        "framed",
    );

    let segments: Vec<SlideshowSegment> = slides
        .iter()
        .map(|slide| -> MediaResult<SlideshowSegment> {
            let src = inputs.video(&InputKey::Slide(slide.index))?;
            let (sa, sb) = g.fork(&src, "slide");
            let patch_bg = fill_blur(&mut g, &sa, cfg.small.frame, cfg.blur_filter);
            let patch_fg = if slide.reference.is_still() {
                horizontal_pan(&mut g, &sb, cfg.small.fg, slide.duration, cfg)
            } else {
                fill_height_center_crop(&mut g, &sb, cfg.small.fg)
            };
            let pad = g.step(&[&patch_bg, &patch_fg], "overlay=(W-w)/2:(H-h)/2", "patch");
            Ok(SlideshowSegment { pad, duration: slide.duration })
        })
        .collect::<MediaResult<_>>()?;

    let durations: Vec<f64> = slides.iter().map(|s| s.duration).collect();
    let (looped, span) = slideshow(&mut g, &segments, cfg.slideshow_crossfade, cfg.loop_size);
    let s1 = g.step(&[&big_ready, &looped], format!("overlay={sf_x}:{sf_y}"), "step");
    let mut video = g.step(
        &[&s1, &inputs.video(&InputKey::SecondaryFrame)?],
        format!("overlay={sf_x}:{sf_y}"),
        "step",
    );

    // Per-segment credits cycle with the slideshow: the gate compares the
    // elapsed time modulo the loop span against each slide's window.
    if !credited.is_empty() {
        let windows = credit_windows(&durations, cfg.slideshow_crossfade);
        let plates = g.fork_many(
            &inputs.video(&InputKey::CreditPlate)?,
            credited.len(),
            "plate",
        );
        let lt_x = sf_x + 20;
        let lt_y = sf_y + cfg.small.frame.h as i64 - cfg.credit.small.h as i64 - 20;
        let font = ctx.paths.font().to_string_lossy().into_owned();

        for (plate, pos) in plates.iter().zip(&credited) {
            let (start, end) = windows[*pos];
            let gate = format!("between(mod(t\\,{span:.3})\\,{start:.3}\\,{end:.3})");
            let text = slides[*pos]
                .reference
                .credit
                .as_deref()
                .unwrap_or_default();
            video = credit_overlay(
                &mut g,
                &video,
                plate,
                &font,
                text,
                lt_x,
                lt_y,
                &CreditStyle::narrated_small(cfg),
                Some(&gate),
                false,
            );
        }
    }

    finish(inputs, g, &video, stage, scene_index, narration_duration, ctx)
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
            speech: Some("narrated text".into()),
            references: refs,
        };
        normalize_section(&section, StageName::Introduction, 0).unwrap()
    }

    #[test]
    fn narration_splits_evenly_across_stills() {
        let scene = scene_for(
            "fullscreen",
            vec![
                reference("a.png", Slot::Main, None, None),
                reference("b.png", Slot::Extra, None, None),
            ],
        );
        let compiled = compose(&scene, StageName::Introduction, 0, 6.0, &ctx()).unwrap();
        let shell = compiled.command.to_shell_string();
        assert_eq!(shell.matches("-loop 1 -t 3.000").count(), 2);
        assert!((compiled.duration - 6.0).abs() < 1e-9);
    }

    #[test]
    fn mixed_sets_keep_their_own_durations() {
        let scene = scene_for(
            "fullscreen",
            vec![
                reference("a.png", Slot::Main, Some(5.0), None),
                reference("b.mp4", Slot::Extra, Some(7.0), None),
            ],
        );
        let compiled = compose(&scene, StageName::Introduction, 0, 10.0, &ctx()).unwrap();
        let shell = compiled.command.to_shell_string();
        assert!(shell.contains("-loop 1 -t 5.000"));
        assert!(shell.contains("trim=0:7.000"));
        // The clip input is registered plain, with no demuxer-level bound.
        assert!(!shell.contains("-t 7.000 -i"));
    }

    #[test]
    fn fullscreen_slideshow_pans_stills_and_loops() {
        let scene = scene_for(
            "fullscreen",
            vec![
                reference("a.png", Slot::Main, None, Some("Archive")),
                reference("b.png", Slot::Extra, None, None),
            ],
        );
        let compiled = compose(&scene, StageName::Introduction, 0, 8.0, &ctx()).unwrap();
        let shell = compiled.command.to_shell_string();
        assert!(shell.contains("fps=25"));
        assert!(shell.contains("crop=1780:940:x="));
        assert!(shell.contains("loop=loop=-1:size=32767:start=0"));
        // Fixed credit: present but never time-gated.
        assert!(shell.contains("text='Archive'"));
        assert!(!shell.contains("enable"));
        // Narration is the mapped audio track.
        let narr = shell.find("narration_scene_0.mp3").unwrap();
        assert!(narr > 0);
        assert!(shell.contains("-shortest"));
    }

    #[test]
    fn no_references_falls_back_to_pose_only() {
        let scene = scene_for("fullscreen", vec![]);
        let compiled = compose(&scene, StageName::Introduction, 0, 5.0, &ctx()).unwrap();
        let shell = compiled.command.to_shell_string();
        assert!(shell.contains("observer_talking_default.mp4"));
        assert!(!shell.contains("concat"));
        assert!(!shell.contains("xfade"));
    }

    #[test]
    fn framed_slideshow_gates_credits_on_the_loop() {
        let scene = scene_for(
            "observer_inset_left",
            vec![
                reference("a.png", Slot::Main, None, Some("Reuters")),
                reference("b.png", Slot::Extra, None, Some("AP")),
            ],
        );
        let compiled = compose(&scene, StageName::Introduction, 0, 6.0, &ctx()).unwrap();
        let shell = compiled.command.to_shell_string();
        // 3s slots with a 0.2s slideshow crossfade: span 5.8, windows
        // [0,3) and [2.8,5.8).
        assert!(shell.contains("between(mod(t\\,5.800)\\,0.000\\,3.000)"));
        assert!(shell.contains("between(mod(t\\,5.800)\\,2.800\\,5.800)"));
        assert!(shell.contains("credit_plate_small.png"));
        assert!(shell.contains("split=2"));
    }

    #[test]
    fn inset_right_anchors_the_small_frame_right() {
        let scene = scene_for(
            "observer_inset_right",
            vec![reference("a.png", Slot::Main, None, None)],
        );
        let compiled = compose(&scene, StageName::Introduction, 0, 4.0, &ctx()).unwrap();
        // 50 + 1820 - 590 - 2 = 1278
        assert!(compiled.command.to_shell_string().contains("overlay=1278:55"));
    }

    #[test]
    fn unmeasured_narration_still_composes() {
        let scene = scene_for(
            "observer_inset_left",
            vec![reference("a.png", Slot::Main, None, None)],
        );
        let compiled = compose(&scene, StageName::Introduction, 0, 0.0, &ctx()).unwrap();
        // Still slides fall back to the default slide duration.
        assert!(compiled.command.to_shell_string().contains("-loop 1 -t 4.000"));
        assert_eq!(compiled.duration, 0.0);
    }
}
