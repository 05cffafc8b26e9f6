//! End-to-end compilation: storyboard JSON in, renderer commands and a
//! caption script out. No ffmpeg is spawned; the artifacts themselves are
//! the contract.

use newsreel_media::concat::{plan_concat, ClipSource, ConcatMode};
use newsreel_media::post::{
    append_end_card, apply_watermark, burn_subtitles, cap_duration, extract_audio,
    mix_background_music, MusicTrack, SpeedDecision, WatermarkConfig,
};
use newsreel_media::{
    compile_captions, compose_narrated_scene_with_duration, compose_scene, normalize_section,
    CaptionConfig, ComposeConfig, ComposeContext, ProjectPaths,
};
use newsreel_models::{
    EncodingConfig, StageName, Storyboard, Transcript, VideoKind, WordStamp,
};

use rand::rngs::StdRng;
use rand::SeedableRng;

fn context() -> ComposeContext {
    ComposeContext::new(ProjectPaths::new("/work", "flood-report", VideoKind::Long))
}

fn storyboard() -> Storyboard {
    serde_json::from_str(
        r#"{
            "long_video": {
                "introduction": {
                    "sections": [
                        {
                            "layout": "fullscreen",
                            "pose": "talking_default",
                            "speech": "",
                            "references": [
                                {"file": "river.mp4", "slot": "main", "duration": 9.0,
                                 "credit": "City Observer"}
                            ]
                        },
                        {
                            "layout": "observer_inset_left",
                            "pose": "reading_phone",
                            "speech": "Officials confirmed the evacuation this morning.",
                            "references": [
                                {"file": "map.png", "slot": "main"},
                                {"file": "shelter.png", "slot": "extra", "credit": "Relief Org"}
                            ]
                        }
                    ]
                },
                "explanation": {
                    "sections": [
                        {
                            "layout": "observer_pointing_left",
                            "pose": "point_left",
                            "speech": "",
                            "references": [
                                {"file": "dam.mp4", "slot": "main", "duration": 12.0},
                                {"file": "graph.png", "slot": "extra"}
                            ]
                        }
                    ]
                }
            }
        }"#,
    )
    .unwrap()
}

#[test]
fn storyboard_compiles_to_scene_commands() {
    let ctx = context();
    let board = storyboard();
    let stages = board.populated_stages(VideoKind::Long);
    assert_eq!(stages.len(), 2);

    let mut commands = Vec::new();
    for (stage, plan) in &stages {
        for (index, section) in plan.sections.iter().enumerate() {
            let scene = normalize_section(section, *stage, index).unwrap();
            let compiled = if scene.audio_mode.is_voice_over() {
                compose_narrated_scene_with_duration(&scene, *stage, index, 6.0, &ctx).unwrap()
            } else {
                compose_scene(&scene, *stage, index, &ctx).unwrap()
            };
            commands.push((*stage, index, compiled));
        }
    }
    assert_eq!(commands.len(), 3);

    // Silent fullscreen scene keeps the reference audio and its credit.
    let intro_main = &commands[0].2;
    let shell = intro_main.command.to_shell_string();
    assert!(shell.contains("-map \"1:a?\""));
    assert!(shell.contains("text='City Observer'"));
    assert!(intro_main.output.ends_with("introduction/tmp/scene_000.mp4"));
    assert!((intro_main.duration - 9.0).abs() < 1e-9);

    // Narrated inset scene maps the narration and loops a two-still
    // slideshow split evenly across the measured narration.
    let narrated = &commands[1].2;
    let shell = narrated.command.to_shell_string();
    assert!(shell.contains("narration_scene_1.mp3"));
    assert_eq!(shell.matches("-loop 1 -t 3.000").count(), 2);
    assert!(shell.contains("loop=loop=-1"));

    // Pointing scene builds the extras slideshow column.
    let pointing = &commands[2].2;
    let shell = pointing.command.to_shell_string();
    assert!(shell.contains("graph.png"));
    assert!(shell.contains("trim=0:4.000"));
}

#[test]
fn stage_and_video_concat_report_crossfaded_durations() {
    let cfg = ComposeConfig::default();
    let enc = EncodingConfig::default();

    let scenes = vec![
        ClipSource::new("/work/s/tmp/scene_000.mp4", 9.0),
        ClipSource::new("/work/s/tmp/scene_001.mp4", 6.0),
    ];
    let stage_plan = plan_concat(
        &scenes,
        "/work/s/stage_introduction.mp4",
        ConcatMode::ScenesWithinStage,
        &cfg,
        &enc,
    )
    .unwrap();
    assert!((stage_plan.duration - 14.8).abs() < 1e-9);
    assert!(stage_plan.command.to_shell_string().contains("fps=30000/1001"));

    let stages = vec![
        ClipSource::new("/work/stage_introduction.mp4", stage_plan.duration),
        ClipSource::new("/work/stage_explanation.mp4", 12.0),
    ];
    let video_plan = plan_concat(
        &stages,
        "/work/tmp/joined.mp4",
        ConcatMode::StagesWithinVideo,
        &cfg,
        &enc,
    )
    .unwrap();
    assert!((video_plan.duration - (14.8 + 12.0 - 0.2)).abs() < 1e-9);
    assert!(!video_plan.command.to_shell_string().contains("fps="));
}

#[test]
fn captions_compile_from_a_transcript_payload() {
    let transcript: Transcript = serde_json::from_str(
        r#"{
            "words": [
                {"word": "flood", "start": 0.0, "end": 0.4},
                {"word": "warning", "start": 0.4, "end": 0.9},
                {"word": ",", "start": 0.9, "end": 0.95},
                {"word": "stay", "start": 1.0, "end": 1.3},
                {"word": "safe", "start": 1.3, "end": 1.8}
            ],
            "duration": 3.6
        }"#,
    )
    .unwrap();

    let script = compile_captions(
        &transcript.words,
        transcript.duration,
        &CaptionConfig::default(),
    )
    .unwrap();

    // Punctuation was merged, and the rescaled track ends exactly on the
    // measured duration.
    let words: Vec<String> = script
        .blocks
        .iter()
        .flat_map(|b| b.words.iter().map(|w| w.text.clone()))
        .collect();
    assert!(words.contains(&"warning,".to_string()));
    let last = script.blocks.last().unwrap().words.last().unwrap();
    assert_eq!(last.end_cs, 360);

    let text = script.render();
    assert!(text.contains("[Events]"));
    assert!(text.contains("\\k"));
}

#[test]
fn post_processing_chain_builds_in_pipeline_order() {
    let ctx = context();
    let enc = EncodingConfig::default();
    let cfg = ComposeConfig::default();

    let audio = extract_audio(ctx.paths.joined_file(), ctx.paths.transcription_audio(), &enc).unwrap();
    assert!(audio.to_shell_string().contains("libmp3lame"));

    let burn = burn_subtitles(
        ctx.paths.joined_file(),
        ctx.paths.captions_file(),
        ctx.paths.global_dir(),
        cfg.canvas,
        ctx.paths.subtitled_file(),
        &enc,
    )
    .unwrap();
    assert!(burn.to_shell_string().contains("captions.ass"));

    let mut rng = StdRng::seed_from_u64(11);
    let tracks = vec![
        MusicTrack::new("/work/global/music/calm.mp3", 60.0),
        MusicTrack::new("/work/global/music/tense.mp3", 45.0),
    ];
    let music = mix_background_music(
        ctx.paths.subtitled_file(),
        ctx.paths.with_music_file(),
        &tracks,
        90.0,
        &mut rng,
        &enc,
    )
    .unwrap();
    assert!(!music.tracks.is_empty());

    let watermark = apply_watermark(
        ctx.paths.with_music_file(),
        ctx.paths.watermarked_file(),
        &WatermarkConfig::new("/work/global/watermark.png"),
        &enc,
    )
    .unwrap();
    assert!(watermark.to_shell_string().contains("overlay="));

    let speed = cap_duration(
        ctx.paths.watermarked_file(),
        ctx.paths.final_file(),
        200.0,
        &enc,
    )
    .unwrap();
    assert!(matches!(speed.decision, SpeedDecision::Retimed { .. }));

    let endcard = append_end_card(
        ctx.paths.final_file(),
        "/work/global/end_card.png",
        "/work/tmp/with_card.mp4",
        &cfg,
        &enc,
    )
    .unwrap();
    assert!(endcard.to_shell_string().contains("concat=n=2:v=1:a=1"));
}

#[test]
fn degenerate_inputs_fail_before_any_command_is_built() {
    let ctx = context();

    // Missing main reference on a silent scene.
    let section: newsreel_models::Section = serde_json::from_str(
        r#"{"layout": "fullscreen", "pose": "talking_default", "speech": "", "references": []}"#,
    )
    .unwrap();
    assert!(normalize_section(&section, StageName::Introduction, 0).is_err());

    // Degenerate subtitle input.
    assert!(compile_captions(&[], 10.0, &CaptionConfig::default()).is_err());
    let words = vec![WordStamp::new("a", 0.0, 1.0)];
    assert!(compile_captions(&words, 0.0, &CaptionConfig::default()).is_err());
}
