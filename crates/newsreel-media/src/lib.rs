#![deny(unreachable_patterns)]
//! FFmpeg filter-graph compiler for narrated news videos.
//!
//! This crate provides:
//! - A typed filter-graph builder (named pads as handles, text emitted last)
//! - An input registry addressing inputs by semantic key, never by counter
//! - Scene normalization and per-layout compositors
//! - Crossfade concatenation planning for scenes and stages
//! - Karaoke caption compilation from word-level timestamps
//! - Post-processing command builders (watermark, music, speed, end card)
//! - FFprobe measurement with a tolerant zero-duration fallback

pub mod captions;
pub mod command;
pub mod concat;
pub mod config;
pub mod error;
pub mod graph;
pub mod layouts;
pub mod paths;
pub mod post;
pub mod probe;
pub mod progress;
pub mod scene;

pub use captions::{compile_captions, CaptionConfig};
pub use command::{FfmpegRunner, TranscodeCommand};
pub use concat::{plan_concat, ClipSource, ConcatMode, ConcatPlan};
pub use config::ComposeConfig;
pub use error::{MediaError, MediaResult};
pub use graph::{FilterGraph, InputKey, InputRegistry, InputSpec, Pad};
pub use layouts::{
    compose_narrated_scene, compose_narrated_scene_with_duration, compose_scene, CompiledScene,
    ComposeContext,
};
pub use paths::ProjectPaths;
pub use probe::{duration_or_zero, probe_media, MediaInfo};
pub use progress::{FfmpegProgress, ProgressCallback};
pub use scene::{normalize_section, ReferenceMedia, SceneDescriptor};
