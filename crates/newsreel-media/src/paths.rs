//! Output and asset directory conventions.
//!
//! The directory shape is a contract with the orchestrator: per-stage `tmp/`
//! directories hold scene clips and narration audio, finished stages land
//! beside them, and whole-video intermediates live under `<kind>/tmp/`.

use std::path::{Path, PathBuf};

use newsreel_models::{StageName, VideoKind};

/// Resolves every path the pipeline reads or writes for one project.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    root: PathBuf,
    project: String,
    kind: VideoKind,
}

impl ProjectPaths {
    pub fn new(root: impl AsRef<Path>, project: impl Into<String>, kind: VideoKind) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            project: project.into(),
            kind,
        }
    }

    pub fn kind(&self) -> VideoKind {
        self.kind
    }

    /// Shared static assets (frames, poses, plates, fonts, music).
    pub fn global_dir(&self) -> PathBuf {
        self.root.join("global")
    }

    pub fn global_asset(&self, file: &str) -> PathBuf {
        self.global_dir().join(file)
    }

    /// Per-project downloaded reference media.
    pub fn references_dir(&self) -> PathBuf {
        self.root.join("references").join(&self.project)
    }

    pub fn reference(&self, file: &str) -> PathBuf {
        self.references_dir().join(file)
    }

    /// Font used by drawtext credit overlays.
    pub fn font(&self) -> PathBuf {
        self.global_asset("Montserrat-Medium.ttf")
    }

    /// Background music directory.
    pub fn music_dir(&self) -> PathBuf {
        self.global_dir().join("music")
    }

    fn video_dir(&self) -> PathBuf {
        self.root
            .join("videos")
            .join(&self.project)
            .join(self.kind.dir_name())
    }

    /// Whole-video scratch directory.
    pub fn tmp_dir(&self) -> PathBuf {
        self.video_dir().join("tmp")
    }

    /// Per-stage scratch directory (scene clips, narration audio).
    pub fn stage_tmp_dir(&self, stage: StageName) -> PathBuf {
        self.video_dir().join(stage.as_str()).join("tmp")
    }

    /// Rendered scene clip.
    pub fn scene_file(&self, stage: StageName, index: usize) -> PathBuf {
        self.stage_tmp_dir(stage).join(format!("scene_{index:03}.mp4"))
    }

    /// Narration audio generated for one scene.
    pub fn narration_file(&self, stage: StageName, index: usize) -> PathBuf {
        self.stage_tmp_dir(stage)
            .join(format!("narration_scene_{index}.mp3"))
    }

    /// Concatenated stage clip.
    pub fn stage_file(&self, stage: StageName) -> PathBuf {
        self.video_dir()
            .join(stage.as_str())
            .join(format!("stage_{}.mp4", stage.as_str()))
    }

    /// All stages joined into one piece.
    pub fn joined_file(&self) -> PathBuf {
        self.tmp_dir().join("joined.mp4")
    }

    /// Audio track extracted for transcription.
    pub fn transcription_audio(&self) -> PathBuf {
        self.tmp_dir().join("transcription_audio.mp3")
    }

    /// Compiled caption script.
    pub fn captions_file(&self) -> PathBuf {
        self.tmp_dir().join("captions.ass")
    }

    /// Post-processing intermediates, in pipeline order.
    pub fn subtitled_file(&self) -> PathBuf {
        self.tmp_dir().join("subtitled.mp4")
    }

    pub fn with_music_file(&self) -> PathBuf {
        self.tmp_dir().join("with_music.mp4")
    }

    pub fn watermarked_file(&self) -> PathBuf {
        self.tmp_dir().join("watermarked.mp4")
    }

    /// Final deliverable.
    pub fn final_file(&self) -> PathBuf {
        self.video_dir().join(format!("{}.mp4", self.project))
    }
}
