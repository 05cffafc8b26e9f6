//! Shared data models for the Newsreel assembly pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Storyboards, stages and scene sections
//! - Media references (main/extra slots, image/video kinds)
//! - Layout and pose enums with their asset mappings
//! - Word-level transcripts for caption compilation
//! - Encoding configuration

pub mod audio;
pub mod encoding;
pub mod layout;
pub mod pose;
pub mod stage;
pub mod storyboard;
pub mod transcript;

// Re-export common types
pub use audio::AudioMode;
pub use encoding::EncodingConfig;
pub use layout::{Layout, LayoutParseError};
pub use pose::Pose;
pub use stage::StageName;
pub use storyboard::{MediaKind, Reference, Section, Slot, StagePlan, Storyboard, VideoKind};
pub use transcript::{Transcript, WordStamp};
