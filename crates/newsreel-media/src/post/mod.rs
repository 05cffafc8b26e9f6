//! Post-processing command builders.
//!
//! Simpler graph-synthesis siblings of the layout compositors, run in a
//! fixed order on the joined video: subtitles → background music →
//! watermark → speed cap. The end-card builder appends a terminal still
//! frame, and the audio extractor feeds the transcription service.

pub mod audio;
pub mod burn;
pub mod endcard;
pub mod music;
pub mod speed;
pub mod watermark;

pub use audio::extract_audio;
pub use burn::burn_subtitles;
pub use endcard::{append_end_card, END_CARD_SECS};
pub use music::{mix_background_music, select_tracks, MusicPlan, MusicTrack};
pub use speed::{cap_duration, SpeedDecision, SpeedPlan};
pub use watermark::{apply_watermark, WatermarkConfig, WatermarkPlacement};
