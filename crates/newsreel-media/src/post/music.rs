//! Background music mixing.

use std::path::{Path, PathBuf};

use rand::Rng;

use newsreel_models::EncodingConfig;

use crate::command::TranscodeCommand;
use crate::error::{MediaError, MediaResult};
use crate::graph::{FilterGraph, InputKey, InputRegistry, InputSpec};

/// Crossfade between consecutive background tracks.
const TRACK_CROSSFADE_SECS: f64 = 1.0;
/// Background attenuation under the primary audio.
const BG_VOLUME: f64 = 0.10;
const MAIN_VOLUME: f64 = 1.0;

/// One background music track with its measured duration.
#[derive(Debug, Clone, PartialEq)]
pub struct MusicTrack {
    pub path: PathBuf,
    pub duration: f64,
}

impl MusicTrack {
    pub fn new(path: impl AsRef<Path>, duration: f64) -> Self {
        Self { path: path.as_ref().to_path_buf(), duration }
    }
}

/// A planned music mix: the command plus the selected tracks, which the
/// orchestrator persists for attribution.
#[derive(Debug)]
pub struct MusicPlan {
    pub command: TranscodeCommand,
    pub tracks: Vec<MusicTrack>,
}

/// Randomly select tracks until they cover the video duration, never
/// repeating a track back-to-back when more than one is available.
pub fn select_tracks<R: Rng + ?Sized>(
    tracks: &[MusicTrack],
    video_duration: f64,
    rng: &mut R,
) -> Vec<MusicTrack> {
    let usable: Vec<&MusicTrack> = tracks.iter().filter(|t| t.duration > 0.0).collect();
    let mut selected: Vec<MusicTrack> = Vec::new();
    let mut covered = 0.0_f64;

    while covered < video_duration && !usable.is_empty() {
        let candidate = usable[rng.random_range(0..usable.len())];
        if usable.len() > 1 && selected.last().map(|t| &t.path) == Some(&candidate.path) {
            continue;
        }
        covered += candidate.duration;
        selected.push(candidate.clone());
    }
    selected
}

/// Mix a crossfaded background track sequence under the primary audio at a
/// fixed attenuation, trimmed to the video's duration. Video is copied.
pub fn mix_background_music<R: Rng + ?Sized>(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    tracks: &[MusicTrack],
    video_duration: f64,
    rng: &mut R,
    encoding: &EncodingConfig,
) -> MediaResult<MusicPlan> {
    if !video_duration.is_finite() || video_duration <= 0.0 {
        return Err(MediaError::InvalidTargetDuration(video_duration));
    }
    let selected = select_tracks(tracks, video_duration, rng);
    if selected.is_empty() {
        return Err(MediaError::NoMusicTracks);
    }

    let mut inputs = InputRegistry::new();
    inputs.add(InputKey::Primary, InputSpec::media(input.as_ref()))?;
    for (i, track) in selected.iter().enumerate() {
        inputs.add(InputKey::Music(i), InputSpec::media(&track.path))?;
    }

    let mut g = FilterGraph::new();
    let mut bg = g.step(&[&inputs.audio(&InputKey::Music(0))?], "anull", "bg");
    for i in 1..selected.len() {
        bg = g.step(
            &[&bg, &inputs.audio(&InputKey::Music(i))?],
            format!("acrossfade=d={TRACK_CROSSFADE_SECS}:c1=tri:c2=tri"),
            "bg",
        );
    }
    let bg = g.step(
        &[&bg],
        format!("volume={BG_VOLUME},atrim=0:{video_duration:.3},asetpts=PTS-STARTPTS"),
        "bgv",
    );
    let main = g.step(
        &[&inputs.audio(&InputKey::Primary)?],
        format!("volume={MAIN_VOLUME},atrim=0:{video_duration:.3},asetpts=PTS-STARTPTS"),
        "main",
    );
    let mixed = g.step(
        &[&main, &bg],
        "amix=inputs=2:normalize=0:duration=first",
        "aout",
    );

    let command = TranscodeCommand::new(inputs, output.as_ref())
        .filter_complex(g.render())
        .map_stream("0:v")
        .map_pad(&mixed)
        .output_args(["-c:v", "copy"])
        .encode_audio(encoding)
        .output_args(["-b:a".to_string(), encoding.audio_bitrate.clone()]);

    Ok(MusicPlan { command, tracks: selected })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn library() -> Vec<MusicTrack> {
        vec![
            MusicTrack::new("/music/calm.mp3", 30.0),
            MusicTrack::new("/music/tense.mp3", 45.0),
            MusicTrack::new("/music/broken.mp3", 0.0),
        ]
    }

    #[test]
    fn selection_covers_the_video_without_back_to_back_repeats() {
        let mut rng = StdRng::seed_from_u64(7);
        let selected = select_tracks(&library(), 200.0, &mut rng);

        let total: f64 = selected.iter().map(|t| t.duration).sum();
        assert!(total >= 200.0);
        for pair in selected.windows(2) {
            assert_ne!(pair[0].path, pair[1].path);
        }
        assert!(selected.iter().all(|t| t.duration > 0.0));
    }

    #[test]
    fn single_track_may_repeat() {
        let tracks = vec![MusicTrack::new("/music/only.mp3", 10.0)];
        let mut rng = StdRng::seed_from_u64(7);
        let selected = select_tracks(&tracks, 25.0, &mut rng);
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn mix_chains_crossfades_and_attenuates() {
        let mut rng = StdRng::seed_from_u64(1);
        let plan = mix_background_music(
            "in.mp4",
            "out.mp4",
            &library(),
            100.0,
            &mut rng,
            &EncodingConfig::default(),
        )
        .unwrap();

        let shell = plan.command.to_shell_string();
        assert_eq!(
            shell.matches("acrossfade=d=1:c1=tri:c2=tri").count(),
            plan.tracks.len() - 1
        );
        assert!(shell.contains("volume=0.1,atrim=0:100.000,asetpts=PTS-STARTPTS"));
        assert!(shell.contains("amix=inputs=2:normalize=0:duration=first"));
        assert!(shell.contains("-map \"0:v\""));
        assert!(shell.contains("-c:v copy"));
        assert!(shell.contains("-b:a 160k"));
    }

    #[test]
    fn no_usable_tracks_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let tracks = vec![MusicTrack::new("/music/broken.mp3", 0.0)];
        let err = mix_background_music(
            "in.mp4",
            "out.mp4",
            &tracks,
            10.0,
            &mut rng,
            &EncodingConfig::default(),
        );
        assert!(matches!(err, Err(MediaError::NoMusicTracks)));
    }
}
