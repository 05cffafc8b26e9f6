//! Typed filter-graph builder and semantic input registry.
//!
//! The graph builder models named pads as opaque handles and only emits the
//! textual `-filter_complex` form at the end, so pad-name collisions and
//! dangling labels are impossible by construction. Inputs are addressed
//! through [`InputRegistry`] by semantic key; the registry owns the mapping
//! from key to ffmpeg input index and renders the ordered input declarations,
//! keeping the enumeration order and the graph's stream references in
//! lock-step.

use std::fmt;
use std::path::Path;

use crate::error::{MediaError, MediaResult};

/// Handle to one pad in a filter graph: either a demuxer stream (`0:v`) or a
/// named intermediate produced by a filter step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pad {
    label: String,
}

impl Pad {
    /// Video stream of input `index`.
    pub fn video(index: usize) -> Pad {
        Pad { label: format!("{index}:v") }
    }

    /// Audio stream of input `index`.
    pub fn audio(index: usize) -> Pad {
        Pad { label: format!("{index}:a") }
    }

    fn named(label: String) -> Pad {
        Pad { label }
    }

    /// The bare pad label, without brackets.
    pub fn name(&self) -> &str {
        &self.label
    }

    /// Bracketed form for `-map`.
    pub fn map_target(&self) -> String {
        format!("[{}]", self.label)
    }

    fn bracketed(&self) -> String {
        format!("[{}]", self.label)
    }
}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.label)
    }
}

/// Accumulates filter steps; every intermediate label is generated from a
/// hint plus a monotonic counter, so two steps can never collide.
#[derive(Debug, Default)]
pub struct FilterGraph {
    steps: Vec<String>,
    counter: usize,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh(&mut self, hint: &str) -> Pad {
        let n = self.counter;
        self.counter += 1;
        Pad::named(format!("{hint}{n}"))
    }

    /// One filter step consuming `inputs` and producing a single pad.
    pub fn step(&mut self, inputs: &[&Pad], expr: impl AsRef<str>, hint: &str) -> Pad {
        let out = self.fresh(hint);
        let ins: String = inputs.iter().map(|p| p.bracketed()).collect();
        self.steps.push(format!("{ins}{}{}", expr.as_ref(), out.bracketed()));
        out
    }

    /// Split one pad into two independent branches.
    pub fn fork(&mut self, input: &Pad, hint: &str) -> (Pad, Pad) {
        let a = self.fresh(hint);
        let b = self.fresh(hint);
        self.steps.push(format!(
            "{}split{}{}",
            input.bracketed(),
            a.bracketed(),
            b.bracketed()
        ));
        (a, b)
    }

    /// One filter step with several output pads (e.g. `concat=v=1:a=1`).
    pub fn step_multi(&mut self, inputs: &[&Pad], expr: impl AsRef<str>, hints: &[&str]) -> Vec<Pad> {
        let outs: Vec<Pad> = hints.iter().map(|h| self.fresh(h)).collect();
        let ins: String = inputs.iter().map(|p| p.bracketed()).collect();
        let labels: String = outs.iter().map(|p| p.bracketed()).collect();
        self.steps
            .push(format!("{ins}{}{labels}", expr.as_ref()));
        outs
    }

    /// Split one pad into `n` independent branches.
    pub fn fork_many(&mut self, input: &Pad, n: usize, hint: &str) -> Vec<Pad> {
        if n == 1 {
            return vec![input.clone()];
        }
        let outs: Vec<Pad> = (0..n).map(|_| self.fresh(hint)).collect();
        let labels: String = outs.iter().map(|p| p.bracketed()).collect();
        self.steps
            .push(format!("{}split={n}{labels}", input.bracketed()));
        outs
    }

    /// Source filter with no inputs (e.g. `color=...`).
    pub fn source(&mut self, expr: impl AsRef<str>, hint: &str) -> Pad {
        let out = self.fresh(hint);
        self.steps.push(format!("{}{}", expr.as_ref(), out.bracketed()));
        out
    }

    /// Concatenate video-only segments in list order.
    pub fn concat_video(&mut self, segments: &[Pad], hint: &str) -> Pad {
        let out = self.fresh(hint);
        let ins: String = segments.iter().map(|p| p.bracketed()).collect();
        self.steps.push(format!(
            "{ins}concat=n={}:v=1:a=0{}",
            segments.len(),
            out.bracketed()
        ));
        out
    }

    /// Number of steps emitted so far.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Emit the textual `-filter_complex` expression.
    pub fn render(&self) -> String {
        self.steps.join(";")
    }
}

/// Semantic identity of one ffmpeg input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InputKey {
    /// Static background plate
    Background,
    /// The scene's primary visual
    MainReference,
    /// Observer pose asset
    Pose,
    /// Decorative frame around the primary region
    PrimaryFrame,
    /// Decorative frame around the small/inset region
    SecondaryFrame,
    /// Lower-third credit plate
    CreditPlate,
    /// Slideshow segment `i` (main reference plus extras, in order)
    Slide(usize),
    /// Narration audio track
    Narration,
    /// Primary input of a post-processing pass
    Primary,
    /// Watermark logo
    Logo,
    /// Terminal still frame
    EndCard,
    /// Generated silent audio source
    SilentAudio,
    /// Background music track `i`
    Music(usize),
    /// Clip `i` of a concatenation
    Clip(usize),
}

impl fmt::Display for InputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKey::Background => write!(f, "background"),
            InputKey::MainReference => write!(f, "main_reference"),
            InputKey::Pose => write!(f, "pose"),
            InputKey::PrimaryFrame => write!(f, "primary_frame"),
            InputKey::SecondaryFrame => write!(f, "secondary_frame"),
            InputKey::CreditPlate => write!(f, "credit_plate"),
            InputKey::Slide(i) => write!(f, "slide[{i}]"),
            InputKey::Narration => write!(f, "narration"),
            InputKey::Primary => write!(f, "primary"),
            InputKey::Logo => write!(f, "logo"),
            InputKey::EndCard => write!(f, "end_card"),
            InputKey::SilentAudio => write!(f, "silent_audio"),
            InputKey::Music(i) => write!(f, "music[{i}]"),
            InputKey::Clip(i) => write!(f, "clip[{i}]"),
        }
    }
}

/// One input declaration: pre-`-i` flags plus the source path or lavfi spec.
#[derive(Debug, Clone)]
pub struct InputSpec {
    args: Vec<String>,
    source: String,
}

impl InputSpec {
    /// Plain demuxed media file.
    pub fn media(path: impl AsRef<Path>) -> Self {
        Self {
            args: Vec::new(),
            source: path.as_ref().to_string_lossy().into_owned(),
        }
    }

    /// Still image looped indefinitely.
    pub fn looped_still(path: impl AsRef<Path>) -> Self {
        Self {
            args: vec!["-loop".into(), "1".into()],
            source: path.as_ref().to_string_lossy().into_owned(),
        }
    }

    /// Still image looped for an exact duration.
    pub fn looped_still_for(path: impl AsRef<Path>, seconds: f64) -> Self {
        Self {
            args: vec![
                "-loop".into(),
                "1".into(),
                "-t".into(),
                format!("{seconds:.3}"),
            ],
            source: path.as_ref().to_string_lossy().into_owned(),
        }
    }

    /// Clip looped endlessly at the demuxer.
    pub fn endless(path: impl AsRef<Path>) -> Self {
        Self {
            args: vec!["-stream_loop".into(), "-1".into()],
            source: path.as_ref().to_string_lossy().into_owned(),
        }
    }

    /// Generated lavfi source, optionally bounded with `-t`.
    pub fn lavfi(spec: impl Into<String>) -> Self {
        Self {
            args: vec!["-f".into(), "lavfi".into()],
            source: spec.into(),
        }
    }

    /// Bound this input with `-t`.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.args.push("-t".into());
        self.args.push(format!("{seconds:.3}"));
        self
    }
}

/// Ordered table of inputs, addressed by semantic key.
#[derive(Debug, Default)]
pub struct InputRegistry {
    entries: Vec<(InputKey, InputSpec)>,
}

impl InputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an input; its index is its position in declaration order.
    pub fn add(&mut self, key: InputKey, spec: InputSpec) -> MediaResult<usize> {
        if self.entries.iter().any(|(k, _)| *k == key) {
            return Err(MediaError::DuplicateInput(key.to_string()));
        }
        self.entries.push((key, spec));
        Ok(self.entries.len() - 1)
    }

    pub fn contains(&self, key: &InputKey) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Input index for a key.
    pub fn index_of(&self, key: &InputKey) -> MediaResult<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k == key)
            .ok_or_else(|| MediaError::InputNotRegistered(key.to_string()))
    }

    /// Video stream pad of a registered input.
    pub fn video(&self, key: &InputKey) -> MediaResult<Pad> {
        Ok(Pad::video(self.index_of(key)?))
    }

    /// Audio stream pad of a registered input.
    pub fn audio(&self, key: &InputKey) -> MediaResult<Pad> {
        Ok(Pad::audio(self.index_of(key)?))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the ordered input declarations.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for (_, spec) in &self.entries {
            args.extend(spec.args.iter().cloned());
            args.push("-i".into());
            args.push(spec.source.clone());
        }
        args
    }
}
