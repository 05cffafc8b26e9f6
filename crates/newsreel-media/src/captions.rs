//! Karaoke caption compilation from word-level transcripts.
//!
//! Word timestamps from the speech-to-text service are noisy: tokens can be
//! empty, overlap, run backwards or drift against the real audio length. The
//! compiler filters and repairs them, rescales the track so its final
//! timestamp matches the measured audio duration exactly, then packs words
//! into display blocks with per-word highlight timing.

use newsreel_models::WordStamp;

use crate::error::{MediaError, MediaResult};

/// Forward-repair epsilon, in seconds.
const EPS: f64 = 0.0005;

/// Caption style and packing configuration.
#[derive(Debug, Clone)]
pub struct CaptionConfig {
    pub play_res_x: u32,
    pub play_res_y: u32,
    pub font_name: String,
    pub font_size: u32,
    pub outline: u32,
    /// ASS alignment (2 = bottom center)
    pub alignment: u8,
    pub margin_v: u32,
    /// Target window size in words
    pub window_size: usize,
    /// Character ceiling per block; single words may exceed it
    pub max_chars_per_block: usize,
    /// Minimum display duration per block, in seconds
    pub min_display_secs: f64,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            play_res_x: 1080,
            play_res_y: 1920,
            font_name: "Montserrat ExtraBold".to_string(),
            font_size: 86,
            outline: 8,
            alignment: 2,
            margin_v: 500,
            window_size: 4,
            max_chars_per_block: 20,
            min_display_secs: 0.06,
        }
    }
}

/// One caption word in integer centiseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionWord {
    pub text: String,
    pub start_cs: i64,
    pub end_cs: i64,
}

/// A run of words sharing one visible time window.
#[derive(Debug, Clone)]
pub struct CaptionBlock {
    pub words: Vec<CaptionWord>,
    pub start_cs: i64,
    pub end_cs: i64,
}

impl CaptionBlock {
    /// Total rendered character count.
    pub fn char_count(&self) -> usize {
        self.words.iter().map(|w| w.text.chars().count()).sum()
    }
}

/// A compiled caption script.
#[derive(Debug, Clone)]
pub struct CaptionScript {
    pub blocks: Vec<CaptionBlock>,
    config: CaptionConfig,
}

impl CaptionScript {
    /// Render the full ASS document.
    pub fn render(&self) -> String {
        let min_cs = (self.config.min_display_secs * 100.0).round() as i64;
        let mut out = header(&self.config);
        for block in &self.blocks {
            let parts: Vec<String> = block
                .words
                .iter()
                .map(|w| {
                    let dur = (w.end_cs - w.start_cs).max(min_cs);
                    format!("{{\\k{dur}}}{}", escape_caption_text(&w.text))
                })
                .collect();
            out.push_str(&format!(
                "\nDialogue: 0,{},{},Default,,0,0,0,,{}",
                format_cs(block.start_cs),
                format_cs(block.end_cs),
                parts.join(" ")
            ));
        }
        out.push('\n');
        out
    }
}

/// Compile word timestamps into a caption script whose final timestamp
/// matches `target_duration` exactly.
pub fn compile_captions(
    words: &[WordStamp],
    target_duration: f64,
    config: &CaptionConfig,
) -> MediaResult<CaptionScript> {
    if !target_duration.is_finite() || target_duration <= 0.0 {
        return Err(MediaError::InvalidTargetDuration(target_duration));
    }

    // 1) Keep well-formed records only.
    let mut flat: Vec<WordStamp> = words
        .iter()
        .filter(|w| w.is_well_formed())
        .map(|w| WordStamp::new(w.word.trim(), w.start, w.end))
        .collect();
    if flat.is_empty() {
        return Err(MediaError::EmptyTranscript);
    }

    // 2) Punctuation never becomes its own caption unit.
    let mut merged: Vec<WordStamp> = Vec::with_capacity(flat.len());
    for w in flat.drain(..) {
        match merged.last_mut() {
            Some(prev) if is_punctuation(&w.word) => prev.word.push_str(&w.word),
            _ => merged.push(w),
        }
    }

    // 3) Stable sort by start time keeps service order on ties.
    merged.sort_by(|a, b| a.start.partial_cmp(&b.start).expect("finite starts"));

    // 4) Forward monotonicity repair.
    for i in 1..merged.len() {
        let prev_end = merged[i - 1].end;
        if merged[i].start < prev_end - EPS {
            merged[i].start = prev_end + EPS;
        }
        if merged[i].end < merged[i].start + EPS {
            merged[i].end = merged[i].start + EPS;
        }
    }

    // 5) Rescale so the last word ends exactly at the measured duration;
    // word-relative proportions are preserved, absolute stamps are not
    // trusted.
    let last_end = merged.last().expect("non-empty").end;
    if last_end <= 0.0 {
        return Err(MediaError::EmptyTranscript);
    }
    let scale = target_duration / last_end;

    // 6) Integer centiseconds, rounded, with a non-zero width guarantee.
    let scaled: Vec<CaptionWord> = merged
        .iter()
        .map(|w| {
            let start_cs = (scale * w.start * 100.0).round() as i64;
            let end_cs = ((scale * w.end * 100.0).round() as i64).max(start_cs + 1);
            CaptionWord { text: w.word.clone(), start_cs, end_cs }
        })
        .collect();

    // 7) Greedy block packing: shrink the window until the block fits the
    // character ceiling or is a single word.
    let min_cs = (config.min_display_secs * 100.0).round() as i64;
    let mut blocks = Vec::new();
    let mut i = 0;
    while i < scaled.len() {
        let mut k = config.window_size.min(scaled.len() - i).max(1);
        while k > 1 && block_chars(&scaled[i..i + k]) > config.max_chars_per_block {
            k -= 1;
        }
        let slice = &scaled[i..i + k];
        let start_cs = slice[0].start_cs;
        let end_cs = slice[slice.len() - 1].end_cs.max(start_cs + min_cs);
        blocks.push(CaptionBlock { words: slice.to_vec(), start_cs, end_cs });
        i += k;
    }

    Ok(CaptionScript { blocks, config: config.clone() })
}

fn is_punctuation(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| ",.:;!?…".contains(c))
}

fn block_chars(words: &[CaptionWord]) -> usize {
    words.iter().map(|w| w.text.chars().count()).sum()
}

/// Escape ASS control characters; embedded newlines collapse to spaces.
fn escape_caption_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('{', "\\{")
        .replace('}', "\\}")
        .replace("\r\n", " ")
        .replace('\n', " ")
}

/// Format integer centiseconds as `H:MM:SS.CS`.
fn format_cs(cs: i64) -> String {
    let cs = cs.max(0);
    let frac = cs % 100;
    let total_secs = cs / 100;
    let s = total_secs % 60;
    let m = (total_secs / 60) % 60;
    let h = total_secs / 3600;
    format!("{h}:{m:02}:{s:02}.{frac:02}")
}

fn header(cfg: &CaptionConfig) -> String {
    let primary_active = "&H005200FF";
    let secondary_inactive = "&H00F7E6E7";
    let outline_colour = "&H001E1E1F";
    let back_colour = "&H00000000";

    format!(
        "[Script Info]\n\
         Title: karaoke\n\
         ScriptType: v4.00+\n\
         PlayResX: {}\n\
         PlayResY: {}\n\
         \n\
         [V4+ Styles]\n\
         Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n\
         Style: Default,{},{},{primary_active},{secondary_inactive},{outline_colour},{back_colour},-1,0,0,0,100,100,0,0,1,{},0,{},30,30,{},1\n\
         \n\
         [Events]\n\
         Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text",
        cfg.play_res_x,
        cfg.play_res_y,
        cfg.font_name,
        cfg.font_size,
        cfg.outline,
        cfg.alignment,
        cfg.margin_v,
    )
}
