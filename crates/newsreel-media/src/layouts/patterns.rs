//! Composable filter sub-patterns shared by the layout compositors.

use crate::config::{ComposeConfig, RegionSize};
use crate::graph::{FilterGraph, Pad};

/// Escape text for a `drawtext` argument.
pub fn escape_drawtext(text: &str) -> String {
    text.replace('\'', "\\'")
}

/// Stretch to fill and blur, ignoring aspect ratio. Used for backdrop plates
/// that sit entirely behind a sharp foreground.
pub fn stretch_blur(g: &mut FilterGraph, src: &Pad, size: RegionSize, blur: &str) -> Pad {
    g.step(
        &[src],
        format!("scale={}:{},{}", size.w, size.h, blur),
        "blur",
    )
}

/// Aspect-fill, blur, then crop to the exact region.
pub fn fill_blur(g: &mut FilterGraph, src: &Pad, size: RegionSize, blur: &str) -> Pad {
    g.step(
        &[src],
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=increase,{blur},crop={w}:{h}",
            w = size.w,
            h = size.h,
        ),
        "blur",
    )
}

/// Aspect-fill with edge cropping; never letterboxes.
pub fn fill_crop(g: &mut FilterGraph, src: &Pad, size: RegionSize) -> Pad {
    g.step(
        &[src],
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}",
            w = size.w,
            h = size.h,
        ),
        "fg",
    )
}

/// Scale by height, then crop a centered window. Used for clips inside the
/// small slideshow patch where width overshoot is expected.
pub fn fill_height_center_crop(g: &mut FilterGraph, src: &Pad, size: RegionSize) -> Pad {
    g.step(
        &[src],
        format!(
            "scale=-1:{h}:force_original_aspect_ratio=increase,\
             crop={w}:{h}:(in_w-{w})/2:(in_h-{h})/2",
            w = size.w,
            h = size.h,
        ),
        "fg",
    )
}

/// Aspect-fit within the region (small insets keep their full picture).
pub fn fit_within(g: &mut FilterGraph, src: &Pad, size: RegionSize) -> Pad {
    g.step(
        &[src],
        format!(
            "scale={}:{}:force_original_aspect_ratio=decrease",
            size.w, size.h
        ),
        "fit",
    )
}

/// Smoothstep easing expression over a segment's own duration:
/// `u^2 * (3 - 2u)` with `u = min(1, t/d)`.
pub fn smoothstep_ease(duration: f64) -> String {
    let d = duration.max(0.001);
    format!("(pow(min(1\\,t/{d:.3}),2)*(3-2*min(1\\,t/{d:.3})))")
}

/// Horizontal pan for a still image: aspect-fill so both dimensions meet or
/// exceed the target, then an animated crop easing from one edge toward a
/// fractional maximum pan. The pan fraction and centering offset come from
/// the configuration, not the scene.
pub fn horizontal_pan(
    g: &mut FilterGraph,
    src: &Pad,
    size: RegionSize,
    duration: f64,
    cfg: &ComposeConfig,
) -> Pad {
    let ease = smoothstep_ease(duration);
    g.step(
        &[src],
        format!(
            "setsar=1,fps={fps},\
             scale={w}:{h}:force_original_aspect_ratio=increase,\
             crop={w}:{h}:x='((iw-{w})*{off})+((iw-{w})*{ratio})*{ease}':y=0",
            fps = cfg.pan_fps,
            w = size.w,
            h = size.h,
            off = cfg.pan_offset(),
            ratio = cfg.pan_ratio,
        ),
        "pan",
    )
}

/// Per-segment visibility windows for credit overlays on a repeating
/// timeline. Consecutive windows overlap by the crossfade length:
/// `start_i = Σ_{j<i} d_j − i·c` (clamped at zero), `end_i = start_i + d_i`.
/// With `c = 0` this degenerates to plain cumulative windows.
pub fn credit_windows(durations: &[f64], crossfade: f64) -> Vec<(f64, f64)> {
    let mut windows = Vec::with_capacity(durations.len());
    let mut acc = 0.0_f64;
    for (i, d) in durations.iter().enumerate() {
        let start = (acc - i as f64 * crossfade).max(0.0);
        windows.push((start, start + d));
        acc += d;
    }
    windows
}

/// Total span of a crossfade-chained sequence; the `mod` period for looped
/// credit gating.
pub fn windows_span(durations: &[f64], crossfade: f64) -> f64 {
    let total: f64 = durations.iter().sum();
    if durations.len() > 1 {
        total - (durations.len() - 1) as f64 * crossfade
    } else {
        total
    }
}

/// One prepared slideshow segment.
#[derive(Debug)]
pub struct SlideshowSegment {
    pub pad: Pad,
    pub duration: f64,
}

/// Hard-trim each prepared segment to its slot duration, chain the segments
/// (crossfaded when the configured length is positive, hard-cut otherwise)
/// and loop the sequence indefinitely. Returns the looped pad plus the loop
/// period.
pub fn slideshow(
    g: &mut FilterGraph,
    segments: &[SlideshowSegment],
    crossfade: f64,
    loop_size: u32,
) -> (Pad, f64) {
    let trimmed: Vec<Pad> = segments
        .iter()
        .map(|s| {
            g.step(
                &[&s.pad],
                format!("trim=0:{:.3},setpts=PTS-STARTPTS,setsar=1", s.duration),
                "seg",
            )
        })
        .collect();

    let durations: Vec<f64> = segments.iter().map(|s| s.duration).collect();

    let sequence = if trimmed.len() == 1 {
        trimmed.into_iter().next().expect("one segment")
    } else if crossfade > 0.0 {
        let mut chained = trimmed[0].clone();
        let mut offset = 0.0_f64;
        for (i, next) in trimmed.iter().enumerate().skip(1) {
            offset = (offset + durations[i - 1].max(crossfade) - crossfade).max(0.0);
            chained = g.step(
                &[&chained, next],
                format!("xfade=transition=fade:duration={crossfade}:offset={offset:.3}"),
                "mix",
            );
        }
        chained
    } else {
        g.concat_video(&trimmed, "seq")
    };

    let looped = g.step(
        &[&sequence],
        format!("loop=loop=-1:size={loop_size}:start=0"),
        "loop",
    );

    (looped, windows_span(&durations, crossfade.max(0.0)))
}
