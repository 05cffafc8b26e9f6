//! Canvas geometry and timing configuration.
//!
//! Every positional constant the compositors use lives here, injected as one
//! immutable value so layouts can be exercised with alternate geometries in
//! tests. Defaults describe the 16:9 long-form canvas.

/// Width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSize {
    pub w: u32,
    pub h: u32,
}

impl RegionSize {
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
}

/// The large decorative frame that hosts the primary visual.
#[derive(Debug, Clone, Copy)]
pub struct FullFrame {
    /// Outer frame art size
    pub frame: RegionSize,
    /// Sharp foreground region inside the frame
    pub fg: RegionSize,
    /// Blurred backdrop plate behind the foreground
    pub blur: RegionSize,
    /// Frame origin on the canvas
    pub x: i64,
    pub y: i64,
}

impl FullFrame {
    /// Foreground origin, centered inside the frame.
    pub fn fg_pos(&self) -> (i64, i64) {
        (
            self.x + (self.frame.w as i64 - self.fg.w as i64) / 2,
            self.y + (self.frame.h as i64 - self.fg.h as i64) / 2,
        )
    }

    /// Backdrop origin, inset by the frame border.
    pub fn blur_pos(&self) -> (i64, i64) {
        (
            self.x + (self.frame.w as i64 - self.blur.w as i64) / 2,
            self.y + (self.frame.h as i64 - self.blur.h as i64) / 2,
        )
    }
}

/// The medium frame used by the pointing layouts.
#[derive(Debug, Clone, Copy)]
pub struct MediumFrame {
    pub frame: RegionSize,
    pub blur: RegionSize,
    pub inner: RegionSize,
    /// X position when the frame sits on the left of the canvas
    pub left_x: i64,
    /// X position when the frame sits on the right of the canvas
    pub right_x: i64,
    pub y: i64,
}

/// The small side frame hosting poses and slideshows.
#[derive(Debug, Clone, Copy)]
pub struct SmallFrame {
    pub frame: RegionSize,
    pub blur: RegionSize,
    pub fg: RegionSize,
    pub left_x: i64,
    pub right_x: i64,
    pub top_y: i64,
    pub bottom_y: i64,
}

/// Lower-third credit plate geometry.
#[derive(Debug, Clone, Copy)]
pub struct CreditGeometry {
    pub full: RegionSize,
    pub small: RegionSize,
    /// Margin from the hosting frame's inner edge
    pub margin: i64,
    /// Extra X offset applied to the text inside the plate
    pub text_offset_x: i64,
}

/// Immutable compositor configuration.
#[derive(Debug, Clone)]
pub struct ComposeConfig {
    pub canvas: RegionSize,
    pub full: FullFrame,
    pub medium: MediumFrame,
    pub small: SmallFrame,
    pub credit: CreditGeometry,

    /// Default on-screen duration of a still without explicit duration
    pub slide_duration: f64,
    /// Crossfade length for clip/stage concatenation
    pub crossfade: f64,
    /// Crossfade length between slideshow segments; zero hard-cuts
    pub slideshow_crossfade: f64,
    /// Fraction of the horizontal overshoot a still pans across
    pub pan_ratio: f64,
    /// Frame rate stamped on panned stills
    pub pan_fps: u32,
    /// Blur applied to backdrop plates
    pub blur_filter: &'static str,
    /// `loop` filter frame window (filter maximum)
    pub loop_size: u32,
    /// Frame rate scene clips are normalized to before concatenation
    pub concat_fps: &'static str,
    /// Sample rate scene audio is normalized to before concatenation
    pub concat_sample_rate: u32,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            canvas: RegionSize::new(1920, 1080),
            full: FullFrame {
                frame: RegionSize::new(1820, 980),
                fg: RegionSize::new(1780, 940),
                blur: RegionSize::new(1800, 960),
                x: 50,
                y: 50,
            },
            medium: MediumFrame {
                frame: RegionSize::new(1180, 980),
                blur: RegionSize::new(1170, 970),
                inner: RegionSize::new(1120, 920),
                left_x: 50,
                right_x: 690,
                y: 50,
            },
            small: SmallFrame {
                frame: RegionSize::new(590, 465),
                blur: RegionSize::new(570, 445),
                fg: RegionSize::new(550, 425),
                left_x: 50,
                right_x: 1280,
                top_y: 50,
                bottom_y: 565,
            },
            credit: CreditGeometry {
                full: RegionSize::new(695, 114),
                small: RegionSize::new(382, 96),
                margin: 40,
                text_offset_x: 80,
            },
            slide_duration: 4.0,
            crossfade: 0.2,
            slideshow_crossfade: 0.2,
            pan_ratio: 0.3,
            pan_fps: 25,
            blur_filter: "boxblur=40:1",
            loop_size: 32767,
            concat_fps: "30000/1001",
            concat_sample_rate: 44100,
        }
    }
}

impl ComposeConfig {
    /// Centering offset for the horizontal pan start position.
    pub fn pan_offset(&self) -> f64 {
        (1.0 - self.pan_ratio) / 2.0
    }

    /// Credit plate position inside the full frame.
    pub fn credit_full_pos(&self) -> (i64, i64) {
        (
            self.full.x + self.credit.margin,
            self.full.y + self.full.frame.h as i64 - self.credit.full.h as i64 - self.credit.margin,
        )
    }

    /// Credit plate position inside a medium frame anchored at `frame_x`.
    pub fn credit_medium_pos(&self, frame_x: i64) -> (i64, i64) {
        (
            frame_x + self.credit.margin,
            self.medium.y + self.medium.frame.h as i64
                - self.credit.full.h as i64
                - self.credit.margin,
        )
    }
}
