//! Semi-transparent logo overlay.

use std::path::{Path, PathBuf};

use newsreel_models::EncodingConfig;

use crate::command::TranscodeCommand;
use crate::error::MediaResult;
use crate::graph::{FilterGraph, InputKey, InputRegistry, InputSpec};

/// Where the logo sits on the canvas.
#[derive(Debug, Clone, Copy)]
pub enum WatermarkPlacement {
    /// Slowly orbits the canvas center. The incommensurate periods keep the
    /// path from ever visibly repeating.
    Orbiting {
        x_period_secs: f64,
        y_period_secs: f64,
        /// Fraction of the free canvas the orbit sweeps
        radius: f64,
    },
    /// Fixed offset from the bottom-right corner.
    BottomRight { offset_x: u32, offset_y: u32 },
}

/// Watermark overlay configuration.
#[derive(Debug, Clone)]
pub struct WatermarkConfig {
    /// Path to the logo image (PNG with transparency)
    pub image_path: PathBuf,
    /// Logo width after scaling; height follows the aspect ratio
    pub width: u32,
    /// Opacity (0.0 to 1.0)
    pub opacity: f32,
    pub placement: WatermarkPlacement,
}

impl WatermarkConfig {
    pub fn new(image_path: impl AsRef<Path>) -> Self {
        Self {
            image_path: image_path.as_ref().to_path_buf(),
            width: 140,
            opacity: 0.20,
            placement: WatermarkPlacement::Orbiting {
                x_period_secs: 17.0,
                y_period_secs: 23.0,
                radius: 0.8,
            },
        }
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_placement(mut self, placement: WatermarkPlacement) -> Self {
        self.placement = placement;
        self
    }
}

/// Build the overlay command. Audio is copied untouched.
pub fn apply_watermark(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &WatermarkConfig,
    encoding: &EncodingConfig,
) -> MediaResult<TranscodeCommand> {
    let mut inputs = InputRegistry::new();
    inputs.add(InputKey::Primary, InputSpec::media(input.as_ref()))?;
    inputs.add(InputKey::Logo, InputSpec::media(&config.image_path))?;

    let mut g = FilterGraph::new();
    let logo = g.step(
        &[&inputs.video(&InputKey::Logo)?],
        format!(
            "scale={}:-1,format=rgba,colorchannelmixer=aa={:.2}",
            config.width, config.opacity
        ),
        "logo",
    );

    let position = match config.placement {
        WatermarkPlacement::Orbiting {
            x_period_secs,
            y_period_secs,
            radius,
        } => format!(
            "x='(W-w)/2 + (W-w)/2*{radius}*sin(2*PI*t/{x_period_secs})':\
             y='(H-h)/2 + (H-h)/2*{radius}*cos(2*PI*t/{y_period_secs})'"
        ),
        WatermarkPlacement::BottomRight { offset_x, offset_y } => {
            format!("x=W-w-{offset_x}:y=H-h-{offset_y}")
        }
    };
    let video = g.step(
        &[&inputs.video(&InputKey::Primary)?, &logo],
        format!("overlay={position}"),
        "vout",
    );

    Ok(TranscodeCommand::new(inputs, output.as_ref())
        .filter_complex(g.render())
        .map_pad(&video)
        .map_stream("0:a?")
        .encode_video(encoding)
        .output_args(["-c:a", "copy"]))
}
