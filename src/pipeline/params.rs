use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::FrameRate;
use crate::foundation::error::{FlipbookError, FlipbookResult};
use crate::source::frame::ExtractRequest;

pub const DEFAULT_FRAME_RATE: f64 = 15.0;
pub const DEFAULT_SCALE_FACTOR: f64 = 1.0;
pub const DEFAULT_MAX_FRAMES: u32 = 150;
pub const DEFAULT_IMAGE_QUALITY: f64 = 0.8;

/// Caller-facing conversion parameters.
///
/// Deserializes from JSON with every field optional; both `snake_case` and the `camelCase` form
/// (`targetFrameRate`, ...) are accepted.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ConversionParams {
    #[serde(alias = "targetFrameRate", alias = "fps")]
    pub target_frame_rate: f64,
    #[serde(alias = "scaleFactor", alias = "scale")]
    pub scale_factor: f64,
    #[serde(alias = "maxFrames")]
    pub max_frames: u32,
    #[serde(alias = "imageQuality", alias = "quality")]
    pub image_quality: f64,
}

impl Default for ConversionParams {
    fn default() -> Self {
        Self {
            target_frame_rate: DEFAULT_FRAME_RATE,
            scale_factor: DEFAULT_SCALE_FACTOR,
            max_frames: DEFAULT_MAX_FRAMES,
            image_quality: DEFAULT_IMAGE_QUALITY,
        }
    }
}

/// Parameters after defaulting and range checks; immutable for one run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValidatedParams {
    pub frame_rate: FrameRate,
    pub scale_factor: f64,
    pub max_frames: usize,
    pub image_quality: f64,
}

impl ValidatedParams {
    pub fn extract_request(&self) -> ExtractRequest {
        ExtractRequest {
            frame_rate: self.frame_rate,
            scale_factor: self.scale_factor,
        }
    }
}

impl ConversionParams {
    pub fn from_json_str(s: &str) -> FlipbookResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: &Path) -> FlipbookResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read params file '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    /// Apply defaults and range checks.
    ///
    /// Zero, negative and non-finite values fall back to their defaults. Quality above 1 clamps
    /// to 1 (lossless passthrough); a scale factor above 1 is rejected.
    pub fn validate(&self) -> FlipbookResult<ValidatedParams> {
        let fps = positive_or(self.target_frame_rate, DEFAULT_FRAME_RATE);
        let scale = positive_or(self.scale_factor, DEFAULT_SCALE_FACTOR);
        let quality = positive_or(self.image_quality, DEFAULT_IMAGE_QUALITY).min(1.0);
        let max_frames = if self.max_frames == 0 {
            DEFAULT_MAX_FRAMES
        } else {
            self.max_frames
        };

        if scale > 1.0 {
            return Err(FlipbookError::validation(format!(
                "scale factor must be in (0, 1] (got {scale})"
            )));
        }

        Ok(ValidatedParams {
            frame_rate: FrameRate::new(fps)?,
            scale_factor: scale,
            max_frames: max_frames as usize,
            image_quality: quality,
        })
    }
}

fn positive_or(v: f64, default: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { default }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/params.rs"]
mod tests;
