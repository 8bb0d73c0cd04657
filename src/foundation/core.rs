use crate::foundation::error::{FlipbookError, FlipbookResult};

/// Zero-based position of a frame in extraction order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u32);

/// Output frames-per-second. Fractional rates are allowed (`fps=7.5` is a valid filter).
///
/// Deserialization goes through [`FrameRate::new`], so a decoded value is always finite and > 0.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct FrameRate(f64);

impl FrameRate {
    pub fn new(fps: f64) -> FlipbookResult<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(FlipbookError::validation(format!(
                "frame rate must be a finite number > 0 (got {fps})"
            )));
        }
        Ok(Self(fps))
    }

    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for FrameRate {
    type Error = FlipbookError;

    fn try_from(fps: f64) -> FlipbookResult<Self> {
        Self::new(fps)
    }
}

impl From<FrameRate> for f64 {
    fn from(fr: FrameRate) -> Self {
        fr.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> FlipbookResult<Self> {
        if width == 0 || height == 0 {
            return Err(FlipbookError::validation(
                "canvas width/height must be > 0",
            ));
        }
        Ok(Self { width, height })
    }

    /// Canvas center in pixels; odd sizes land on half pixels.
    pub fn center(self) -> (f64, f64) {
        (f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

/// Format a number for command lines and labels: integral values drop the fraction, others keep
/// the shortest round-trip representation.
pub fn format_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
