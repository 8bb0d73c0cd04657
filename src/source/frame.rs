use std::io::Cursor;

use crate::foundation::core::{FrameIndex, FrameRate};
use crate::foundation::error::{FlipbookError, FlipbookResult};

/// One extracted still, as produced by the decoder.
///
/// `data` holds an encoded image (PNG for the ffmpeg source). Frames are moved into the encoder
/// and dropped once their asset exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawFrame {
    pub index: FrameIndex,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RawFrame {
    /// Wrap encoded image bytes, reading the dimensions from the image header.
    pub fn from_encoded(index: FrameIndex, data: Vec<u8>) -> FlipbookResult<Self> {
        let (width, height) = image::ImageReader::new(Cursor::new(&data))
            .with_guessed_format()
            .map_err(|e| FlipbookError::decode(format!("frame {}: {e}", index.0)))?
            .into_dimensions()
            .map_err(|e| {
                FlipbookError::decode(format!("frame {}: unreadable image header: {e}", index.0))
            })?;
        Ok(Self {
            index,
            width,
            height,
            data,
        })
    }
}

/// Sampling parameters handed to a [`FrameSource`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtractRequest {
    pub frame_rate: FrameRate,
    /// Uniform downscale in `(0, 1]`; `1` keeps the native size.
    pub scale_factor: f64,
}

impl ExtractRequest {
    pub fn new(frame_rate: FrameRate, scale_factor: f64) -> FlipbookResult<Self> {
        let req = Self {
            frame_rate,
            scale_factor,
        };
        req.validate()?;
        Ok(req)
    }

    pub fn validate(&self) -> FlipbookResult<()> {
        let fps = self.frame_rate.as_f64();
        if !fps.is_finite() || fps <= 0.0 {
            return Err(FlipbookError::validation(format!(
                "frame rate must be a finite number > 0 (got {fps})"
            )));
        }
        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 || self.scale_factor > 1.0 {
            return Err(FlipbookError::validation(format!(
                "scale factor must be in (0, 1] (got {})",
                self.scale_factor
            )));
        }
        Ok(())
    }

    pub fn downscales(&self) -> bool {
        self.scale_factor < 1.0
    }
}

/// Batch frame extraction boundary.
///
/// Ordering contract: `extract_frames` returns frames in strictly increasing `index` order,
/// starting at 0.
pub trait FrameSource {
    /// Prepare the decoder. Calling this again after a successful load is a no-op.
    fn load(&mut self) -> FlipbookResult<()>;
    /// Whether [`FrameSource::load`] has succeeded.
    fn is_loaded(&self) -> bool;
    /// Decode `video` and sample it per `req`.
    fn extract_frames(
        &mut self,
        video: &[u8],
        req: &ExtractRequest,
    ) -> FlipbookResult<Vec<RawFrame>>;
}

pub(crate) fn check_video_bytes(video: &[u8]) -> FlipbookResult<()> {
    if video.is_empty() {
        return Err(FlipbookError::validation("video input is empty"));
    }
    Ok(())
}

/// Source serving pre-extracted frames, for tests and for callers that decode elsewhere.
#[derive(Debug, Default)]
pub struct InMemoryFrameSource {
    frames: Vec<RawFrame>,
    failure: Option<String>,
    loaded: bool,
    load_calls: u32,
    requests: Vec<ExtractRequest>,
}

impl InMemoryFrameSource {
    pub fn new(frames: Vec<RawFrame>) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }

    /// A source whose extraction always fails with a decode error.
    pub fn failing(msg: impl Into<String>) -> Self {
        Self {
            failure: Some(msg.into()),
            ..Self::default()
        }
    }

    /// Replace the frames served by later extractions.
    pub fn set_frames(&mut self, frames: Vec<RawFrame>) {
        self.frames = frames;
        self.failure = None;
    }

    /// How many times the decoder was actually loaded (not counting no-op calls).
    pub fn load_calls(&self) -> u32 {
        self.load_calls
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> &[ExtractRequest] {
        &self.requests
    }
}

impl FrameSource for InMemoryFrameSource {
    fn load(&mut self) -> FlipbookResult<()> {
        if !self.loaded {
            self.load_calls += 1;
            self.loaded = true;
        }
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn extract_frames(
        &mut self,
        video: &[u8],
        req: &ExtractRequest,
    ) -> FlipbookResult<Vec<RawFrame>> {
        check_video_bytes(video)?;
        req.validate()?;
        self.requests.push(*req);
        if let Some(msg) = &self.failure {
            return Err(FlipbookError::decode(msg.clone()));
        }
        Ok(self.frames.clone())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/frame.rs"]
mod tests;
