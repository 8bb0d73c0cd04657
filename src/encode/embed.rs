use std::io::Cursor;

use anyhow::Context as _;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::codecs::jpeg::JpegEncoder;

use crate::foundation::error::{FlipbookError, FlipbookResult};
use crate::foundation::math::mul_div255_u16;
use crate::source::frame::RawFrame;

/// Target image kind for embedded assets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MimeKind {
    Png,
    #[default]
    Jpeg,
}

impl MimeKind {
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Whether a `quality < 1` request re-encodes lossily for this kind.
    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

/// Background used when flattening alpha for formats without an alpha channel.
const FLATTEN_BG: [u8; 3] = [0, 0, 0];

/// Turn one frame into a self-contained `data:` URI.
///
/// With `quality >= 1` (or a lossless `mime`) the frame bytes are embedded untouched, labelled
/// with their own format. Otherwise the frame is decoded and re-encoded lossily at `quality`.
pub fn encode_frame(frame: &RawFrame, mime: MimeKind, quality: f64) -> FlipbookResult<String> {
    if quality >= 1.0 || !mime.is_lossy() {
        let source_mime = sniff_mime(&frame.data).ok_or_else(|| {
            FlipbookError::encode(format!(
                "frame {}: unrecognized image data ({} bytes)",
                frame.index.0,
                frame.data.len()
            ))
        })?;
        return Ok(data_uri(source_mime, &frame.data));
    }
    if !quality.is_finite() || quality <= 0.0 {
        return Err(FlipbookError::validation(format!(
            "image quality must be in (0, 1] (got {quality})"
        )));
    }

    let jpeg = reencode_jpeg(frame, jpeg_quality(quality))?;
    Ok(data_uri(MimeKind::Jpeg.mime(), &jpeg))
}

/// Map `(0, 1]` onto the encoder's `1..=100` scale.
pub fn jpeg_quality(quality: f64) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

fn reencode_jpeg(frame: &RawFrame, quality: u8) -> FlipbookResult<Vec<u8>> {
    let rgb = {
        let surface = image::load_from_memory(&frame.data).map_err(|e| {
            FlipbookError::encode(format!("frame {}: decode failed: {e}", frame.index.0))
        })?;
        flatten_to_rgb8(surface.to_rgba8(), FLATTEN_BG)
    };

    let mut out = Cursor::new(Vec::with_capacity(frame.data.len() / 4));
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .map_err(|e| {
            FlipbookError::encode(format!("frame {}: jpeg encode failed: {e}", frame.index.0))
        })?;
    Ok(out.into_inner())
}

/// Composite straight-alpha RGBA8 over an opaque background.
fn flatten_to_rgb8(rgba: image::RgbaImage, bg: [u8; 3]) -> image::RgbImage {
    let (width, height) = rgba.dimensions();
    let src = rgba.into_raw();
    let mut dst = Vec::with_capacity(src.len() / 4 * 3);

    for s in src.chunks_exact(4) {
        let a = u16::from(s[3]);
        if a == 255 {
            dst.extend_from_slice(&s[..3]);
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            let v = mul_div255_u16(u16::from(s[c]), a) + mul_div255_u16(u16::from(bg[c]), inv);
            dst.push(v.min(255) as u8);
        }
    }

    image::RgbImage::from_raw(width, height, dst)
        .unwrap_or_else(|| image::RgbImage::new(width, height))
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    Some(format.to_mime_type())
}

/// `data:<mime>;base64,<payload>`.
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    let mut out = String::with_capacity(mime.len() + b64.len() + 13);
    out.push_str("data:");
    out.push_str(mime);
    out.push_str(";base64,");
    out.push_str(&b64);
    out
}

/// Split a base64 `data:` URI into its MIME type and decoded bytes.
pub fn decode_data_uri(uri: &str) -> FlipbookResult<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| FlipbookError::validation("embedded data is not a data: URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| FlipbookError::validation("data: URI has no payload separator"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| FlipbookError::validation("data: URI is not base64-encoded"))?;
    let bytes = STANDARD
        .decode(payload)
        .context("decode base64 payload")?;
    Ok((mime.to_string(), bytes))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/embed.rs"]
mod tests;
