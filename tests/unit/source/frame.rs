use std::io::Cursor;

use super::*;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn req(fps: f64, scale: f64) -> ExtractRequest {
    ExtractRequest::new(FrameRate::new(fps).unwrap(), scale).unwrap()
}

#[test]
fn from_encoded_reads_header_dimensions() {
    let frame = RawFrame::from_encoded(FrameIndex(3), png_bytes(64, 48)).unwrap();
    assert_eq!(frame.index, FrameIndex(3));
    assert_eq!((frame.width, frame.height), (64, 48));
}

#[test]
fn from_encoded_rejects_garbage() {
    let err = RawFrame::from_encoded(FrameIndex(0), b"not an image".to_vec()).unwrap_err();
    assert!(matches!(err, FlipbookError::Decode(_)));
}

#[test]
fn extract_request_scale_bounds() {
    let fps = FrameRate::new(15.0).unwrap();
    assert!(ExtractRequest::new(fps, 0.0).is_err());
    assert!(ExtractRequest::new(fps, 1.5).is_err());
    assert!(ExtractRequest::new(fps, f64::NAN).is_err());
    assert!(!req(15.0, 1.0).downscales());
    assert!(req(15.0, 0.5).downscales());
}

#[derive(serde::Deserialize)]
struct RequestFields {
    fps: FrameRate,
    scale: f64,
}

#[test]
fn decoded_frame_rate_cannot_be_zero() {
    for bad in [r#"{"fps": 0, "scale": 1}"#, r#"{"fps": -3, "scale": 1}"#] {
        assert!(serde_json::from_str::<RequestFields>(bad).is_err(), "{bad}");
    }
    let fields: RequestFields = serde_json::from_str(r#"{"fps": 5, "scale": 0.5}"#).unwrap();
    let request = ExtractRequest::new(fields.fps, fields.scale).unwrap();
    assert_eq!(request.frame_rate.as_f64(), 5.0);
}

#[test]
fn in_memory_source_load_is_idempotent() {
    let mut src = InMemoryFrameSource::default();
    assert!(!src.is_loaded());
    src.load().unwrap();
    src.load().unwrap();
    assert!(src.is_loaded());
    assert_eq!(src.load_calls(), 1);
}

#[test]
fn in_memory_source_rejects_empty_video() {
    let mut src = InMemoryFrameSource::new(vec![]);
    let err = src.extract_frames(&[], &req(15.0, 1.0)).unwrap_err();
    assert!(matches!(err, FlipbookError::Validation(_)));
}

#[test]
fn in_memory_source_serves_frames_and_records_requests() {
    let frames = vec![
        RawFrame::from_encoded(FrameIndex(0), png_bytes(4, 2)).unwrap(),
        RawFrame::from_encoded(FrameIndex(1), png_bytes(4, 2)).unwrap(),
    ];
    let mut src = InMemoryFrameSource::new(frames.clone());
    let got = src.extract_frames(b"video", &req(5.0, 0.5)).unwrap();
    assert_eq!(got, frames);
    assert_eq!(src.requests().len(), 1);
    assert_eq!(src.requests()[0].scale_factor, 0.5);
}

#[test]
fn failing_source_reports_decode_error() {
    let mut src = InMemoryFrameSource::failing("unsupported codec");
    let err = src.extract_frames(b"video", &req(15.0, 1.0)).unwrap_err();
    assert!(matches!(err, FlipbookError::Decode(ref m) if m.contains("unsupported codec")));
}
