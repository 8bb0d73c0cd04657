/// `ffmpeg`-backed frame extraction.
pub mod ffmpeg;
/// Frame and request types plus the [`frame::FrameSource`] boundary.
pub mod frame;
