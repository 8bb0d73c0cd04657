//! Convert video files into frame-sequence Lottie animations.
//!
//! The API is session-oriented:
//!
//! - Pick a [`FrameSource`] ([`FfmpegFrameSource`] decodes with the system `ffmpeg`)
//! - Create a [`Converter`] and [`Converter::run`] it over the video bytes
//! - [`Converter::export`] the current [`AnimationDocument`] to a [`PersistTarget`]
//!
//! Every extracted frame becomes one embedded image asset plus one image layer that is visible
//! for exactly one frame.
#![forbid(unsafe_code)]

mod foundation;

/// Document model and assembly.
pub mod document;
/// Frame encoding into data URIs.
pub mod encode;
/// Export serialization and persistence.
pub mod export;
/// Conversion session.
pub mod pipeline;
/// Frame extraction.
pub mod source;

pub use crate::foundation::core::{Canvas, FrameIndex, FrameRate, format_number};
pub use crate::foundation::error::{FlipbookError, FlipbookResult};

pub use crate::document::assemble::{LOTTIE_VERSION, assemble, assemble_named};
pub use crate::document::model::{AnimationDocument, ImageAsset, ImageLayer};
pub use crate::encode::embed::{MimeKind, encode_frame};
pub use crate::export::ExportReport;
pub use crate::export::persist::{FilePersist, InMemoryPersist, PersistTarget};
pub use crate::pipeline::converter::{
    ConversionStats, Converter, ConverterOpts, EncodeThreading,
};
pub use crate::pipeline::params::ConversionParams;
pub use crate::pipeline::progress::{
    CancelToken, FnProgress, LogProgress, Notice, NullProgress, ProgressEvent, ProgressSink,
    RecordingProgress,
};
pub use crate::source::ffmpeg::{FfmpegFrameSource, FfmpegSourceOpts, is_ffmpeg_on_path};
pub use crate::source::frame::{ExtractRequest, FrameSource, InMemoryFrameSource, RawFrame};
