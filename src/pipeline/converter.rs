use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use rayon::prelude::*;

use crate::document::assemble::{DEFAULT_DOCUMENT_NAME, assemble_named, image_asset};
use crate::document::model::{AnimationDocument, ImageAsset};
use crate::encode::embed::{MimeKind, encode_frame};
use crate::export::ExportReport;
use crate::export::persist::PersistTarget;
use crate::export::serialize::{compression_ratio, serialize, serialize_pretty, timestamped_filename};
use crate::foundation::core::Canvas;
use crate::foundation::error::{FlipbookError, FlipbookResult};
use crate::foundation::math::percent_of;
use crate::pipeline::params::{ConversionParams, ValidatedParams};
use crate::pipeline::progress::{CancelToken, Notice, ProgressSink, ProgressTracker};
use crate::source::frame::{FrameSource, RawFrame};

/// How frames are encoded within a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EncodeThreading {
    /// One frame at a time on the calling thread.
    #[default]
    Sequential,
    /// Up to `window` frames at a time on a dedicated rayon pool. Output order is unchanged.
    Windowed {
        window: usize,
        threads: Option<usize>,
    },
}

/// Options fixed for the lifetime of a [`Converter`].
#[derive(Clone, Debug)]
pub struct ConverterOpts {
    pub mime: MimeKind,
    pub threading: EncodeThreading,
    pub document_name: String,
}

impl Default for ConverterOpts {
    fn default() -> Self {
        Self {
            mime: MimeKind::Jpeg,
            threading: EncodeThreading::Sequential,
            document_name: DEFAULT_DOCUMENT_NAME.to_string(),
        }
    }
}

/// Per-run statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConversionStats {
    /// Frames the source produced.
    pub frames_extracted: usize,
    /// Frames that made it into the document.
    pub frames_kept: usize,
    /// Total length of the embedded data URIs.
    pub embedded_bytes: usize,
    pub width: u32,
    pub height: u32,
}

impl ConversionStats {
    pub fn truncated(&self) -> bool {
        self.frames_kept < self.frames_extracted
    }
}

/// Conversion session: owns the frame source and the last successful document.
///
/// Runs are serialized per converter; a second `run` while one is in flight fails with
/// [`FlipbookError::RunInProgress`]. A failed run leaves the previous document in place.
pub struct Converter<S> {
    source: Mutex<S>,
    opts: ConverterOpts,
    in_flight: AtomicBool,
    current: Mutex<Option<Arc<AnimationDocument>>>,
    runs: AtomicU64,
}

impl<S: FrameSource> Converter<S> {
    pub fn new(source: S, opts: ConverterOpts) -> Self {
        Self {
            source: Mutex::new(source),
            opts,
            in_flight: AtomicBool::new(false),
            current: Mutex::new(None),
            runs: AtomicU64::new(0),
        }
    }

    pub fn opts(&self) -> &ConverterOpts {
        &self.opts
    }

    /// Convert `video` into a document and make it the current one.
    pub fn run(
        &self,
        video: &[u8],
        params: &ConversionParams,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> FlipbookResult<Arc<AnimationDocument>> {
        self.run_with_stats(video, params, progress, cancel)
            .map(|(doc, _)| doc)
    }

    /// [`Converter::run`], also returning run statistics.
    pub fn run_with_stats(
        &self,
        video: &[u8],
        params: &ConversionParams,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> FlipbookResult<(Arc<AnimationDocument>, ConversionStats)> {
        let _guard = RunGuard::acquire(&self.in_flight)?;
        let run_id = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        let params = params.validate()?;

        let span = tracing::info_span!("conversion", run_id, video_bytes = video.len());
        let _enter = span.enter();

        let mut ctx = RunContext {
            params,
            tracker: ProgressTracker::new(progress),
            cancel,
            stats: ConversionStats::default(),
        };
        let doc = {
            let mut source = self.source.lock().unwrap_or_else(PoisonError::into_inner);
            self.convert(&mut *source, video, &mut ctx)?
        };

        let doc = Arc::new(doc);
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(doc.clone());
        tracing::info!(
            frames = ctx.stats.frames_kept,
            width = ctx.stats.width,
            height = ctx.stats.height,
            "conversion finished"
        );
        Ok((doc, ctx.stats))
    }

    fn convert(
        &self,
        source: &mut S,
        video: &[u8],
        ctx: &mut RunContext<'_, '_>,
    ) -> FlipbookResult<AnimationDocument> {
        ctx.tracker.report(0.0, "loading decoder");
        if !source.is_loaded() {
            source.load()?;
        }
        ctx.cancel.check()?;

        ctx.tracker.report(0.0, "extracting frames");
        let mut frames = source.extract_frames(video, &ctx.params.extract_request())?;
        ctx.stats.frames_extracted = frames.len();
        ctx.cancel.check()?;

        if frames.len() > ctx.params.max_frames {
            let notice = Notice::Truncated {
                extracted: frames.len(),
                kept: ctx.params.max_frames,
            };
            tracing::warn!("{notice}");
            ctx.tracker.notice(notice);
            frames.truncate(ctx.params.max_frames);
        }

        let first = frames
            .first()
            .ok_or_else(|| FlipbookError::empty_input("the video produced no frames"))?;
        let canvas = Canvas::new(first.width, first.height)?;
        ctx.stats.frames_kept = frames.len();
        ctx.stats.width = canvas.width;
        ctx.stats.height = canvas.height;
        ctx.tracker
            .report(0.0, format!("read {} frames", frames.len()));

        let assets = match self.opts.threading {
            EncodeThreading::Sequential => self.encode_sequential(frames, canvas, ctx)?,
            EncodeThreading::Windowed { window, threads } => {
                self.encode_windowed(frames, canvas, window, threads, ctx)?
            }
        };
        ctx.stats.embedded_bytes = assets.iter().map(|a| a.data.len()).sum();

        ctx.tracker.report(100.0, "assembling document");
        let doc = assemble_named(
            assets,
            canvas,
            ctx.params.frame_rate,
            &self.opts.document_name,
        )?;
        ctx.tracker.report(
            100.0,
            format!("done: {} frames ({}x{})", doc.out_point, doc.width, doc.height),
        );
        Ok(doc)
    }

    fn encode_sequential(
        &self,
        frames: Vec<RawFrame>,
        canvas: Canvas,
        ctx: &mut RunContext<'_, '_>,
    ) -> FlipbookResult<Vec<ImageAsset>> {
        let total = frames.len();
        let mut assets = Vec::with_capacity(total);
        for (i, frame) in frames.into_iter().enumerate() {
            ctx.cancel.check()?;
            ctx.tracker.report(
                percent_of(i as u64, total as u64),
                format!("frame {}/{}", i + 1, total),
            );
            warn_on_size_change(&frame, canvas);
            let data = encode_frame(&frame, self.opts.mime, ctx.params.image_quality)?;
            drop(frame);
            assets.push(image_asset(i, canvas, data));
        }
        Ok(assets)
    }

    fn encode_windowed(
        &self,
        frames: Vec<RawFrame>,
        canvas: Canvas,
        window: usize,
        threads: Option<usize>,
        ctx: &mut RunContext<'_, '_>,
    ) -> FlipbookResult<Vec<ImageAsset>> {
        let pool = build_thread_pool(threads)?;
        let window = window.max(1);
        let total = frames.len();
        let mime = self.opts.mime;
        let quality = ctx.params.image_quality;

        let mut assets = Vec::with_capacity(total);
        let mut pending = frames.into_iter();
        loop {
            let chunk: Vec<RawFrame> = pending.by_ref().take(window).collect();
            if chunk.is_empty() {
                break;
            }
            ctx.cancel.check()?;
            let start = assets.len();
            ctx.tracker.report(
                percent_of(start as u64, total as u64),
                format!("frames {}-{}/{}", start + 1, start + chunk.len(), total),
            );
            for frame in &chunk {
                warn_on_size_change(frame, canvas);
            }
            let encoded: Vec<String> = pool.install(|| {
                chunk
                    .par_iter()
                    .map(|frame| encode_frame(frame, mime, quality))
                    .collect::<FlipbookResult<Vec<String>>>()
            })?;
            drop(chunk);
            for (offset, data) in encoded.into_iter().enumerate() {
                assets.push(image_asset(start + offset, canvas, data));
            }
        }
        Ok(assets)
    }

    /// The document produced by the last successful run.
    pub fn current_document(&self) -> Option<Arc<AnimationDocument>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drop the current document (end of session).
    pub fn clear(&self) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Compact serialization of the current document.
    pub fn serialize_current(&self) -> FlipbookResult<String> {
        let doc = self.current_document().ok_or(FlipbookError::NoDocument)?;
        serialize(&doc)
    }

    /// Serialize the current document once and hand exactly those bytes to `target`, under a
    /// timestamped filename.
    pub fn export(&self, target: &mut dyn PersistTarget) -> FlipbookResult<ExportReport> {
        self.export_as(target, &timestamped_filename())
    }

    /// [`Converter::export`] with an explicit suggested filename.
    #[tracing::instrument(skip(self, target))]
    pub fn export_as(
        &self,
        target: &mut dyn PersistTarget,
        filename: &str,
    ) -> FlipbookResult<ExportReport> {
        let doc = self.current_document().ok_or(FlipbookError::NoDocument)?;
        let compact = serialize(&doc)?;
        let pretty = serialize_pretty(&doc)?;
        let location = target.persist(compact.as_bytes(), filename)?;
        let report = ExportReport {
            filename: filename.to_string(),
            location,
            bytes: compact.len(),
            pretty_bytes: pretty.len(),
            compression_ratio_percent: compression_ratio(&pretty, &compact),
        };
        tracing::info!(
            bytes = report.bytes,
            ratio = report.compression_ratio_percent,
            "document exported"
        );
        Ok(report)
    }

    /// Borrow the frame source (for inspection between runs).
    pub fn with_source<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut source = self.source.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *source)
    }
}

/// State owned by one run and dropped with it.
struct RunContext<'p, 'c> {
    params: ValidatedParams,
    tracker: ProgressTracker<'p>,
    cancel: &'c CancelToken,
    stats: ConversionStats,
}

struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> FlipbookResult<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| FlipbookError::RunInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn warn_on_size_change(frame: &RawFrame, canvas: Canvas) {
    if frame.width != canvas.width || frame.height != canvas.height {
        tracing::warn!(
            frame = frame.index.0,
            width = frame.width,
            height = frame.height,
            "frame size differs from canvas {}x{}",
            canvas.width,
            canvas.height
        );
    }
}

fn build_thread_pool(threads: Option<usize>) -> FlipbookResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(FlipbookError::validation(
            "encode 'threads' must be >= 1 when set",
        ));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder.build().map_err(|e| {
        FlipbookError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}"))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/converter.rs"]
mod tests;
