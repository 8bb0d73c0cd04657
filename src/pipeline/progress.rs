use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::error::{FlipbookError, FlipbookResult};

/// One progress update: completion percentage plus a human-readable label.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressEvent {
    /// `0..=100`, never decreasing within a run.
    pub percent: f64,
    pub label: String,
}

/// Out-of-band messages a run reports alongside progress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// More frames were extracted than allowed; only the first `kept` are used.
    Truncated { extracted: usize, kept: usize },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncated { extracted, kept } => write!(
                f,
                "frame limit exceeded ({extracted} > {kept}), keeping the first {kept} frames"
            ),
        }
    }
}

/// Receiver for run progress.
pub trait ProgressSink {
    fn progress(&mut self, event: ProgressEvent);

    fn notice(&mut self, notice: Notice) {
        let _ = notice;
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn progress(&mut self, _event: ProgressEvent) {}
}

/// Keeps every event, for tests and debugging.
#[derive(Clone, Debug, Default)]
pub struct RecordingProgress {
    pub events: Vec<ProgressEvent>,
    pub notices: Vec<Notice>,
}

impl ProgressSink for RecordingProgress {
    fn progress(&mut self, event: ProgressEvent) {
        self.events.push(event);
    }

    fn notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

/// Forwards progress to `tracing` at info level and notices at warn level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn progress(&mut self, event: ProgressEvent) {
        tracing::info!(percent = event.percent, "{}", event.label);
    }

    fn notice(&mut self, notice: Notice) {
        tracing::warn!("{notice}");
    }
}

/// Adapter turning a closure into a [`ProgressSink`].
pub struct FnProgress<F>(pub F);

impl<F: FnMut(ProgressEvent)> ProgressSink for FnProgress<F> {
    fn progress(&mut self, event: ProgressEvent) {
        (self.0)(event)
    }
}

/// Clamps reported percentages into `0..=100` and keeps them non-decreasing.
pub(crate) struct ProgressTracker<'a> {
    sink: &'a mut dyn ProgressSink,
    last: f64,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(sink: &'a mut dyn ProgressSink) -> Self {
        Self { sink, last: 0.0 }
    }

    pub(crate) fn report(&mut self, percent: f64, label: impl Into<String>) {
        let percent = if percent.is_nan() {
            self.last
        } else {
            percent.clamp(self.last, 100.0)
        };
        self.last = percent;
        self.sink.progress(ProgressEvent {
            percent,
            label: label.into(),
        });
    }

    pub(crate) fn notice(&mut self, notice: Notice) {
        self.sink.notice(notice);
    }
}

/// Shared cancellation flag, checked by the converter between frames.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once [`CancelToken::cancel`] has been called.
    pub fn check(&self) -> FlipbookResult<()> {
        if self.is_cancelled() {
            return Err(FlipbookError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/progress.rs"]
mod tests;
