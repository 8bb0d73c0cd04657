//! Run orchestration: parameters, progress reporting and the conversion session.

/// Conversion session and stage sequencing.
pub mod converter;
/// Conversion parameters and their defaults.
pub mod params;
/// Progress channel and cancellation.
pub mod progress;
