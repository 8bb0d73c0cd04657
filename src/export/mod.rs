//! Serialization and persistence of finished documents.

/// Export destinations.
pub mod persist;
/// Compact/pretty serialization and export naming.
pub mod serialize;

use std::path::PathBuf;

/// Outcome of one export.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportReport {
    pub filename: String,
    /// Where the target stored the bytes.
    pub location: PathBuf,
    /// Size of the compact text handed to the target.
    pub bytes: usize,
    /// Size of the indented form of the same document.
    pub pretty_bytes: usize,
    pub compression_ratio_percent: f64,
}
