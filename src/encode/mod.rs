//! Frame to embeddable-image conversion.

/// Data URI embedding and lossy re-encoding.
pub mod embed;
