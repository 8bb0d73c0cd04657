//! Lottie flipbook document model and assembly.

/// Pure assembly of encoded frames into a document.
pub mod assemble;
/// Serde model of the document schema.
pub mod model;
