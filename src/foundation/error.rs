/// Convenience result type used across the crate.
pub type FlipbookResult<T> = Result<T, FlipbookError>;

/// Error taxonomy for the conversion pipeline and export service.
#[derive(thiserror::Error, Debug)]
pub enum FlipbookError {
    /// Invalid caller-provided parameters or document data.
    #[error("validation error: {0}")]
    Validation(String),

    /// The decoder could not be loaded or could not decode the input video.
    #[error("decode error: {0}")]
    Decode(String),

    /// A frame could not be turned into an embeddable image.
    #[error("encode error: {0}")]
    Encode(String),

    /// No frames were left to assemble.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Export was requested before any conversion succeeded.
    #[error("no document available: run a conversion first")]
    NoDocument,

    /// A conversion is already running on this converter.
    #[error("a conversion is already in progress")]
    RunInProgress,

    /// The run was cancelled between frames.
    #[error("conversion cancelled")]
    Cancelled,

    /// Errors when serializing or deserializing documents and params.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlipbookError {
    /// Build a [`FlipbookError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FlipbookError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`FlipbookError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`FlipbookError::EmptyInput`] value.
    pub fn empty_input(msg: impl Into<String>) -> Self {
        Self::EmptyInput(msg.into())
    }

    /// Build a [`FlipbookError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for errors the caller can recover from without a new input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoDocument | Self::RunInProgress)
    }
}

impl From<serde_json::Error> for FlipbookError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
