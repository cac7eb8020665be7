//! Error types for the fbview library.

use thiserror::Error;

/// Main error type for image loading and playback.
#[derive(Error, Debug)]
pub enum Error {
    /// Source cannot be opened or identified.
    #[error("file error: {0}")]
    File(String),

    /// Structurally invalid record stream or mid-frame decode failure.
    #[error("format error: {0}")]
    Format(String),

    /// Allocation failure for a frame or a copy-out buffer.
    #[error("out of memory: failed to allocate {needed} bytes")]
    Memory {
        /// Number of bytes the failed allocation asked for.
        needed: usize,
    },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a file error.
    pub fn file(msg: impl Into<String>) -> Self {
        Error::File(msg.into())
    }

    /// Create a format error.
    pub fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }

    /// Check whether this error invalidates previously stored frames.
    ///
    /// A copy-out allocation failure aborts only the operation that asked
    /// for the copy; the frames already in the store stay valid.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Memory { .. })
    }
}
