//! Error types for write-rare containers

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors surfaced by the checked operations of the containers.
///
/// Nothing is retried internally. When a replace fails, the container still
/// holds the contents it had before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Positional access past the end of the buffer.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Keyed access to a map that holds no entry for the key.
    #[error("key not found")]
    KeyNotFound,

    /// The allocator could not provide the backing buffer.
    #[error("failed to allocate buffer for {requested} elements")]
    AllocationFailed {
        requested: usize,
        #[source]
        source: TryReserveError,
    },

    /// A source iterator yielded a different number of elements than declared.
    ///
    /// `actual` is what was observed before giving up: the element count for a
    /// short source, `declared + 1` for a long one (it is not read further), or
    /// the violated size-hint bound when the hint alone rules `declared` out.
    #[error("source declared {declared} elements but yielded {actual}")]
    LengthMismatch { declared: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
