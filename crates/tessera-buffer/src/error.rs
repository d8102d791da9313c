//! Errors raised by buffer mutations.

use thiserror::Error;

use crate::range::ProtectedRange;

/// Errors arising from buffer operations.
///
/// Every error is returned before any byte or range is modified, so a caller
/// observing one of these values can rely on the buffer being unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The affected range extends past the end of the text.
    #[error("range {start}..{end} exceeds buffer length {len}")]
    OutOfBounds {
        /// First byte offset touched by the operation.
        start: usize,
        /// Exclusive end offset touched by the operation (saturated on
        /// overflow).
        end: usize,
        /// Buffer length at the time of the call.
        len: usize,
    },

    /// The affected range overlaps a protected range, or an insertion point
    /// falls strictly inside one.
    #[error("edit at {start}..{end} touches protected range {protected}")]
    ProtectedViolation {
        /// First byte offset touched by the operation.
        start: usize,
        /// Exclusive end offset touched by the operation.
        end: usize,
        /// The protected range that rejected the edit.
        protected: ProtectedRange,
    },

    /// A protected range was empty, reversed, or ran past the end of the text.
    #[error("invalid protected range {start}..{end} for buffer length {len}")]
    InvalidRange {
        /// Requested start offset.
        start: usize,
        /// Requested exclusive end offset.
        end: usize,
        /// Buffer length at the time of the call.
        len: usize,
    },

    /// The buffer already holds the maximum number of protected ranges.
    #[error("protected range capacity of {limit} exhausted")]
    CapacityExceeded {
        /// Configured maximum number of protected ranges.
        limit: usize,
    },
}
