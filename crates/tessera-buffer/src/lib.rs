//! Text buffers with protected byte ranges.
//!
//! The `tessera-buffer` crate provides [`Buffer`], a growable byte sequence
//! that carries a bounded set of [`ProtectedRange`]s. Ordinary mutations
//! ([`Buffer::insert`], [`Buffer::overwrite`], [`Buffer::erase`]) refuse to
//! touch protected bytes, while [`Buffer::overwrite_privileged`] lets the
//! owning system refresh protected content in place.
//!
//! Protected ranges shift with the text: inserting or erasing before a range
//! moves it by the same amount, so the invariant `start < end <= len` holds
//! after every successful call. Failed calls leave the text and the ranges
//! exactly as they were.
//!
//! # Example
//!
//! ```
//! use tessera_buffer::{Buffer, BufferError};
//!
//! let mut buffer = Buffer::from_content("cmd\nstatus\n");
//! buffer.mark_protected(4, 10)?;
//!
//! let rejected = buffer.overwrite(6, b"READY");
//! assert!(matches!(rejected, Err(BufferError::ProtectedViolation { .. })));
//! assert_eq!(buffer.text(), b"cmd\nstatus\n");
//!
//! buffer.insert(0, b"exec ")?;
//! assert_eq!(buffer.protected_ranges()[0].start(), 9);
//! # Ok::<(), BufferError>(())
//! ```

mod buffer;
mod error;
mod lines;
mod range;

#[cfg(test)]
mod tests;

pub use self::buffer::{Buffer, MAX_PROTECTED_RANGES};
pub use self::error::BufferError;
pub use self::lines::LineSpans;
pub use self::range::ProtectedRange;
