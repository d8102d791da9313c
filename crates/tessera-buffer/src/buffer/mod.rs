//! The protected-region buffer.
//!
//! [`Buffer`] owns a byte sequence and a flat list of [`ProtectedRange`]s.
//! Range lookups are linear scans; the list is capped at
//! [`MAX_PROTECTED_RANGES`] entries, which keeps every check cheap.

use crate::error::BufferError;
use crate::lines::LineSpans;
use crate::range::ProtectedRange;

/// Maximum number of protected ranges a single buffer can hold.
pub const MAX_PROTECTED_RANGES: usize = 64;

/// A growable text buffer whose protected ranges reject ordinary edits.
///
/// # Example
///
/// ```
/// use tessera_buffer::Buffer;
///
/// let mut buffer = Buffer::from_content("Commit: abc123\n");
/// buffer.mark_protected(8, 14)?;
/// buffer.insert(15, b"note\n")?;
/// assert_eq!(buffer.text(), b"Commit: abc123\nnote\n");
/// assert_eq!(buffer.protected_ranges()[0].as_range(), 8..14);
/// # Ok::<(), tessera_buffer::BufferError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    text: Vec<u8>,
    protected: Vec<ProtectedRange>,
}

impl Buffer {
    /// Creates a buffer holding `initial` with no protected ranges.
    #[must_use]
    pub fn from_content(initial: impl Into<Vec<u8>>) -> Self {
        Self {
            text: initial.into(),
            protected: Vec::new(),
        }
    }

    /// Returns the current text.
    #[must_use]
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// Returns the current text as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns the UTF-8 decoding error when the text is not valid UTF-8.
    pub fn as_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.text)
    }

    /// Length of the text in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns `true` when the text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Protected ranges in the order they were marked.
    #[must_use]
    pub fn protected_ranges(&self) -> &[ProtectedRange] {
        &self.protected
    }

    /// Number of ranges that can still be marked.
    #[must_use]
    pub fn remaining_capacity(&self) -> usize {
        MAX_PROTECTED_RANGES.saturating_sub(self.protected.len())
    }

    /// Returns `true` when the byte at `offset` is protected.
    #[must_use]
    pub fn is_protected(&self, offset: usize) -> bool {
        self.protected.iter().any(|range| range.contains(offset))
    }

    /// Returns the first protected range intersecting `[start, end)`.
    #[must_use]
    pub fn overlapping_range(&self, start: usize, end: usize) -> Option<ProtectedRange> {
        self.protected
            .iter()
            .copied()
            .find(|range| range.overlaps(start, end))
    }

    /// Iterates over the byte ranges of each line.
    #[must_use]
    pub fn line_spans(&self) -> LineSpans<'_> {
        LineSpans::new(&self.text)
    }

    /// Marks `[start, end)` as protected.
    ///
    /// Existing ranges and the text are left untouched; overlapping marks are
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidRange`] when `start >= end` or
    /// `end > len`, and [`BufferError::CapacityExceeded`] when the buffer
    /// already holds [`MAX_PROTECTED_RANGES`] ranges.
    pub fn mark_protected(&mut self, start: usize, end: usize) -> Result<(), BufferError> {
        if start >= end || end > self.text.len() {
            return Err(BufferError::InvalidRange {
                start,
                end,
                len: self.text.len(),
            });
        }
        if self.protected.len() >= MAX_PROTECTED_RANGES {
            return Err(BufferError::CapacityExceeded {
                limit: MAX_PROTECTED_RANGES,
            });
        }
        self.protected.push(ProtectedRange::new(start, end));
        Ok(())
    }

    /// Inserts `data` at `index`.
    ///
    /// Inserting exactly at a range boundary is allowed. Every range starting
    /// at or after `index` moves forward by `data.len()`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfBounds`] when `index > len` and
    /// [`BufferError::ProtectedViolation`] when `index` falls strictly inside
    /// a protected range.
    pub fn insert(&mut self, index: usize, data: &[u8]) -> Result<(), BufferError> {
        if index > self.text.len() {
            return Err(self.out_of_bounds(index, index));
        }
        if let Some(protected) = self
            .protected
            .iter()
            .copied()
            .find(|range| range.strictly_contains(index))
        {
            return Err(BufferError::ProtectedViolation {
                start: index,
                end: index,
                protected,
            });
        }

        self.text.splice(index..index, data.iter().copied());
        let amount = data.len();
        for range in self.protected.iter_mut().filter(|r| r.start() >= index) {
            range.shift_forward(amount);
        }
        Ok(())
    }

    /// Replaces `data.len()` bytes starting at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfBounds`] when the replaced span runs past
    /// the end of the text and [`BufferError::ProtectedViolation`] when it
    /// overlaps a protected range.
    pub fn overwrite(&mut self, index: usize, data: &[u8]) -> Result<(), BufferError> {
        let end = self.checked_end(index, data.len())?;
        self.ensure_unprotected(index, end)?;
        self.replace_in_place(index, end, data);
        Ok(())
    }

    /// Replaces bytes without consulting protected ranges.
    ///
    /// Reserved for the owning system when it refreshes protected content,
    /// such as rewriting a status line. Ranges are unaffected because the
    /// length of the text does not change.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfBounds`] when the replaced span runs past
    /// the end of the text.
    pub fn overwrite_privileged(&mut self, index: usize, data: &[u8]) -> Result<(), BufferError> {
        let end = self.checked_end(index, data.len())?;
        self.replace_in_place(index, end, data);
        Ok(())
    }

    /// Removes `count` bytes starting at `index`.
    ///
    /// A zero `count` is a no-op. Every range starting at or after `index`
    /// moves back by `count`.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfBounds`] when the erased span runs past the
    /// end of the text and [`BufferError::ProtectedViolation`] when it
    /// overlaps a protected range.
    pub fn erase(&mut self, index: usize, count: usize) -> Result<(), BufferError> {
        if count == 0 {
            return Ok(());
        }
        let end = self.checked_end(index, count)?;
        self.ensure_unprotected(index, end)?;

        self.text.drain(index..end);
        for range in self.protected.iter_mut().filter(|r| r.start() >= index) {
            range.shift_back(count);
        }
        Ok(())
    }

    fn checked_end(&self, index: usize, count: usize) -> Result<usize, BufferError> {
        let end = index.saturating_add(count);
        if end > self.text.len() {
            return Err(self.out_of_bounds(index, end));
        }
        Ok(end)
    }

    fn ensure_unprotected(&self, start: usize, end: usize) -> Result<(), BufferError> {
        self.overlapping_range(start, end)
            .map_or(Ok(()), |protected| {
                Err(BufferError::ProtectedViolation {
                    start,
                    end,
                    protected,
                })
            })
    }

    fn replace_in_place(&mut self, start: usize, end: usize, data: &[u8]) {
        if let Some(target) = self.text.get_mut(start..end) {
            target.copy_from_slice(data);
        }
    }

    fn out_of_bounds(&self, start: usize, end: usize) -> BufferError {
        BufferError::OutOfBounds {
            start,
            end,
            len: self.text.len(),
        }
    }
}
