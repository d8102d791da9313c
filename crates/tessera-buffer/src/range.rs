//! Half-open protected byte intervals.

use std::fmt;
use std::ops::Range;

/// A half-open byte interval `[start, end)` that rejects ordinary edits.
///
/// Ranges are only created by [`Buffer::mark_protected`](crate::Buffer::mark_protected),
/// which guarantees `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProtectedRange {
    start: usize,
    end: usize,
}

impl ProtectedRange {
    pub(crate) const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Inclusive start offset.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Exclusive end offset.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Number of protected bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Always `false`; protected ranges are never empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the interval as a standard range.
    #[must_use]
    pub const fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Returns `true` when `[start, end)` intersects this range.
    ///
    /// An empty query interval sitting strictly inside the range counts as an
    /// intersection.
    #[must_use]
    pub const fn overlaps(&self, start: usize, end: usize) -> bool {
        !(end <= self.start || start >= self.end)
    }

    /// Returns `true` when `offset` lies strictly between the endpoints.
    #[must_use]
    pub const fn strictly_contains(&self, offset: usize) -> bool {
        self.start < offset && offset < self.end
    }

    /// Returns `true` when `offset` is one of the protected bytes.
    #[must_use]
    pub const fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub(crate) const fn shift_forward(&mut self, amount: usize) {
        self.start += amount;
        self.end += amount;
    }

    pub(crate) const fn shift_back(&mut self, amount: usize) {
        self.start -= amount;
        self.end -= amount;
    }
}

impl fmt::Display for ProtectedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl From<ProtectedRange> for Range<usize> {
    fn from(range: ProtectedRange) -> Self {
        range.as_range()
    }
}
