//! Virtual files presented to the editor.
//!
//! A [`VirtualFile`] pairs a protected [`Buffer`] with the classification of
//! each protected range. Classifications are stored in the same order as the
//! buffer's ranges, so [`VirtualFile::readonly_ranges`] always reports the
//! live, shifted offsets. Structural changes go through the file rather than
//! the raw buffer to keep the two lists aligned.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Range;

use tessera_buffer::{Buffer, BufferError};

use crate::classify::{Classification, ClassifiedRange, classify_revision, classify_status};
use crate::error::{BridgeError, Resource};

/// Maximum length of a virtual file path in bytes.
pub const MAX_PATH_BYTES: usize = 4096;

/// Path of the status view.
pub const STATUS_PATH: &str = "tessera://status";

/// Prefix of per-revision view paths.
pub const REVISION_PATH_PREFIX: &str = "tessera://revision/";

/// Bounded identifier of a virtual file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VfsPath(String);

impl VfsPath {
    /// Validates and wraps a path.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::EmptyPath`] for an empty path and
    /// [`BridgeError::CapacityExceeded`] when it exceeds [`MAX_PATH_BYTES`].
    pub fn new(path: impl Into<String>) -> Result<Self, BridgeError> {
        let value = path.into();
        if value.is_empty() {
            return Err(BridgeError::EmptyPath);
        }
        if value.len() > MAX_PATH_BYTES {
            return Err(BridgeError::CapacityExceeded {
                resource: Resource::PathBytes,
                limit: MAX_PATH_BYTES,
            });
        }
        Ok(Self(value))
    }

    /// Path of the status view.
    #[must_use]
    pub fn status() -> Self {
        Self(STATUS_PATH.to_owned())
    }

    /// Path of the view for `revision`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidRevision`] when the identifier is empty,
    /// starts with `-`, or contains whitespace or control characters, and
    /// the errors of [`VfsPath::new`] for an overlong result.
    pub fn revision(revision: &str) -> Result<Self, BridgeError> {
        let valid = !revision.is_empty()
            && !revision.starts_with('-')
            && !revision
                .chars()
                .any(|ch| ch.is_whitespace() || ch.is_control());
        if !valid {
            return Err(BridgeError::InvalidRevision {
                revision: revision.to_owned(),
            });
        }
        Self::new(format!("{REVISION_PATH_PREFIX}{revision}"))
    }

    /// Path text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VfsPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for VfsPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Which tool output a virtual file presents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewKind {
    /// Repository status.
    Status,
    /// Diff of one revision.
    Revision {
        /// Revision identifier passed to the tool.
        revision: String,
    },
}

impl ViewKind {
    /// Classifies `text` with the rules for this view.
    #[must_use]
    pub fn classify(&self, text: &[u8]) -> Vec<ClassifiedRange> {
        match self {
            Self::Status => classify_status(text),
            Self::Revision { .. } => classify_revision(text),
        }
    }
}

/// A maximal run of editable lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableSpan {
    lines: Range<usize>,
    bytes: Range<usize>,
}

impl EditableSpan {
    /// Zero-based line numbers covered by the span.
    #[must_use]
    pub const fn lines(&self) -> Range<usize> {
        self.lines.start..self.lines.end
    }

    /// Byte offsets from the first line's start to the last line's end.
    #[must_use]
    pub const fn bytes(&self) -> Range<usize> {
        self.bytes.start..self.bytes.end
    }
}

/// Editor-facing view of tool output with protected regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualFile {
    path: VfsPath,
    kind: ViewKind,
    buffer: Buffer,
    classifications: Vec<Classification>,
    watched: bool,
}

impl VirtualFile {
    /// Builds a virtual file from raw tool output, protecting every
    /// classified range. Status views start watched.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Buffer`] when the output classifies into more
    /// ranges than a buffer can hold.
    pub fn populate(path: VfsPath, kind: ViewKind, text: Vec<u8>) -> Result<Self, BridgeError> {
        let ranges = kind.classify(&text);
        let mut buffer = Buffer::from_content(text);
        let mut classifications = Vec::with_capacity(ranges.len());
        for range in &ranges {
            buffer.mark_protected(range.start(), range.end())?;
            classifications.push(range.classification());
        }
        let watched = matches!(kind, ViewKind::Status);
        Ok(Self {
            path,
            kind,
            buffer,
            classifications,
            watched,
        })
    }

    /// Path identifying this file.
    #[must_use]
    pub const fn path(&self) -> &VfsPath {
        &self.path
    }

    /// Which view this file presents.
    #[must_use]
    pub const fn kind(&self) -> &ViewKind {
        &self.kind
    }

    /// Underlying buffer.
    #[must_use]
    pub const fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Current text.
    #[must_use]
    pub fn text(&self) -> &[u8] {
        self.buffer.text()
    }

    /// Whether edit scanning includes this file.
    #[must_use]
    pub const fn is_watched(&self) -> bool {
        self.watched
    }

    pub(crate) const fn set_watched(&mut self, watched: bool) {
        self.watched = watched;
    }

    /// Protected ranges with their classification at current offsets.
    pub fn readonly_ranges(&self) -> impl Iterator<Item = ClassifiedRange> + '_ {
        self.buffer
            .protected_ranges()
            .iter()
            .zip(&self.classifications)
            .map(|(range, class)| ClassifiedRange::new(range.start(), range.end(), *class))
    }

    /// Inserts user text; see [`Buffer::insert`].
    ///
    /// # Errors
    ///
    /// Propagates the buffer's rejection.
    pub fn insert(&mut self, index: usize, data: &[u8]) -> Result<(), BufferError> {
        self.buffer.insert(index, data)
    }

    /// Overwrites user text; see [`Buffer::overwrite`].
    ///
    /// # Errors
    ///
    /// Propagates the buffer's rejection.
    pub fn overwrite(&mut self, index: usize, data: &[u8]) -> Result<(), BufferError> {
        self.buffer.overwrite(index, data)
    }

    /// Erases user text; see [`Buffer::erase`].
    ///
    /// # Errors
    ///
    /// Propagates the buffer's rejection.
    pub fn erase(&mut self, index: usize, count: usize) -> Result<(), BufferError> {
        self.buffer.erase(index, count)
    }

    /// Replaces the bytes of protected range `index` with `data` of equal
    /// length, bypassing protection.
    pub(crate) fn refresh_range(&mut self, index: usize, data: &[u8]) -> Result<(), BridgeError> {
        let Some(range) = self.buffer.protected_ranges().get(index).copied() else {
            return Err(BridgeError::UnknownRange {
                path: self.path.to_string(),
                index,
            });
        };
        if range.len() != data.len() {
            return Err(BridgeError::RangeLengthMismatch {
                expected: range.len(),
                actual: data.len(),
            });
        }
        self.buffer.overwrite_privileged(range.start(), data)?;
        Ok(())
    }

    /// Maximal runs of lines that hold user text.
    ///
    /// A line is editable when no protected range intersects it, whatever
    /// its content. Protected lines end a run.
    #[must_use]
    pub fn editable_spans(&self) -> Vec<EditableSpan> {
        let mut spans = Vec::new();
        let mut current: Option<EditableSpan> = None;

        for (number, line) in self.buffer.line_spans().enumerate() {
            if !self.is_editable_line(&line) {
                spans.extend(current.take());
                continue;
            }
            if let Some(span) = current.as_mut() {
                span.lines.end = number + 1;
                span.bytes.end = line.end;
                continue;
            }
            current = Some(EditableSpan {
                lines: number..number + 1,
                bytes: line,
            });
        }
        spans.extend(current);
        spans
    }

    /// Text of every editable span with surrounding whitespace trimmed,
    /// joined by newlines.
    #[must_use]
    pub fn editable_text(&self) -> String {
        self.editable_spans()
            .iter()
            .filter_map(|span| self.buffer.text().get(span.bytes()))
            .map(|bytes| String::from_utf8_lossy(bytes).trim().to_owned())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn is_editable_line(&self, line: &Range<usize>) -> bool {
        self.buffer.overlapping_range(line.start, line.end).is_none()
    }
}
