//! Line-based classification of tool output into read-only regions.
//!
//! Classification never fails: lines that match no rule are left editable.
//! Every produced range is non-empty and lies within a single line, so the
//! results can be passed straight to `Buffer::mark_protected`.

use std::fmt;
use std::ops::Range;

use tessera_buffer::LineSpans;

/// Section headers printed by the tool's status command.
pub const STATUS_SECTION_HEADERS: &[&str] = &[
    "Working copy changes:",
    "Untracked paths:",
    "Conflicted paths:",
    "The working copy is clean",
    "The working copy has no changes.",
];

/// Labels the tool may print before a changed path.
pub const CHANGE_LABELS: &[&str] = &[
    "modified",
    "added",
    "deleted",
    "renamed",
    "copied",
    "conflicted",
    "untracked",
];

/// Line prefixes treated as headers in revision output.
pub const REVISION_HEADER_PREFIXES: &[&str] = &["diff --git", "index ", "---", "+++", "@@"];

const COMMIT_MARKER: &[u8] = b"Commit:";
const PARENT_MARKER: &[u8] = b"Parent:";
const HUNK_MARKER: &[u8] = b"@@";
const PATH_INDENT: &[u8] = b"  ";

/// Meaning of a read-only region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// A section or hunk header line.
    Header,
    /// The identifier following `Commit:`.
    CommitId,
    /// The identifier following `Parent:`.
    ParentId,
    /// A changed path in status output.
    FilePath,
}

impl Classification {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::CommitId => "commit_id",
            Self::ParentId => "parent_id",
            Self::FilePath => "file_path",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified byte range `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRange {
    start: usize,
    end: usize,
    classification: Classification,
}

impl ClassifiedRange {
    /// Creates a classified range.
    #[must_use]
    pub const fn new(start: usize, end: usize, classification: Classification) -> Self {
        Self {
            start,
            end,
            classification,
        }
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

    /// Meaning of the range.
    #[must_use]
    pub const fn classification(&self) -> Classification {
        self.classification
    }

    /// Offsets as a standard range.
    #[must_use]
    pub const fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Classifies the output of the tool's status command.
///
/// Rules, applied per line in order:
///
/// - while inside a hunk, the first line starting with `+`, `-` or a space
///   ends the hunk; it gains no protection from that and still goes through
///   the rules below;
/// - a line equal to one of [`STATUS_SECTION_HEADERS`] is a header;
/// - after `Commit:` or `Parent:`, the text following the first space is the
///   identifier;
/// - a line starting with `@@` is a header and opens a hunk;
/// - a line indented by two spaces names a file. A leading change label such
///   as `modified:` is skipped and the path runs to the next `:` or the end
///   of the line.
#[must_use]
pub fn classify_status(text: &[u8]) -> Vec<ClassifiedRange> {
    let mut ranges = Vec::new();
    let mut in_hunk = false;

    for span in LineSpans::new(text) {
        let line = text.get(span.clone()).unwrap_or_default();

        if in_hunk && matches!(line.first(), Some(b'+' | b'-' | b' ')) {
            in_hunk = false;
        }

        let classified = if is_section_header(line) {
            Some(ClassifiedRange::new(span.start, span.end, Classification::Header))
        } else if line.starts_with(COMMIT_MARKER) {
            identifier_after_space(span.start, line, Classification::CommitId)
        } else if line.starts_with(PARENT_MARKER) {
            identifier_after_space(span.start, line, Classification::ParentId)
        } else if line.starts_with(HUNK_MARKER) {
            in_hunk = true;
            Some(ClassifiedRange::new(span.start, span.end, Classification::Header))
        } else if line.starts_with(PATH_INDENT) {
            file_path(span.start, line)
        } else {
            None
        };

        ranges.extend(classified);
    }

    ranges
}

/// Classifies the output of the tool's revision diff command.
///
/// Lines starting with one of [`REVISION_HEADER_PREFIXES`] are headers.
#[must_use]
pub fn classify_revision(text: &[u8]) -> Vec<ClassifiedRange> {
    LineSpans::new(text)
        .filter(|span| {
            let line = text.get(span.clone()).unwrap_or_default();
            REVISION_HEADER_PREFIXES
                .iter()
                .any(|prefix| line.starts_with(prefix.as_bytes()))
        })
        .map(|span| ClassifiedRange::new(span.start, span.end, Classification::Header))
        .collect()
}

fn is_section_header(line: &[u8]) -> bool {
    STATUS_SECTION_HEADERS
        .iter()
        .any(|header| line == header.as_bytes())
}

fn identifier_after_space(
    line_start: usize,
    line: &[u8],
    classification: Classification,
) -> Option<ClassifiedRange> {
    let space = line.iter().position(|&byte| byte == b' ')?;
    let start = space + 1;
    (start < line.len()).then(|| {
        ClassifiedRange::new(line_start + start, line_start + line.len(), classification)
    })
}

fn file_path(line_start: usize, line: &[u8]) -> Option<ClassifiedRange> {
    let mut start = PATH_INDENT.len();
    let rest = line.get(start..)?;
    if let Some(label_len) = change_label_len(rest) {
        start += label_len;
        let after_label = line.get(start..)?;
        start += after_label.iter().take_while(|&&byte| byte == b' ').count();
    }

    let path = line.get(start..)?;
    let len = path
        .iter()
        .position(|&byte| byte == b':')
        .unwrap_or(path.len());
    (len > 0).then(|| {
        ClassifiedRange::new(
            line_start + start,
            line_start + start + len,
            Classification::FilePath,
        )
    })
}

/// Length of a `label:` prefix, including the colon.
fn change_label_len(rest: &[u8]) -> Option<usize> {
    CHANGE_LABELS.iter().find_map(|label| {
        let bytes = label.as_bytes();
        let after = rest.strip_prefix(bytes)?;
        after.starts_with(b":").then_some(bytes.len() + 1)
    })
}
