//! Line iteration over raw buffer bytes.

use std::ops::Range;

/// Iterator over the byte ranges of each line, excluding the `\n` terminator.
///
/// A trailing newline does not produce an extra empty line, and an empty
/// buffer yields nothing.
#[derive(Debug, Clone)]
pub struct LineSpans<'a> {
    text: &'a [u8],
    offset: usize,
}

impl<'a> LineSpans<'a> {
    /// Creates an iterator over the lines of `text`.
    #[must_use]
    pub const fn new(text: &'a [u8]) -> Self {
        Self { text, offset: 0 }
    }
}

impl Iterator for LineSpans<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.text.get(self.offset..)?;
        if rest.is_empty() {
            return None;
        }
        let start = self.offset;
        match rest.iter().position(|&byte| byte == b'\n') {
            Some(newline) => {
                self.offset = start + newline + 1;
                Some(start..start + newline)
            }
            None => {
                self.offset = self.text.len();
                Some(start..self.text.len())
            }
        }
    }
}
