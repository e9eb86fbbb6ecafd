//! Mutable text model of one open document.
//!
//! All offsets are character offsets. The line index is maintained by the rope,
//! so every query after [`TextBuffer::apply`] sees the mutated text.

use std::ops::Range;

use ropey::Rope;

use crate::edit::EditKind;
use crate::error::{Result, SweebleError};

#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    rope: Rope,
}

impl TextBuffer {
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Replace the whole content, e.g. to resync with the live document.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }

    /// Zero-based line containing `offset`. `offset == len()` is the end of the last line.
    pub fn line_at(&self, offset: usize) -> Result<usize> {
        if offset > self.len() {
            return Err(SweebleError::out_of_range(offset, offset, self.len()));
        }
        Ok(self.rope.char_to_line(offset))
    }

    /// `[start, end)` of `line`, excluding its line terminator.
    pub fn line_bounds(&self, line: usize) -> Result<Range<usize>> {
        if line >= self.line_count() {
            return Err(SweebleError::LineOutOfRange {
                line,
                count: self.line_count(),
            });
        }
        let start = self.rope.line_to_char(line);
        let slice = self.rope.line(line);
        let mut content = slice.len_chars();
        if content > 0 && slice.char(content - 1) == '\n' {
            content -= 1;
        }
        if content > 0 && slice.char(content - 1) == '\r' {
            content -= 1;
        }
        Ok(start..start + content)
    }

    pub fn slice(&self, start: usize, end: usize) -> Result<String> {
        self.check_range(start, end)?;
        Ok(self.rope.slice(start..end).to_string())
    }

    /// Apply one primitive mutation.
    ///
    /// Replace removes `[start, end)` and inserts `new_text` at `start`; Insert requires
    /// `start == end`; Delete removes `[start, end)` and ignores `new_text`.
    pub fn apply(&mut self, kind: EditKind, start: usize, end: usize, new_text: &str) -> Result<()> {
        self.check_range(start, end)?;
        match kind {
            EditKind::Insert => {
                if start != end {
                    return Err(SweebleError::out_of_range(start, end, self.len()));
                }
                self.rope.insert(start, new_text);
            }
            EditKind::Replace => {
                self.rope.remove(start..end);
                self.rope.insert(start, new_text);
            }
            EditKind::Delete => {
                self.rope.remove(start..end);
            }
        }
        Ok(())
    }

    fn check_range(&self, start: usize, end: usize) -> Result<()> {
        if start > end || end > self.len() {
            return Err(SweebleError::out_of_range(start, end, self.len()));
        }
        Ok(())
    }
}

impl From<&str> for TextBuffer {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_queries() {
        let buffer = TextBuffer::new("fn main() {\n    let x = 1;\n}");
        assert_eq!(buffer.line_count(), 3);
        assert_eq!(buffer.line_at(0).unwrap(), 0);
        assert_eq!(buffer.line_at(12).unwrap(), 1);
        assert_eq!(buffer.line_at(buffer.len()).unwrap(), 2);
        assert_eq!(buffer.line_bounds(1).unwrap(), 12..26);
        assert_eq!(buffer.slice(16, 26).unwrap(), "let x = 1;");
    }

    #[test]
    fn test_line_bounds_strip_crlf() {
        let buffer = TextBuffer::new("a\r\nbc\r\n");
        assert_eq!(buffer.line_bounds(0).unwrap(), 0..1);
        assert_eq!(buffer.line_bounds(1).unwrap(), 3..5);
        assert!(matches!(
            buffer.line_bounds(5),
            Err(SweebleError::LineOutOfRange { line: 5, .. })
        ));
    }

    #[test]
    fn test_apply_each_kind() {
        let mut buffer = TextBuffer::new("hello world");
        buffer.apply(EditKind::Replace, 6, 11, "there").unwrap();
        assert_eq!(buffer.text(), "hello there");
        buffer.apply(EditKind::Insert, 5, 5, ",").unwrap();
        assert_eq!(buffer.text(), "hello, there");
        buffer.apply(EditKind::Delete, 0, 7, "ignored").unwrap();
        assert_eq!(buffer.text(), "there");
    }

    #[test]
    fn test_line_index_follows_mutation() {
        let mut buffer = TextBuffer::new("one\ntwo");
        buffer.apply(EditKind::Insert, 3, 3, "\nand a half").unwrap();
        assert_eq!(buffer.line_count(), 3);
        assert_eq!(buffer.line_bounds(2).unwrap(), 15..18);
        assert_eq!(buffer.line_at(16).unwrap(), 2);
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let mut buffer = TextBuffer::new("abc");
        assert!(matches!(
            buffer.apply(EditKind::Delete, 2, 9, ""),
            Err(SweebleError::OutOfRange { start: 2, end: 9, len: 3 })
        ));
        assert!(buffer.apply(EditKind::Replace, 2, 1, "x").is_err());
        assert!(buffer.apply(EditKind::Insert, 0, 1, "x").is_err());
        assert!(buffer.line_at(4).is_err());
        assert_eq!(buffer.text(), "abc");
    }

    #[test]
    fn test_offsets_are_characters() {
        let mut buffer = TextBuffer::new("héllo");
        assert_eq!(buffer.len(), 5);
        buffer.apply(EditKind::Replace, 1, 2, "e").unwrap();
        assert_eq!(buffer.text(), "hello");
    }
}
