//! Offset-to-position mapping.

use crate::location::{Location, Range};
use serde::{Deserialize, Serialize};

/// Converts flat byte offsets into (row, column) positions.
///
/// Scans the content once at construction to index line-break offsets;
/// lookups are then O(log n) binary searches over that index. Only the
/// index and total length are retained, not the content itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionMapper {
    /// Byte offsets of each `\n` in the source
    line_breaks: Vec<usize>,
    /// Total length of the source in bytes
    total_length: usize,
}

impl PositionMapper {
    pub fn new(content: &str) -> Self {
        let line_breaks = content
            .char_indices()
            .filter_map(|(idx, ch)| (ch == '\n').then_some(idx))
            .collect();

        PositionMapper {
            line_breaks,
            total_length: content.len(),
        }
    }

    /// Convert a byte offset to a [`Location`].
    ///
    /// Offsets past the end of the source clamp to the final position; a
    /// newline belongs to the line it terminates.
    pub fn location(&self, offset: usize) -> Location {
        let offset = offset.min(self.total_length);

        // line_breaks[i] is the position of the i-th newline, so line 0 is
        // [0, line_breaks[0]] and line i+1 starts at line_breaks[i] + 1.
        let row = match self.line_breaks.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx,
        };

        let line_start = if row == 0 { 0 } else { self.line_breaks[row - 1] + 1 };

        Location {
            offset,
            row,
            column: offset - line_start,
        }
    }

    /// Convert a byte span to a [`Range`].
    pub fn range(&self, offset: usize, len: usize) -> Range {
        Range {
            start: self.location(offset),
            end: self.location(offset + len),
        }
    }

    /// Total length of the source in bytes.
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Number of lines (a source with n newlines has n + 1 lines).
    pub fn line_count(&self) -> usize {
        self.line_breaks.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source() {
        let m = PositionMapper::new("");
        assert_eq!(m.total_length(), 0);
        assert_eq!(m.line_count(), 1);
        assert_eq!(m.location(0), Location { offset: 0, row: 0, column: 0 });
    }

    #[test]
    fn test_single_line() {
        let m = PositionMapper::new("hello world");
        assert_eq!(m.line_count(), 1);
        assert_eq!(m.location(6).column, 6);
        assert_eq!(m.location(6).row, 0);
    }

    #[test]
    fn test_multiple_lines() {
        let m = PositionMapper::new("line 1\nline 2\nline 3");
        assert_eq!(m.line_count(), 3);

        // The newline at offset 6 still belongs to row 0.
        assert_eq!(m.location(6), Location { offset: 6, row: 0, column: 6 });
        // Offset 7 starts row 1.
        assert_eq!(m.location(7), Location { offset: 7, row: 1, column: 0 });
        assert_eq!(m.location(14), Location { offset: 14, row: 2, column: 0 });
    }

    #[test]
    fn test_out_of_bounds_clamps() {
        let m = PositionMapper::new("hello");
        assert_eq!(m.location(100).offset, 5);
    }

    #[test]
    fn test_range() {
        let m = PositionMapper::new("a: 1\nb: false\n");
        let r = m.range(8, 5); // the "false" token
        assert_eq!(r.start, Location { offset: 8, row: 1, column: 3 });
        assert_eq!(r.end, Location { offset: 13, row: 1, column: 8 });
        assert_eq!(r.len(), 5);
    }

    #[test]
    fn test_consecutive_newlines() {
        let m = PositionMapper::new("a\n\n\nb");
        assert_eq!(m.line_count(), 4);
        assert_eq!(m.location(2).row, 1);
        assert_eq!(m.location(3).row, 2);
        assert_eq!(m.location(4).row, 3);
    }

    #[test]
    fn test_multibyte_content_uses_byte_offsets() {
        // "café" is 5 bytes, so the second line starts at byte offset 6.
        let m = PositionMapper::new("café\nwörld");
        assert_eq!(m.location(6).row, 1);
        assert_eq!(m.location(6).column, 0);
    }
}
