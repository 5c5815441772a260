//! Location primitives shared by every apivet crate.

use serde::{Deserialize, Serialize};

/// A unique identifier for a loaded source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub usize);

/// A position in source text.
///
/// `offset` is a byte offset from the start of the source; `row` and
/// `column` are 0-indexed. Columns count bytes from the start of the line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// Byte offset from start of source
    pub offset: usize,
    /// Row number (0-indexed)
    pub row: usize,
    /// Column number (0-indexed)
    pub column: usize,
}

impl Location {
    /// Position at the very start of a source.
    pub fn zero() -> Self {
        Location::default()
    }

    /// 1-indexed (line, column) pair for display.
    pub fn one_based(&self) -> (usize, usize) {
        (self.row + 1, self.column + 1)
    }
}

/// A half-open span in source text: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Location,
    pub end: Location,
}

impl Range {
    /// An empty range anchored at a single position.
    pub fn point(at: Location) -> Self {
        Range { start: at, end: at }
    }

    /// The byte length of the span.
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    /// True when the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The smallest range covering both `self` and `other`.
    pub fn cover(&self, other: &Range) -> Range {
        Range {
            start: if other.start < self.start { other.start } else { self.start },
            end: if other.end > self.end { other.end } else { self.end },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(offset: usize, row: usize, column: usize) -> Location {
        Location { offset, row, column }
    }

    #[test]
    fn test_location_ordering() {
        assert!(loc(0, 0, 0) < loc(5, 0, 5));
        assert!(loc(5, 0, 5) < loc(10, 1, 0));
    }

    #[test]
    fn test_one_based_display() {
        assert_eq!(loc(7, 1, 0).one_based(), (2, 1));
    }

    #[test]
    fn test_range_len() {
        let r = Range { start: loc(3, 0, 3), end: loc(9, 0, 9) };
        assert_eq!(r.len(), 6);
        assert!(!r.is_empty());
        assert!(Range::point(loc(3, 0, 3)).is_empty());
    }

    #[test]
    fn test_range_cover() {
        let a = Range { start: loc(3, 0, 3), end: loc(9, 0, 9) };
        let b = Range { start: loc(0, 0, 0), end: loc(5, 0, 5) };
        let c = a.cover(&b);
        assert_eq!(c.start, loc(0, 0, 0));
        assert_eq!(c.end, loc(9, 0, 9));
    }

    #[test]
    fn test_serialization_round_trip() {
        let r = Range { start: loc(0, 0, 0), end: loc(50, 2, 10) };
        let json = serde_json::to_string(&r).unwrap();
        let back: Range = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }
}
