use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A point in source text, ESTree style: 1-based line, 0-based column.
///
/// Columns and `offset` (Babel calls it `index`) are counted in UTF-16 code
/// units, the way JavaScript strings index. [`Position::offset_in`] converts
/// them to byte offsets of the Rust source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    #[serde(default, alias = "index", skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column, offset: None }
    }

    pub fn with_offset(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset: Some(offset) }
    }

    /// Byte offset of this position in `source`, clamped to the source length.
    ///
    /// The explicit offset wins when present; otherwise the offset is
    /// recomputed from line and column. A column past the end of its line
    /// clamps to the line end.
    pub fn offset_in(&self, source: &str) -> usize {
        if let Some(offset) = self.offset {
            return utf16_to_byte(source, offset);
        }
        let mut line = 1;
        let mut line_start = 0;
        if self.line > 1 {
            for (i, b) in source.bytes().enumerate() {
                if b == b'\n' {
                    line += 1;
                    if line == self.line {
                        line_start = i + 1;
                        break;
                    }
                }
            }
            if line < self.line {
                return source.len();
            }
        }
        let rest = &source[line_start..];
        let line_text = &rest[..rest.find('\n').unwrap_or(rest.len())];
        line_start + utf16_to_byte(line_text, self.column)
    }
}

/// Byte offset of the char that starts `units` UTF-16 code units into `text`.
/// An offset that splits a surrogate pair rounds up to the next char.
fn utf16_to_byte(text: &str, units: usize) -> usize {
    let mut seen = 0;
    for (i, c) in text.char_indices() {
        if seen >= units {
            return i;
        }
        seen += c.len_utf16();
    }
    text.len()
}

/// Source location of a node: start and end positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loc {
    pub start: Position,
    pub end: Position,
}

impl Loc {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Single-line location from `start_col` to `end_col` on `line`.
    pub fn line(line: usize, start_col: usize, end_col: usize) -> Self {
        Self::new(Position::new(line, start_col), Position::new(line, end_col))
    }

    /// Byte range of this location in `source`; never inverted.
    pub fn byte_range(&self, source: &str) -> Range<usize> {
        let start = self.start.offset_in(source);
        let end = self.end.offset_in(source).max(start);
        start..end
    }
}
