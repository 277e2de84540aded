use std::{
    cmp::min,
    fmt::Display,
    ops::{Index, Range},
};

/// Represents an area within source text.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub struct Region {
    /// The beginning of the range, inclusive.
    pub begin: usize,
    /// The ending of the range, exclusive.
    pub end: usize,
}

impl Region {
    /// Create a new Region from the given range.
    pub fn new(position: Range<usize>) -> Self {
        Self {
            begin: position.start,
            end: position.end,
        }
    }

    /// Access the literal value of a [`Region`].
    ///
    /// Returns an empty string when the `Region` is out of bounds in the given
    /// source text.
    pub fn literal<'source>(&self, source: &'source str) -> &'source str {
        source.get(self.begin..self.end).unwrap_or_default()
    }

    /// Return the [`Position`] at which this [`Region`] begins.
    pub fn position(&self, source: &str) -> Position {
        Position::locate(source, self.begin)
    }
}

impl Index<Region> for str {
    type Output = str;

    fn index(&self, region: Region) -> &Self::Output {
        let Region { begin, end } = region;

        &self[begin..end]
    }
}

impl From<Range<usize>> for Region {
    fn from(value: Range<usize>) -> Self {
        Self {
            begin: value.start,
            end: value.end,
        }
    }
}

/// A line and column within source text.
///
/// Both numbers are one indexed. The column counts characters, not bytes.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Create a new [`Position`].
    #[inline]
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Return the [`Position`] of the given byte offset within source.
    ///
    /// Offsets past the end of source are clamped to the end.
    pub fn locate(source: &str, offset: usize) -> Self {
        let mut offset = min(offset, source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_begin = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_begin..].chars().count() + 1;

        Self { line, column }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
