//! Positions inside layout sources: file ids, byte spans and the resolved
//! `origin:line:col` form used in error messages.

use std::fmt;
use std::ops::Range;

/// Index of a source within the [`SourceDb`](crate::SourceDb) that issued it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct FileId(u32);

impl FileId {
    /// Wraps a raw index.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// A half-open byte range `start..end` in one source.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Span {
    /// Source the range belongs to.
    pub file: FileId,
    /// First byte.
    pub start: u32,
    /// One past the last byte.
    pub end: u32,
}

impl Span {
    /// Creates a span over `start..end` in `file`.
    pub fn new(file: FileId, start: u32, end: u32) -> Self {
        Self { file, start, end }
    }

    /// The byte range, for slicing the source text.
    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

/// Where a span starts, in terms a reader can find: the source's display
/// name plus a 1-indexed line and byte column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpan {
    /// A path, or the name of an in-memory source.
    pub origin: String,
    /// Line, counting from 1.
    pub line: u32,
    /// Column in bytes, counting from 1.
    pub col: u32,
}

impl fmt::Display for ResolvedSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.origin, self.line, self.col)
    }
}
