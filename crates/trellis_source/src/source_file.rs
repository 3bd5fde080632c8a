//! A single source held in a [`SourceDb`](crate::SourceDb).

use crate::locator::Locator;

/// Layout text together with an index of where each line begins.
pub struct SourceFile {
    /// Where the text was read from.
    pub locator: Locator,
    /// The text as read.
    pub content: String,
    line_starts: Vec<u32>,
}

impl SourceFile {
    /// Indexes `content`, read from `locator`.
    pub fn new(locator: Locator, content: String) -> Self {
        let line_starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i as u32 + 1))
            .collect();
        Self {
            locator,
            content,
            line_starts,
        }
    }

    /// 1-indexed line and byte column of `offset`.
    pub fn position(&self, offset: u32) -> (u32, u32) {
        // line_starts[0] == 0, so at least one start is <= offset.
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let col = offset - self.line_starts[line - 1] + 1;
        (line as u32, col)
    }
}
