//! Per-compilation database of layout sources.

use crate::locator::Locator;
use crate::source_file::SourceFile;
use crate::span::{FileId, ResolvedSpan, Span};
use std::io;

/// Every source read while compiling one layout: the root and its includes.
///
/// A fresh database is built per compilation, so nothing read here outlives
/// the compile call or is shared between compilations.
#[derive(Default)]
pub struct SourceDb {
    files: Vec<SourceFile>,
}

impl SourceDb {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the source behind `locator` and registers it.
    pub fn load(&mut self, locator: &Locator) -> io::Result<FileId> {
        let content = locator.read()?;
        Ok(self.add_source(locator.clone(), content))
    }

    /// Registers text that has already been read.
    pub fn add_source(&mut self, locator: Locator, content: String) -> FileId {
        let id = FileId::from_raw(self.files.len() as u32);
        self.files.push(SourceFile::new(locator, content));
        id
    }

    /// Returns a registered source.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different database.
    pub fn get_file(&self, id: FileId) -> &SourceFile {
        &self.files[id.as_raw() as usize]
    }

    /// Turns the start of `span` into an `origin:line:col` location.
    pub fn resolve_span(&self, span: Span) -> ResolvedSpan {
        let file = self.get_file(span.file);
        let (line, col) = file.position(span.start);
        ResolvedSpan {
            origin: file.locator.display_name(),
            line,
            col,
        }
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
