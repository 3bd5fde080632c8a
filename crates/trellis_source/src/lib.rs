//! Layout sources and positions within them.
//!
//! A [`Locator`] says where a layout's text lives. A [`SourceDb`] holds every
//! source read during one compilation, and turns byte [`Span`]s into
//! [`ResolvedSpan`] locations for error messages.

#![warn(missing_docs)]

pub mod locator;
pub mod source_db;
pub mod source_file;
pub mod span;

pub use locator::Locator;
pub use source_db::SourceDb;
pub use source_file::SourceFile;
pub use span::{FileId, ResolvedSpan, Span};
