//! Addressable handles for layout sources.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a layout's source text lives.
///
/// A locator is cheap to clone and carries no cached content of its own for
/// file sources: every [`read`](Self::read) goes back to the filesystem, which
/// is what lets development renders pick up edits immediately.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// A layout file on disk.
    File(PathBuf),
    /// A layout held in memory under a display name.
    Memory {
        /// Name used in error locations.
        name: String,
        /// The layout source text.
        content: Arc<str>,
    },
}

impl Locator {
    /// Creates a locator for a file on disk.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Locator::File(path.into())
    }

    /// Creates a locator for an in-memory source.
    pub fn memory(name: impl Into<String>, content: impl Into<Arc<str>>) -> Self {
        Locator::Memory {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Reads the full source text.
    pub fn read(&self) -> io::Result<String> {
        match self {
            Locator::File(path) => std::fs::read_to_string(path),
            Locator::Memory { content, .. } => Ok(content.to_string()),
        }
    }

    /// Returns the name used for this source in diagnostics.
    pub fn display_name(&self) -> String {
        match self {
            Locator::File(path) => path.display().to_string(),
            Locator::Memory { name, .. } => name.clone(),
        }
    }

    /// Returns the filesystem path, if this is a file locator.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Locator::File(path) => Some(path),
            Locator::Memory { .. } => None,
        }
    }

    /// Resolves an include target written inside this source.
    ///
    /// File sources resolve relative to their own directory. In-memory sources
    /// have no directory, so their targets resolve against the working directory.
    pub fn resolve_relative(&self, target: &str) -> Locator {
        let target = Path::new(target);
        match self {
            Locator::File(path) if target.is_relative() => {
                let base = path.parent().unwrap_or_else(|| Path::new(""));
                Locator::File(base.join(target))
            }
            _ => Locator::File(target.to_path_buf()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::File(path) => write!(f, "Locator::File({})", path.display()),
            Locator::Memory { name, content } => {
                write!(f, "Locator::Memory({name}, {} bytes)", content.len())
            }
        }
    }
}

impl From<PathBuf> for Locator {
    fn from(path: PathBuf) -> Self {
        Locator::File(path)
    }
}

impl From<&Path> for Locator {
    fn from(path: &Path) -> Self {
        Locator::File(path.to_path_buf())
    }
}
