//! Error types for cache operations.

use trellis_template::CompilationError;

/// Errors surfaced by [`TierCache::get_or_compile`](crate::TierCache::get_or_compile).
///
/// Capacity is never an error: the cache makes room by evicting. A failure is
/// attributed to the key whose compilation produced it and otherwise carries
/// the compiler's error unchanged.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// The compiler rejected the layout.
    #[error("failed to compile layout '{key}': {source}")]
    Compile {
        /// The cache key whose compilation failed.
        key: String,
        /// The compiler's error.
        source: CompilationError,
    },

    /// The compiling thread panicked before publishing a result.
    #[error("compilation of layout '{key}' was abandoned before it completed")]
    Abandoned {
        /// The cache key whose compilation was abandoned.
        key: String,
    },
}

impl CacheError {
    /// Returns the key the failure is attributed to.
    pub fn key(&self) -> &str {
        match self {
            CacheError::Compile { key, .. } | CacheError::Abandoned { key } => key,
        }
    }
}
