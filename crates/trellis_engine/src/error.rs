//! Error types for rendering.

use trellis_cache::CacheError;
use trellis_template::{CompilationError, ExecutionError};

/// Errors returned by [`TemplateEngine::render`](crate::TemplateEngine::render).
///
/// Compiler and executor errors are carried unchanged, tagged with the layout
/// name the render was for.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The layout could not be compiled.
    #[error("failed to compile layout '{layout}': {source}")]
    Compilation {
        /// The layout name.
        layout: String,
        /// The compiler's error.
        source: CompilationError,
    },

    /// The compilation this render was waiting on panicked.
    #[error("compilation of layout '{layout}' was abandoned")]
    Abandoned {
        /// The layout name.
        layout: String,
    },

    /// The compiled layout failed while executing.
    #[error("failed to render layout '{layout}': {source}")]
    Execution {
        /// The layout name.
        layout: String,
        /// The executor's error.
        source: ExecutionError,
    },
}

impl RenderError {
    /// Returns the layout name the failure is attributed to.
    pub fn layout(&self) -> &str {
        match self {
            RenderError::Compilation { layout, .. }
            | RenderError::Abandoned { layout }
            | RenderError::Execution { layout, .. } => layout,
        }
    }

    /// Returns `true` for failures raised before execution started.
    pub fn is_compilation(&self) -> bool {
        !matches!(self, RenderError::Execution { .. })
    }
}

impl From<CacheError> for RenderError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Compile { key, source } => RenderError::Compilation {
                layout: key,
                source,
            },
            CacheError::Abandoned { key } => RenderError::Abandoned { layout: key },
        }
    }
}
