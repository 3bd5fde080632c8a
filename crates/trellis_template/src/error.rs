//! Error types for layout compilation and execution.

use trellis_source::ResolvedSpan;

/// Errors produced while compiling layout source into an artifact.
///
/// Compilation errors are `Clone` so that every caller waiting on the same
/// in-flight compilation can receive its own copy of the failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompilationError {
    /// The layout source could not be read.
    #[error("failed to read layout source {path}: {reason}")]
    Io {
        /// Display name of the source that failed to load.
        path: String,
        /// The underlying I/O failure.
        reason: String,
    },

    /// The layout source is malformed.
    #[error("{location}: {message}")]
    Syntax {
        /// Where the problem starts.
        location: ResolvedSpan,
        /// What is wrong.
        message: String,
    },

    /// An include tag names a source that cannot be read.
    #[error("{location}: cannot include '{target}': {reason}")]
    UnresolvedInclude {
        /// Location of the include tag.
        location: ResolvedSpan,
        /// The include target as written.
        target: String,
        /// Why it could not be loaded.
        reason: String,
    },

    /// An include would re-enter a source that is already being compiled.
    #[error("{location}: include cycle: {chain}")]
    IncludeCycle {
        /// Location of the include tag that closes the cycle.
        location: ResolvedSpan,
        /// The sources involved, outermost first, joined by `->`.
        chain: String,
    },

    /// Includes are nested deeper than the compiler allows.
    #[error("{location}: includes nested deeper than {limit} levels")]
    IncludeDepth {
        /// Location of the include tag that exceeded the limit.
        location: ResolvedSpan,
        /// The configured nesting limit.
        limit: usize,
    },

    /// The compiled node tree could not be encoded for fingerprinting.
    #[error("cannot fingerprint compiled layout {origin}: {reason}")]
    Serialization {
        /// The layout being compiled.
        origin: String,
        /// Description of the encoding failure.
        reason: String,
    },
}

/// Errors produced while executing a compiled artifact.
///
/// Output already written to the sink before the failure stays written: sink
/// writes are append-only and best-effort, with no rollback.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// A variable required by the layout is absent from the data.
    #[error("missing variable '{path}' in layout {origin}")]
    MissingVariable {
        /// The dotted variable path.
        path: String,
        /// The layout being executed.
        origin: String,
    },

    /// A variable resolved to a value with no text form.
    #[error("variable '{path}' in layout {origin} is {kind} and cannot be rendered as text")]
    NotRenderable {
        /// The dotted variable path.
        path: String,
        /// The layout being executed.
        origin: String,
        /// The JSON kind found (`"an array"` or `"an object"`).
        kind: &'static str,
    },

    /// An `#each` block was given something other than an array.
    #[error("variable '{path}' in layout {origin} is {kind}, expected an array")]
    NotIterable {
        /// The dotted variable path.
        path: String,
        /// The layout being executed.
        origin: String,
        /// The JSON kind found.
        kind: &'static str,
    },

    /// The output sink rejected a write.
    #[error("failed to write rendered output: {0}")]
    Sink(#[from] std::io::Error),
}
