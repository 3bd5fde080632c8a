//! The compiler boundary and the default layout compiler.

use log::debug;
use trellis_source::{FileId, Locator, ResolvedSpan, SourceDb, Span};

use crate::artifact::CompiledArtifact;
use crate::ast::Node;
use crate::error::CompilationError;
use crate::lexer::lex;
use crate::parser::{IncludeResolver, Parser};

/// Default limit on how deeply includes may nest.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 32;

/// Turns layout source into a [`CompiledArtifact`].
///
/// Implementations must not cache: compiling the same unchanged source twice
/// reads it twice and yields behaviorally equivalent artifacts. Caching is the
/// job of the layer above.
pub trait Compiler: Send + Sync {
    /// Compiles the layout at `locator`.
    fn compile(&self, locator: &Locator) -> Result<CompiledArtifact, CompilationError>;
}

/// Compiler for the built-in `{{ … }}` layout grammar.
///
/// Includes are resolved relative to the including file and inlined, so the
/// resulting artifact is self-contained.
#[derive(Debug, Clone)]
pub struct DefaultCompiler {
    max_include_depth: usize,
}

impl DefaultCompiler {
    /// Creates a compiler with the default include depth limit.
    pub fn new() -> Self {
        Self {
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    /// Sets how deeply includes may nest.
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }
}

impl Default for DefaultCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler for DefaultCompiler {
    fn compile(&self, locator: &Locator) -> Result<CompiledArtifact, CompilationError> {
        let mut session = Session {
            db: SourceDb::new(),
            stack: Vec::new(),
            max_depth: self.max_include_depth,
        };
        let id = session.db.load(locator).map_err(|e| CompilationError::Io {
            path: locator.display_name(),
            reason: e.to_string(),
        })?;
        let nodes = session.compile_file(id)?;
        debug!(
            "compiled {} ({} source file(s))",
            locator.display_name(),
            session.db.len()
        );
        CompiledArtifact::new(locator.display_name(), nodes)
    }
}

/// State for one `compile` call: every source read so far and the chain of
/// files currently being compiled.
struct Session {
    db: SourceDb,
    stack: Vec<Locator>,
    max_depth: usize,
}

impl Session {
    fn compile_file(&mut self, id: FileId) -> Result<Vec<Node>, CompilationError> {
        let file = self.db.get_file(id);
        let source = file.content.clone();
        let locator = file.locator.clone();

        let tokens = lex(&source, id).map_err(|e| CompilationError::Syntax {
            location: self.db.resolve_span(e.span),
            message: e.message,
        })?;

        self.stack.push(locator);
        let result = Parser::new(&tokens, &source, self).parse();
        self.stack.pop();
        result
    }
}

impl IncludeResolver for Session {
    fn include(&mut self, target: &str, span: Span) -> Result<Vec<Node>, CompilationError> {
        let location = self.db.resolve_span(span);
        let Some(current) = self.stack.last() else {
            unreachable!("includes are only parsed while a file is on the stack");
        };
        let locator = current.resolve_relative(target);

        if self.stack.contains(&locator) {
            let chain = self
                .stack
                .iter()
                .chain(std::iter::once(&locator))
                .map(Locator::display_name)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(CompilationError::IncludeCycle { location, chain });
        }
        if self.stack.len() > self.max_depth {
            return Err(CompilationError::IncludeDepth {
                location,
                limit: self.max_depth,
            });
        }

        let id = self
            .db
            .load(&locator)
            .map_err(|e| CompilationError::UnresolvedInclude {
                location,
                target: target.to_string(),
                reason: e.to_string(),
            })?;
        self.compile_file(id)
    }

    fn locate(&self, span: Span) -> ResolvedSpan {
        self.db.resolve_span(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{DefaultExecutor, Executor};
    use std::path::Path;

    fn write(dir: &Path, name: &str, content: &str) -> Locator {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        Locator::file(path)
    }

    #[test]
    fn compiles_memory_source() {
        let artifact = DefaultCompiler::new()
            .compile(&Locator::memory("inline", "<h1>{{ title }}</h1>"))
            .unwrap();
        assert_eq!(artifact.origin(), "inline");
        assert_eq!(artifact.nodes().len(), 3);
    }

    #[test]
    fn recompiling_unchanged_source_renders_identically() {
        let dir = tempfile::tempdir().unwrap();
        let loc = write(
            dir.path(),
            "home.html",
            "{{#if a}}{{ b }}{{/if}}{{#each xs as x}}[{{ x }}]{{/each}}",
        );
        let compiler = DefaultCompiler::new();
        let first = compiler.compile(&loc).unwrap();
        let second = compiler.compile(&loc).unwrap();
        assert_eq!(first.id(), second.id());

        let data = match serde_json::json!({"a": true, "b": "Ann", "xs": [1, 2]}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        let executor = DefaultExecutor::default();
        let (mut out1, mut out2) = (Vec::new(), Vec::new());
        executor.execute(&first, &data, &mut out1).unwrap();
        executor.execute(&second, &data, &mut out2).unwrap();
        assert_eq!(out1, out2);
        assert_eq!(out1, b"Ann[1][2]");
    }

    #[test]
    fn edited_source_is_reread() {
        let dir = tempfile::tempdir().unwrap();
        let loc = write(dir.path(), "home.html", "v1");
        let compiler = DefaultCompiler::new();
        let first = compiler.compile(&loc).unwrap();
        write(dir.path(), "home.html", "v2");
        let second = compiler.compile(&loc).unwrap();
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn missing_root_is_io_error() {
        let err = DefaultCompiler::new()
            .compile(&Locator::file("/nonexistent/trellis/home.html"))
            .unwrap_err();
        assert!(matches!(err, CompilationError::Io { .. }));
    }

    #[test]
    fn includes_resolve_relative_to_includer() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "pages/partials/nav.html", "<nav>{{ user }}</nav>");
        let loc = write(dir.path(), "pages/home.html", "{{> partials/nav.html}}<main/>");
        let artifact = DefaultCompiler::new().compile(&loc).unwrap();
        match &artifact.nodes()[0] {
            Node::Include { target, body } => {
                assert_eq!(target, "partials/nav.html");
                assert_eq!(body.len(), 3);
            }
            other => panic!("expected include, got {other:?}"),
        }
    }

    #[test]
    fn missing_include_is_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let loc = write(dir.path(), "home.html", "line one\n  {{> nope.html}}");
        let err = DefaultCompiler::new().compile(&loc).unwrap_err();
        match err {
            CompilationError::UnresolvedInclude {
                location, target, ..
            } => {
                assert_eq!(target, "nope.html");
                assert_eq!((location.line, location.col), (2, 3));
            }
            other => panic!("expected unresolved include, got {other:?}"),
        }
    }

    #[test]
    fn include_cycle_detected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.html", "{{> b.html}}");
        write(dir.path(), "b.html", "{{> a.html}}");
        let err = DefaultCompiler::new()
            .compile(&Locator::file(dir.path().join("a.html")))
            .unwrap_err();
        match err {
            CompilationError::IncludeCycle { chain, .. } => {
                assert!(chain.contains("a.html -> "));
                assert_eq!(chain.matches("->").count(), 2);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn include_depth_limited() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            write(dir.path(), &format!("l{i}.html"), &format!("{{{{> l{}.html}}}}", i + 1));
        }
        write(dir.path(), "l5.html", "leaf");
        let loc = Locator::file(dir.path().join("l0.html"));

        assert!(DefaultCompiler::new().compile(&loc).is_ok());
        let err = DefaultCompiler::new()
            .with_max_include_depth(2)
            .compile(&loc)
            .unwrap_err();
        assert!(matches!(err, CompilationError::IncludeDepth { limit: 2, .. }));
    }

    #[test]
    fn syntax_error_in_include_points_at_included_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad.html", "ok\n{{#if x}}");
        let loc = write(dir.path(), "home.html", "{{> bad.html}}");
        match DefaultCompiler::new().compile(&loc).unwrap_err() {
            CompilationError::Syntax { location, .. } => {
                assert!(location.origin.ends_with("bad.html"));
                assert_eq!(location.line, 2);
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn lexer_errors_become_syntax_errors() {
        let err = DefaultCompiler::new()
            .compile(&Locator::memory("inline", "{{ open"))
            .unwrap_err();
        assert!(matches!(err, CompilationError::Syntax { .. }));
    }
}
