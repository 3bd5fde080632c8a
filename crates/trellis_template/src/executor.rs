//! The executor boundary and the default node-walking executor.

use std::io::Write;

use log::trace;
use serde_json::Value;

use crate::artifact::CompiledArtifact;
use crate::ast::{Node, Segment, VarPath};
use crate::error::ExecutionError;

/// Per-render data: top-level variable names mapped to JSON values.
pub type Data = serde_json::Map<String, Value>;

/// Walks a [`CompiledArtifact`] against per-call data, writing to a sink.
///
/// Implementations must not mutate the artifact and must keep no state keyed
/// by artifact between calls, so that any number of executions of the same
/// artifact can run concurrently. Output written before a failure stays in
/// the sink: writes are append-only and best-effort, with no rollback.
pub trait Executor: Send + Sync {
    /// Renders `artifact` with `data` into `sink`.
    fn execute(
        &self,
        artifact: &CompiledArtifact,
        data: &Data,
        sink: &mut dyn Write,
    ) -> Result<(), ExecutionError>;
}

/// What to do when a variable is absent from the data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Fail with [`ExecutionError::MissingVariable`] unless the tag has a default.
    #[default]
    Error,
    /// Render nothing.
    Empty,
}

/// Executor for the node set produced by [`DefaultCompiler`](crate::DefaultCompiler).
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExecutor {
    missing: MissingPolicy,
}

impl DefaultExecutor {
    /// Creates an executor with the given missing-variable policy.
    pub fn new(missing: MissingPolicy) -> Self {
        Self { missing }
    }
}

impl Executor for DefaultExecutor {
    fn execute(
        &self,
        artifact: &CompiledArtifact,
        data: &Data,
        sink: &mut dyn Write,
    ) -> Result<(), ExecutionError> {
        trace!("executing {} ({})", artifact.origin(), artifact.id());
        let mut walk = Walk {
            policy: self.missing,
            origin: artifact.origin(),
            data,
            bindings: Vec::new(),
            sink,
        };
        walk.nodes(artifact.nodes())?;
        walk.sink.flush()?;
        Ok(())
    }
}

/// Per-call traversal state. Loop bindings live here, never on the artifact.
struct Walk<'a, 's> {
    policy: MissingPolicy,
    origin: &'a str,
    data: &'a Data,
    bindings: Vec<(&'a str, &'a Value)>,
    sink: &'s mut dyn Write,
}

impl<'a> Walk<'a, '_> {
    fn nodes(&mut self, nodes: &'a [Node]) -> Result<(), ExecutionError> {
        for node in nodes {
            self.node(node)?;
        }
        Ok(())
    }

    fn node(&mut self, node: &'a Node) -> Result<(), ExecutionError> {
        match node {
            Node::Text(text) => self.sink.write_all(text.as_bytes())?,
            Node::Variable { path, default } => self.variable(path, default.as_deref())?,
            Node::If {
                condition,
                negated,
                then_branch,
                else_branch,
            } => {
                let holds = self.lookup(condition).is_some_and(truthy) != *negated;
                self.nodes(if holds { then_branch } else { else_branch })?;
            }
            Node::Each {
                items,
                binding,
                body,
            } => match self.lookup(items) {
                Some(Value::Array(elements)) => {
                    for element in elements {
                        self.bindings.push((binding.as_str(), element));
                        let result = self.nodes(body);
                        self.bindings.pop();
                        result?;
                    }
                }
                Some(Value::Null) => {}
                Some(other) => {
                    return Err(ExecutionError::NotIterable {
                        path: items.to_string(),
                        origin: self.origin.to_string(),
                        kind: kind_of(other),
                    })
                }
                None => self.missing(items)?,
            },
            Node::Include { body, .. } => self.nodes(body)?,
        }
        Ok(())
    }

    fn variable(&mut self, path: &VarPath, default: Option<&str>) -> Result<(), ExecutionError> {
        match (self.lookup(path), default) {
            (None | Some(Value::Null), Some(default)) => self.sink.write_all(default.as_bytes())?,
            (None, None) => self.missing(path)?,
            (Some(Value::Null), None) => {}
            (Some(Value::String(s)), _) => self.sink.write_all(s.as_bytes())?,
            (Some(Value::Number(n)), _) => write!(self.sink, "{n}")?,
            (Some(Value::Bool(b)), _) => write!(self.sink, "{b}")?,
            (Some(other @ (Value::Array(_) | Value::Object(_))), _) => {
                return Err(ExecutionError::NotRenderable {
                    path: path.to_string(),
                    origin: self.origin.to_string(),
                    kind: kind_of(other),
                })
            }
        }
        Ok(())
    }

    fn missing(&self, path: &VarPath) -> Result<(), ExecutionError> {
        match self.policy {
            MissingPolicy::Error => Err(ExecutionError::MissingVariable {
                path: path.to_string(),
                origin: self.origin.to_string(),
            }),
            MissingPolicy::Empty => Ok(()),
        }
    }

    /// Resolves a path against loop bindings (innermost first), then the data.
    fn lookup(&self, path: &VarPath) -> Option<&'a Value> {
        let root = path.root();
        let mut value = self
            .bindings
            .iter()
            .rev()
            .find(|(name, _)| *name == root)
            .map(|(_, v)| *v)
            .or_else(|| self.data.get(root))?;
        for seg in path.rest() {
            value = match (seg, value) {
                (Segment::Key(key), Value::Object(map)) => map.get(key)?,
                (Segment::Index(i), Value::Array(items)) => items.get(*i)?,
                (Segment::Index(i), Value::Object(map)) => map.get(&i.to_string())?,
                _ => return None,
            };
        }
        Some(value)
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{Compiler, DefaultCompiler};
    use serde_json::json;
    use std::io;
    use trellis_source::Locator;

    fn data(value: Value) -> Data {
        match value {
            Value::Object(map) => map,
            _ => panic!("test data must be an object"),
        }
    }

    fn render_with(policy: MissingPolicy, src: &str, value: Value) -> Result<String, ExecutionError> {
        let artifact = DefaultCompiler::new()
            .compile(&Locator::memory("test", src))
            .unwrap();
        let mut out = Vec::new();
        DefaultExecutor::new(policy).execute(&artifact, &data(value), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn render(src: &str, value: Value) -> Result<String, ExecutionError> {
        render_with(MissingPolicy::Error, src, value)
    }

    #[test]
    fn substitutes_scalars() {
        let out = render(
            "{{ s }} {{ n }} {{ f }} {{ b }} [{{ z }}]",
            json!({"s": "text", "n": 42, "f": 1.5, "b": true, "z": null}),
        )
        .unwrap();
        assert_eq!(out, "text 42 1.5 true []");
    }

    #[test]
    fn nested_paths_and_indexes() {
        let out = render(
            "{{ user.name }} lives in {{ user.addresses.1.city }}",
            json!({"user": {"name": "Ann", "addresses": [{"city": "Oslo"}, {"city": "Bergen"}]}}),
        )
        .unwrap();
        assert_eq!(out, "Ann lives in Bergen");
    }

    #[test]
    fn defaults_apply_to_missing_and_null() {
        let out = render(
            r#"{{ a | "A" }}/{{ b | "B" }}/{{ c | "C" }}"#,
            json!({"b": null, "c": "set"}),
        )
        .unwrap();
        assert_eq!(out, "A/B/set");
    }

    #[test]
    fn missing_variable_errors_by_default() {
        let err = render("Hello {{ name }}", json!({})).unwrap_err();
        match err {
            ExecutionError::MissingVariable { path, origin } => {
                assert_eq!(path, "name");
                assert_eq!(origin, "test");
            }
            other => panic!("expected missing variable, got {other:?}"),
        }
    }

    #[test]
    fn missing_variable_renders_empty_when_lenient() {
        let out = render_with(MissingPolicy::Empty, "[{{ name }}]", json!({})).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn conditionals_follow_truthiness() {
        let src = "{{#if v}}T{{else}}F{{/if}}";
        for (value, expected) in [
            (json!({"v": true}), "T"),
            (json!({"v": 1}), "T"),
            (json!({"v": "x"}), "T"),
            (json!({"v": [0]}), "T"),
            (json!({"v": false}), "F"),
            (json!({"v": 0}), "F"),
            (json!({"v": ""}), "F"),
            (json!({"v": []}), "F"),
            (json!({"v": {}}), "F"),
            (json!({"v": null}), "F"),
            (json!({}), "F"),
        ] {
            assert_eq!(render(src, value.clone()).unwrap(), expected, "for {value}");
        }
    }

    #[test]
    fn negated_conditional() {
        let out = render("{{#if !admin}}guest{{/if}}", json!({"admin": false})).unwrap();
        assert_eq!(out, "guest");
    }

    #[test]
    fn each_binds_elements_in_order() {
        let out = render(
            "<ul>{{#each items as item}}<li>{{ item.label }}</li>{{/each}}</ul>",
            json!({"items": [{"label": "a"}, {"label": "b"}, {"label": "c"}]}),
        )
        .unwrap();
        assert_eq!(out, "<ul><li>a</li><li>b</li><li>c</li></ul>");
    }

    #[test]
    fn inner_binding_shadows_outer_and_data() {
        let out = render(
            "{{#each rows as x}}{{#each x as x}}{{ x }}{{/each}};{{/each}}{{ x }}",
            json!({"rows": [[1, 2], [3]], "x": "top"}),
        )
        .unwrap();
        assert_eq!(out, "12;3;top");
    }

    #[test]
    fn each_over_null_renders_nothing() {
        assert_eq!(render("{{#each xs as x}}!{{/each}}", json!({"xs": null})).unwrap(), "");
    }

    #[test]
    fn each_over_scalar_errors() {
        let err = render("{{#each xs as x}}{{/each}}", json!({"xs": 3})).unwrap_err();
        assert!(matches!(err, ExecutionError::NotIterable { kind: "a number", .. }));
    }

    #[test]
    fn compound_value_is_not_renderable() {
        let err = render("{{ user }}", json!({"user": {"a": 1}})).unwrap_err();
        assert!(matches!(err, ExecutionError::NotRenderable { kind: "an object", .. }));
    }

    #[test]
    fn same_artifact_renders_different_data() {
        let artifact = DefaultCompiler::new()
            .compile(&Locator::memory("home", "Hi {{ name }}"))
            .unwrap();
        let exec = DefaultExecutor::default();
        let (mut a, mut b) = (Vec::new(), Vec::new());
        exec.execute(&artifact, &data(json!({"name": "Ann"})), &mut a)
            .unwrap();
        exec.execute(&artifact, &data(json!({"name": "Bo"})), &mut b)
            .unwrap();
        assert_eq!(a, b"Hi Ann");
        assert_eq!(b, b"Hi Bo");
    }

    struct FailingSink {
        accepted: Vec<u8>,
        budget: usize,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
            }
            self.budget -= 1;
            self.accepted.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn sink_failure_keeps_partial_output() {
        let artifact = DefaultCompiler::new()
            .compile(&Locator::memory("t", "one{{ x }}three"))
            .unwrap();
        let mut sink = FailingSink {
            accepted: Vec::new(),
            budget: 2,
        };
        let err = DefaultExecutor::default()
            .execute(&artifact, &data(json!({"x": "two"})), &mut sink)
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Sink(_)));
        assert_eq!(sink.accepted, b"onetwo");
    }
}
