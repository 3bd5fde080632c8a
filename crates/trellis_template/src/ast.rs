//! Node tree of a compiled layout.

use std::fmt;
use std::mem::size_of;

use serde::Serialize;

/// One step of a variable path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Segment {
    /// An object key.
    Key(String),
    /// An array index.
    Index(usize),
}

/// A dotted variable path such as `user.addresses.0.city`.
///
/// The first segment is always a [`Segment::Key`], naming either a loop
/// binding or a top-level data entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct VarPath {
    segments: Vec<Segment>,
}

impl VarPath {
    /// Creates a path from its segments.
    ///
    /// Returns `None` if `segments` is empty or does not start with a key.
    pub fn new(segments: Vec<Segment>) -> Option<Self> {
        match segments.first() {
            Some(Segment::Key(_)) => Some(Self { segments }),
            _ => None,
        }
    }

    /// Returns the name of the first segment.
    pub fn root(&self) -> &str {
        match &self.segments[0] {
            Segment::Key(key) => key,
            Segment::Index(_) => unreachable!("VarPath::new rejects leading indexes"),
        }
    }

    /// Returns the segments after the root.
    pub fn rest(&self) -> &[Segment] {
        &self.segments[1..]
    }

}

impl fmt::Display for VarPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match seg {
                Segment::Key(key) => f.write_str(key)?,
                Segment::Index(idx) => write!(f, "{idx}")?,
            }
        }
        Ok(())
    }
}

/// A node of a compiled layout.
///
/// The set of variants is closed; executors dispatch on it with a `match`.
/// Children are stored in declared order, which is the order they render in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Node {
    /// Literal text.
    Text(String),
    /// A variable substitution with an optional literal fallback.
    Variable {
        /// The variable to look up.
        path: VarPath,
        /// Text used when the variable is missing or null.
        default: Option<String>,
    },
    /// A conditional block.
    If {
        /// The variable whose truthiness decides the branch.
        condition: VarPath,
        /// Whether the condition is inverted (`{{#if !x}}`).
        negated: bool,
        /// Rendered when the condition holds.
        then_branch: Vec<Node>,
        /// Rendered otherwise.
        else_branch: Vec<Node>,
    },
    /// A loop over an array.
    Each {
        /// The array to iterate.
        items: VarPath,
        /// Name each element is bound to inside the body.
        binding: String,
        /// Rendered once per element.
        body: Vec<Node>,
    },
    /// An inlined include.
    Include {
        /// The include target as written in the source.
        target: String,
        /// The included layout's nodes.
        body: Vec<Node>,
    },
}

impl Node {
    /// Approximate heap and inline footprint of this node and its children, in bytes.
    pub fn weight(&self) -> usize {
        let own = size_of::<Node>();
        match self {
            Node::Text(text) => own + text.len(),
            Node::Variable { path, default } => {
                own + path_weight(path) + default.as_ref().map_or(0, String::len)
            }
            Node::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => own + path_weight(condition) + weight_of(then_branch) + weight_of(else_branch),
            Node::Each {
                items,
                binding,
                body,
            } => own + path_weight(items) + binding.len() + weight_of(body),
            Node::Include { target, body } => own + target.len() + weight_of(body),
        }
    }
}

/// Sums [`Node::weight`] over a node list.
pub fn weight_of(nodes: &[Node]) -> usize {
    nodes.iter().map(Node::weight).sum()
}

fn path_weight(path: &VarPath) -> usize {
    path.segments
        .iter()
        .map(|s| match s {
            Segment::Key(k) => size_of::<Segment>() + k.len(),
            Segment::Index(_) => size_of::<Segment>(),
        })
        .sum()
}
