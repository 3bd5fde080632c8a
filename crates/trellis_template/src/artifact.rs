//! The immutable compiled form of a layout.

use std::fmt;

use trellis_common::ContentHash;

use crate::ast::{weight_of, Node};
use crate::error::CompilationError;

/// Opaque identity of a compiled layout, derived from its node tree.
///
/// Compiling unchanged source twice yields equal ids. Caches key artifacts by
/// layout name, not by this id; it exists for equality checks and logging.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactId(ContentHash);

impl ArtifactId {
    /// Computes the id of a node tree from its bincode encoding.
    pub fn of(nodes: &[Node]) -> Result<Self, bincode::error::EncodeError> {
        let bytes = bincode::serde::encode_to_vec(nodes, bincode::config::standard())?;
        Ok(Self(ContentHash::from_bytes(&bytes)))
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.short())
    }
}

impl fmt::Debug for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArtifactId({})", self.0.short())
    }
}

/// A compiled layout.
///
/// Artifacts expose no mutating methods. Once built they are shared behind an
/// `Arc` by caches and any number of concurrent executions.
#[derive(Debug)]
pub struct CompiledArtifact {
    id: ArtifactId,
    origin: String,
    nodes: Vec<Node>,
    weight: usize,
}

impl CompiledArtifact {
    /// Builds an artifact from a compiled node tree.
    ///
    /// `origin` names the source the artifact was compiled from and is used in
    /// execution errors.
    pub fn new(origin: impl Into<String>, nodes: Vec<Node>) -> Result<Self, CompilationError> {
        let origin = origin.into();
        let id = ArtifactId::of(&nodes).map_err(|e| CompilationError::Serialization {
            origin: origin.clone(),
            reason: e.to_string(),
        })?;
        let weight = std::mem::size_of::<Self>() + origin.len() + weight_of(&nodes);
        Ok(Self {
            id,
            origin,
            nodes,
            weight,
        })
    }

    /// Returns the artifact's identity.
    pub fn id(&self) -> ArtifactId {
        self.id
    }

    /// Returns the name of the source this artifact was compiled from.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Returns the top-level nodes in render order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the approximate memory footprint in bytes.
    pub fn weight(&self) -> usize {
        self.weight
    }
}
