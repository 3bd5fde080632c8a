//! Layout compilation and execution.
//!
//! A [`Compiler`] turns layout source into an immutable [`CompiledArtifact`];
//! an [`Executor`] walks that artifact against per-call [`Data`] and writes the
//! result to an output sink. The [`DefaultCompiler`] and [`DefaultExecutor`]
//! implement a small mustache-style grammar:
//!
//! - `{{ user.name }}` and `{{ title | "Untitled" }}` for variables
//! - `{{#if flag}} … {{else}} … {{/if}}` for conditionals
//! - `{{#each items as item}} … {{/each}}` for iteration
//! - `{{> partials/header.html}}` for includes, inlined at compile time
//! - `{{! comment }}` for comments

#![warn(missing_docs)]

pub mod artifact;
pub mod ast;
pub mod compiler;
pub mod error;
pub mod executor;
pub mod lexer;
mod parser;
pub mod token;

pub use artifact::{ArtifactId, CompiledArtifact};
pub use ast::{Node, Segment, VarPath};
pub use compiler::{Compiler, DefaultCompiler};
pub use error::{CompilationError, ExecutionError};
pub use executor::{Data, DefaultExecutor, Executor, MissingPolicy};
