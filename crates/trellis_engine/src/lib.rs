//! Layout rendering entry point.
//!
//! [`TemplateEngine`] picks a render path per call. Development renders
//! recompile from a development source every time and never touch the cache.
//! Production renders fetch the artifact for a layout name from a
//! [`TierCache`](trellis_cache::TierCache), compiling it on first use. Either
//! way the artifact is then executed against the caller's data and sink.
//!
//! The engine keeps no per-layout state of its own: the cache owns every
//! compiled artifact, so one engine can serve any number of concurrent
//! renders for the same or different layouts.

#![warn(missing_docs)]

pub mod engine;
pub mod error;

pub use engine::{RenderMode, TemplateEngine};
pub use error::RenderError;
