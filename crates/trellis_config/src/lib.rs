//! Parsing and validation of `trellis.toml` engine configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`EngineConfig`] covering render defaults, cache bounds and the named
//! layouts a host can render.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE_NAME};
pub use resolve::{resolve_all, resolve_layout, ResolvedLayout};
pub use types::*;
