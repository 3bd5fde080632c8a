//! Configuration types deserialized from `trellis.toml`.

use serde::Deserialize;
use std::collections::BTreeMap;
use trellis_common::ByteSize;

/// The top-level configuration parsed from `trellis.toml`.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Render defaults.
    #[serde(default)]
    pub engine: EngineSection,
    /// Cache enablement and bounds.
    #[serde(default)]
    pub cache: CacheSection,
    /// Named layouts, keyed by the name hosts render them under.
    #[serde(default)]
    pub layouts: BTreeMap<String, LayoutDef>,
}

/// The `[engine]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineSection {
    /// Whether hosts render in development mode unless told otherwise.
    #[serde(default)]
    pub dev_mode: bool,
    /// How a variable absent from the render data is handled.
    #[serde(default)]
    pub missing: MissingData,
}

/// Handling of variables absent from the render data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingData {
    /// Fail the render.
    #[default]
    Error,
    /// Render nothing for the variable.
    Empty,
}

/// The `[cache]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Whether production renders go through the cache at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Maximum number of entries in the fast tier.
    #[serde(default = "default_fast_tier_entries")]
    pub fast_tier_entries: usize,
    /// Maximum accounted size of the overflow tier, e.g. `"10MB"` or `1048576`.
    #[serde(default = "default_overflow_tier_size")]
    pub overflow_tier_size: ByteSize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            fast_tier_entries: default_fast_tier_entries(),
            overflow_tier_size: default_overflow_tier_size(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_fast_tier_entries() -> usize {
    10
}

fn default_overflow_tier_size() -> ByteSize {
    ByteSize::mib(10)
}

/// A `[layouts.<name>]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutDef {
    /// Path of the production source, relative to the configuration file.
    pub source: String,
    /// Optional path of a development source, used instead of `source` in
    /// development mode.
    #[serde(default)]
    pub dev_source: Option<String>,
}
