//! Process-local cache of compiled layouts.
//!
//! [`TierStore`] is the plain two-tier LRU structure: a fast tier bounded by
//! entry count that overflows into a tier bounded by accounted bytes.
//! [`TierCache`] wraps it for concurrent use and guarantees that concurrent
//! misses on one key trigger a single compilation.

#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod error;
pub mod stats;
pub mod tier;

pub use cache::TierCache;
pub use config::CacheConfig;
pub use error::CacheError;
pub use stats::CacheStats;
pub use tier::{Tier, TierStore, Weigher};
