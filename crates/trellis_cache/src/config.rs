//! Cache capacity settings.

use trellis_common::ByteSize;

/// Capacity bounds for a [`TierCache`](crate::TierCache).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries in the fast tier.
    pub fast_tier_entries: usize,
    /// Maximum accounted size of the overflow tier.
    pub overflow_tier_bytes: ByteSize,
}

impl CacheConfig {
    /// Default fast-tier entry count.
    pub const DEFAULT_FAST_TIER_ENTRIES: usize = 10;

    /// Default overflow-tier size.
    pub const DEFAULT_OVERFLOW_TIER_BYTES: ByteSize = ByteSize::mib(10);
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            fast_tier_entries: Self::DEFAULT_FAST_TIER_ENTRIES,
            overflow_tier_bytes: Self::DEFAULT_OVERFLOW_TIER_BYTES,
        }
    }
}
