//! Cache counters and residency snapshot.

/// A snapshot of cache activity and residency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from a resident entry.
    pub hits: u64,
    /// Lookups that found no resident entry, including those that joined an
    /// in-flight compilation.
    pub misses: u64,
    /// Compilations started.
    pub compilations: u64,
    /// Compilations that failed or were abandoned.
    pub failures: u64,
    /// Entries moved from the fast tier to the overflow tier.
    pub demotions: u64,
    /// Entries moved from the overflow tier back to the fast tier.
    pub promotions: u64,
    /// Entries dropped to stay within bounds.
    pub evictions: u64,
    /// Entries currently in the fast tier.
    pub fast_entries: usize,
    /// Entries currently in the overflow tier.
    pub overflow_entries: usize,
    /// Accounted bytes currently in the overflow tier.
    pub overflow_bytes: usize,
    /// Number of times the cache has been cleared.
    pub epoch: u64,
}

impl CacheStats {
    /// Returns the number of resident entries across both tiers.
    pub fn entries(&self) -> usize {
        self.fast_entries + self.overflow_entries
    }

    /// Returns hits as a fraction of all lookups, or 0 when there were none.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_without_lookups_is_zero() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn hit_rate_and_entries() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            fast_entries: 2,
            overflow_entries: 5,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(stats.entries(), 7);
    }
}
