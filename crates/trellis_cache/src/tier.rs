//! Two-tier LRU storage with count and byte bounds.
//!
//! Both tiers are kept in recency order, least recently used first. New and
//! promoted entries enter the back of the fast tier. When the fast tier holds
//! more than its entry limit, its front entry is demoted to the back of the
//! overflow tier. When the overflow tier's accounted bytes exceed its limit,
//! entries are evicted from its front. Every overflow entry was last used
//! before every fast entry, so the overflow front is the least recently used
//! entry across both tiers.

use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use crate::config::CacheConfig;

/// Computes the accounted size of a value, in bytes.
pub type Weigher<V> = fn(&V) -> usize;

/// Which tier an entry is resident in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// The count-bounded tier.
    Fast,
    /// The byte-bounded tier.
    Overflow,
}

/// Two-tier LRU map from layout name to a shared value.
///
/// Not synchronized; [`TierCache`](crate::TierCache) provides locking.
pub struct TierStore<V> {
    fast: IndexMap<String, Arc<V>>,
    overflow: IndexMap<String, (Arc<V>, usize)>,
    overflow_bytes: usize,
    fast_limit: usize,
    overflow_limit: usize,
    weigher: Weigher<V>,
    demotions: u64,
    promotions: u64,
    evictions: u64,
}

impl<V> TierStore<V> {
    /// Creates an empty store with the given bounds and weigher.
    pub fn new(config: CacheConfig, weigher: Weigher<V>) -> Self {
        Self {
            fast: IndexMap::new(),
            overflow: IndexMap::new(),
            overflow_bytes: 0,
            fast_limit: config.fast_tier_entries,
            overflow_limit: config.overflow_tier_bytes.as_usize(),
            weigher,
            demotions: 0,
            promotions: 0,
            evictions: 0,
        }
    }

    /// Returns the value for `key`, marking it most recently used.
    ///
    /// An overflow entry is promoted back into the fast tier, which may in
    /// turn demote the fast tier's least recently used entry.
    pub fn get(&mut self, key: &str) -> Option<Arc<V>> {
        if let Some((k, value)) = self.fast.shift_remove_entry(key) {
            self.fast.insert(k, Arc::clone(&value));
            return Some(value);
        }
        let (k, (value, weight)) = self.overflow.shift_remove_entry(key)?;
        self.overflow_bytes -= weight;
        self.promotions += 1;
        debug!("promoted '{k}' to the fast tier");
        self.insert_fast(k, Arc::clone(&value));
        Some(value)
    }

    /// Returns the value for `key` without touching recency.
    pub fn peek(&self, key: &str) -> Option<&Arc<V>> {
        self.fast
            .get(key)
            .or_else(|| self.overflow.get(key).map(|(v, _)| v))
    }

    /// Inserts `value` as the most recently used entry.
    ///
    /// Any previous value under `key`, in either tier, is replaced.
    pub fn insert(&mut self, key: String, value: Arc<V>) {
        self.remove(&key);
        self.insert_fast(key, value);
    }

    /// Removes `key` from whichever tier holds it.
    pub fn remove(&mut self, key: &str) -> Option<Arc<V>> {
        if let Some(value) = self.fast.shift_remove(key) {
            return Some(value);
        }
        let (value, weight) = self.overflow.shift_remove(key)?;
        self.overflow_bytes -= weight;
        Some(value)
    }

    /// Removes every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.fast.clear();
        self.overflow.clear();
        self.overflow_bytes = 0;
    }

    /// Returns the tier holding `key`, if resident.
    pub fn tier_of(&self, key: &str) -> Option<Tier> {
        if self.fast.contains_key(key) {
            Some(Tier::Fast)
        } else if self.overflow.contains_key(key) {
            Some(Tier::Overflow)
        } else {
            None
        }
    }

    /// Returns the number of resident entries.
    pub fn len(&self) -> usize {
        self.fast.len() + self.overflow.len()
    }

    /// Returns `true` if nothing is resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of entries in the fast tier.
    pub fn fast_len(&self) -> usize {
        self.fast.len()
    }

    /// Returns the number of entries in the overflow tier.
    pub fn overflow_len(&self) -> usize {
        self.overflow.len()
    }

    /// Returns the accounted bytes held by the overflow tier.
    pub fn overflow_bytes(&self) -> usize {
        self.overflow_bytes
    }

    /// Returns the fast tier's keys, least recently used first.
    pub fn fast_keys(&self) -> impl Iterator<Item = &str> {
        self.fast.keys().map(String::as_str)
    }

    /// Returns the overflow tier's keys, least recently used first.
    pub fn overflow_keys(&self) -> impl Iterator<Item = &str> {
        self.overflow.keys().map(String::as_str)
    }

    /// Returns the number of demotions so far.
    pub fn demotions(&self) -> u64 {
        self.demotions
    }

    /// Returns the number of promotions so far.
    pub fn promotions(&self) -> u64 {
        self.promotions
    }

    /// Returns the number of evictions so far.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    fn insert_fast(&mut self, key: String, value: Arc<V>) {
        self.fast.insert(key, value);
        while self.fast.len() > self.fast_limit {
            let Some((key, value)) = self.fast.shift_remove_index(0) else {
                break;
            };
            self.demote(key, value);
        }
    }

    fn demote(&mut self, key: String, value: Arc<V>) {
        let weight = (self.weigher)(&value);
        debug!("demoted '{key}' to the overflow tier ({weight} bytes)");
        self.demotions += 1;
        self.overflow_bytes += weight;
        self.overflow.insert(key, (value, weight));

        while self.overflow_bytes > self.overflow_limit {
            let Some((key, (_, weight))) = self.overflow.shift_remove_index(0) else {
                break;
            };
            self.overflow_bytes -= weight;
            self.evictions += 1;
            debug!("evicted '{key}' ({weight} bytes)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_common::ByteSize;

    fn weigh(value: &usize) -> usize {
        *value
    }

    fn store(fast: usize, overflow: u64) -> TierStore<usize> {
        TierStore::new(
            CacheConfig {
                fast_tier_entries: fast,
                overflow_tier_bytes: ByteSize::b(overflow),
            },
            weigh,
        )
    }

    fn keys<'a>(it: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
        it.collect()
    }

    #[test]
    fn insert_and_get() {
        let mut s = store(2, 100);
        s.insert("a".into(), Arc::new(1));
        assert_eq!(s.get("a").as_deref(), Some(&1));
        assert!(s.get("missing").is_none());
        assert_eq!(s.tier_of("a"), Some(Tier::Fast));
    }

    #[test]
    fn overfilling_fast_tier_demotes_lru() {
        let mut s = store(2, 100);
        for k in ["a", "b", "c"] {
            s.insert(k.into(), Arc::new(10));
        }
        assert_eq!(keys(s.fast_keys()), vec!["b", "c"]);
        assert_eq!(keys(s.overflow_keys()), vec!["a"]);
        assert_eq!(s.overflow_bytes(), 10);
        assert_eq!(s.demotions(), 1);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn get_refreshes_recency() {
        let mut s = store(2, 100);
        s.insert("a".into(), Arc::new(1));
        s.insert("b".into(), Arc::new(1));
        s.get("a");
        s.insert("c".into(), Arc::new(1));
        assert_eq!(s.tier_of("b"), Some(Tier::Overflow));
        assert_eq!(s.tier_of("a"), Some(Tier::Fast));
    }

    #[test]
    fn get_promotes_from_overflow() {
        let mut s = store(1, 100);
        s.insert("a".into(), Arc::new(5));
        s.insert("b".into(), Arc::new(7));
        assert_eq!(s.tier_of("a"), Some(Tier::Overflow));

        assert_eq!(s.get("a").as_deref(), Some(&5));
        assert_eq!(s.tier_of("a"), Some(Tier::Fast));
        assert_eq!(s.tier_of("b"), Some(Tier::Overflow));
        assert_eq!(s.overflow_bytes(), 7);
        assert_eq!(s.promotions(), 1);
    }

    #[test]
    fn overflow_byte_bound_evicts_lru() {
        let mut s = store(1, 25);
        for k in ["a", "b", "c", "d"] {
            s.insert(k.into(), Arc::new(10));
        }
        // d is fast; a, b, c were demoted in that order, a evicted to fit 25 bytes.
        assert_eq!(keys(s.fast_keys()), vec!["d"]);
        assert_eq!(keys(s.overflow_keys()), vec!["b", "c"]);
        assert!(s.overflow_bytes() <= 25);
        assert_eq!(s.evictions(), 1);
        assert!(s.peek("a").is_none());
    }

    #[test]
    fn oversized_entry_is_evicted_on_demotion() {
        let mut s = store(1, 10);
        s.insert("huge".into(), Arc::new(1000));
        s.insert("next".into(), Arc::new(1));
        assert!(s.tier_of("huge").is_none());
        assert_eq!(s.overflow_bytes(), 0);
    }

    #[test]
    fn zero_overflow_means_demotion_evicts() {
        let mut s = store(1, 0);
        s.insert("a".into(), Arc::new(1));
        s.insert("b".into(), Arc::new(1));
        assert_eq!(s.len(), 1);
        assert_eq!(s.evictions(), 1);
    }

    #[test]
    fn reinsert_replaces_in_either_tier() {
        let mut s = store(1, 100);
        s.insert("a".into(), Arc::new(10));
        s.insert("b".into(), Arc::new(10));
        s.insert("a".into(), Arc::new(20));
        assert_eq!(s.len(), 2);
        assert_eq!(s.peek("a").map(|v| **v), Some(20));
        assert_eq!(s.tier_of("a"), Some(Tier::Fast));
        // b was demoted again by the reinsert of a; no stale copy of a remains.
        assert_eq!(keys(s.overflow_keys()), vec!["b"]);
        assert_eq!(s.overflow_bytes(), 10);
    }

    #[test]
    fn peek_does_not_promote() {
        let mut s = store(1, 100);
        s.insert("a".into(), Arc::new(1));
        s.insert("b".into(), Arc::new(1));
        assert!(s.peek("a").is_some());
        assert_eq!(s.tier_of("a"), Some(Tier::Overflow));
    }

    #[test]
    fn remove_and_clear() {
        let mut s = store(1, 100);
        s.insert("a".into(), Arc::new(4));
        s.insert("b".into(), Arc::new(4));
        assert_eq!(s.remove("a").as_deref(), Some(&4));
        assert_eq!(s.overflow_bytes(), 0);
        assert!(s.remove("a").is_none());
        s.clear();
        assert!(s.is_empty());
    }

    #[test]
    fn removed_value_outlives_store_entry() {
        let mut s = store(1, 0);
        s.insert("a".into(), Arc::new(42));
        let held = s.get("a").unwrap();
        s.insert("b".into(), Arc::new(1));
        assert!(s.peek("a").is_none());
        assert_eq!(*held, 42);
    }
}
