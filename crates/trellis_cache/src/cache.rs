//! Concurrent cache front-end with single-flight compilation.
//!
//! A [`TierCache`] owns a [`TierStore`] of compiled artifacts behind one
//! mutex. The lock is held only for bookkeeping: lookups, recency updates and
//! inserts. Compilation runs outside the lock. Concurrent misses on the same
//! key find the first caller's in-flight record and block on it until the
//! result is published, so each key is compiled at most once per miss.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};
use trellis_source::Locator;
use trellis_template::{CompiledArtifact, Compiler};

use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::stats::CacheStats;
use crate::tier::{Tier, TierStore, Weigher};

type Outcome = Result<Arc<CompiledArtifact>, CacheError>;

/// Thread-safe two-tier cache of compiled layouts, keyed by layout name.
///
/// Artifacts are handed out as `Arc`s, so an entry evicted while a render is
/// still using it stays alive until the last holder drops it.
pub struct TierCache {
    config: CacheConfig,
    state: Mutex<State>,
}

struct State {
    store: TierStore<CompiledArtifact>,
    in_flight: HashMap<String, Arc<Flight>>,
    hits: u64,
    misses: u64,
    compilations: u64,
    failures: u64,
    epoch: u64,
}

/// A compilation in progress. Waiters block on `done` until `outcome` is set.
struct Flight {
    outcome: Mutex<Option<Outcome>>,
    done: Condvar,
}

impl Flight {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn publish(&self, outcome: Outcome) {
        let mut slot = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(outcome);
        self.done.notify_all();
    }

    fn wait(&self) -> Outcome {
        let mut slot = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(outcome) = slot.as_ref() {
                return outcome.clone();
            }
            slot = self
                .done
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Publishes the compiling caller's result. If the caller unwinds before
/// finishing, waiters are released with [`CacheError::Abandoned`].
struct FlightGuard<'a> {
    cache: &'a TierCache,
    key: &'a str,
    flight: Arc<Flight>,
    finished: bool,
}

impl FlightGuard<'_> {
    fn finish(&mut self, outcome: Outcome) {
        self.finished = true;
        {
            let mut state = self.cache.lock();
            if state
                .in_flight
                .get(self.key)
                .is_some_and(|f| Arc::ptr_eq(f, &self.flight))
            {
                state.in_flight.remove(self.key);
            }
            match &outcome {
                Ok(artifact) => {
                    debug!("cached '{}' as {}", self.key, artifact.id());
                    state.store.insert(self.key.to_string(), Arc::clone(artifact));
                }
                Err(err) => {
                    warn!("{err}");
                    state.failures += 1;
                }
            }
        }
        self.flight.publish(outcome);
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.finish(Err(CacheError::Abandoned {
                key: self.key.to_string(),
            }));
        }
    }
}

fn artifact_weight(artifact: &CompiledArtifact) -> usize {
    artifact.weight()
}

impl TierCache {
    /// Creates an empty cache that weighs artifacts by
    /// [`CompiledArtifact::weight`].
    pub fn new(config: CacheConfig) -> Self {
        Self::with_weigher(config, artifact_weight)
    }

    /// Creates an empty cache with a custom size function for the overflow
    /// tier.
    pub fn with_weigher(config: CacheConfig, weigher: Weigher<CompiledArtifact>) -> Self {
        Self {
            config,
            state: Mutex::new(State {
                store: TierStore::new(config, weigher),
                in_flight: HashMap::new(),
                hits: 0,
                misses: 0,
                compilations: 0,
                failures: 0,
                epoch: 0,
            }),
        }
    }

    /// Returns the artifact cached under `key`, compiling `locator` on a miss.
    ///
    /// Only one caller compiles a given key at a time; other callers missing
    /// on that key wait for its result. A successful result is inserted into
    /// the fast tier before any waiter is released. A failure is returned to
    /// the compiling caller and every waiter, and nothing is inserted, so the
    /// next call retries.
    pub fn get_or_compile(
        &self,
        key: &str,
        locator: &Locator,
        compiler: &dyn Compiler,
    ) -> Result<Arc<CompiledArtifact>, CacheError> {
        let flight = {
            let mut state = self.lock();
            if let Some(artifact) = state.store.get(key) {
                state.hits += 1;
                debug!("cache hit for '{key}'");
                return Ok(artifact);
            }
            state.misses += 1;
            if let Some(flight) = state.in_flight.get(key) {
                let flight = Arc::clone(flight);
                drop(state);
                debug!("waiting on in-flight compilation of '{key}'");
                return flight.wait();
            }
            let flight = Arc::new(Flight::new());
            state.in_flight.insert(key.to_string(), Arc::clone(&flight));
            state.compilations += 1;
            flight
        };

        let mut guard = FlightGuard {
            cache: self,
            key,
            flight,
            finished: false,
        };
        debug!("cache miss for '{key}', compiling {locator}");
        let outcome = compiler
            .compile(locator)
            .map(Arc::new)
            .map_err(|source| CacheError::Compile {
                key: key.to_string(),
                source,
            });
        guard.finish(outcome.clone());
        outcome
    }

    /// Drops the entry for `key`. Returns `true` if it was resident.
    ///
    /// A compilation already in flight for `key` still publishes its result.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = self.lock().store.remove(key).is_some();
        if removed {
            debug!("invalidated '{key}'");
        }
        removed
    }

    /// Drops every entry and starts a new epoch.
    ///
    /// Compilations already in flight are not cancelled. Callers that miss
    /// after the clear join them, and their artifacts are inserted into the
    /// new epoch when they finish.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.store.clear();
        state.epoch += 1;
        debug!("cleared cache, epoch {}", state.epoch);
    }

    /// Returns `true` if `key` is resident. Does not affect recency.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().store.peek(key).is_some()
    }

    /// Returns the tier holding `key`, if resident.
    pub fn tier_of(&self, key: &str) -> Option<Tier> {
        self.lock().store.tier_of(key)
    }

    /// Returns the number of resident entries.
    pub fn len(&self) -> usize {
        self.lock().store.len()
    }

    /// Returns `true` if nothing is resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the capacity bounds this cache was built with.
    pub fn config(&self) -> CacheConfig {
        self.config
    }

    /// Returns a snapshot of counters and residency.
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            compilations: state.compilations,
            failures: state.failures,
            demotions: state.store.demotions(),
            promotions: state.store.promotions(),
            evictions: state.store.evictions(),
            fast_entries: state.store.fast_len(),
            overflow_entries: state.store.overflow_len(),
            overflow_bytes: state.store.overflow_bytes(),
            epoch: state.epoch,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TierCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
