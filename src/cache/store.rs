//! Bounded, TTL-aware page store.
//!
//! The store:
//! - Serves a page only while it is younger than the TTL (expired entries are
//!   dropped lazily when read)
//! - Evicts the least recently accessed page when an insert would exceed capacity
//! - Keeps hit/miss/eviction accounting for monitoring
//!
//! Every operation completes without suspending, so a store shared between the
//! foreground path and the prefetcher never observes a half-applied update.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::evictor::Evictor;
use crate::cache::page::{CacheEntry, Page, PageKey};
use crate::config::CacheConfig;

/// Store usage statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of pages currently held.
    pub entries: usize,
    /// Capacity bound.
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped to make room.
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed.
    pub expirations: u64,
}

impl CacheStats {
    /// Hit ratio over all lookups (0.0 - 1.0).
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }
        self.hits as f64 / lookups as f64
    }
}

/// The page cache.
pub struct CacheStore<T> {
    entries: HashMap<PageKey, CacheEntry<T>>,
    capacity: usize,
    ttl: Duration,
    evictor: Evictor,

    /// Logical access clock, bumped on every insert and hit.
    tick: u64,
    stats: CacheStats,
}

impl<T: Clone> CacheStore<T> {
    /// Create a store holding at most `capacity` pages for `ttl` each.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity),
            capacity,
            ttl,
            evictor: Evictor::new(ttl),
            tick: 0,
            stats: CacheStats {
                capacity,
                ..Default::default()
            },
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, config.ttl())
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Look up a page. A hit refreshes the entry's access time; an expired
    /// entry is removed and reported as a miss.
    pub fn get(&mut self, key: &PageKey) -> Option<Page<T>> {
        let now = Instant::now();
        let fresh = match self.entries.get(key) {
            Some(entry) => entry.is_fresh(now, self.ttl),
            None => {
                self.stats.misses += 1;
                return None;
            }
        };

        if !fresh {
            self.entries.remove(key);
            self.stats.expirations += 1;
            self.stats.misses += 1;
            self.stats.entries = self.entries.len();
            debug!(key = %key, "Cached page expired");
            return None;
        }

        let tick = self.next_tick();
        self.stats.hits += 1;
        self.entries.get_mut(key).map(|entry| {
            entry.touch(now, tick);
            entry.payload.clone()
        })
    }

    /// Whether a fresh entry exists, without counting a lookup or touching
    /// its access time.
    pub fn contains(&self, key: &PageKey) -> bool {
        let now = Instant::now();
        self.entries
            .get(key)
            .is_some_and(|entry| entry.is_fresh(now, self.ttl))
    }

    /// Insert or overwrite a page with fresh timestamps, evicting the least
    /// recently accessed page first if the store is full.
    pub fn set(&mut self, key: PageKey, payload: Page<T>) {
        let now = Instant::now();

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            let excess = self.entries.len() + 1 - self.capacity;
            let victims = self.evictor.select_victims(self.entries.values(), excess, now);
            for victim in victims {
                self.entries.remove(&victim.key);
                if victim.expired {
                    self.stats.expirations += 1;
                } else {
                    self.stats.evictions += 1;
                }
                debug!(key = %victim.key, expired = victim.expired, "Evicted cached page");
            }
        }

        let tick = self.next_tick();
        self.entries
            .insert(key.clone(), CacheEntry::new(key, payload, now, tick));
        self.stats.entries = self.entries.len();
    }

    /// Explicitly invalidate one page.
    pub fn delete(&mut self, key: &PageKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.stats.entries = self.entries.len();
        removed
    }

    /// Drop every page.
    pub fn clear(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        self.stats.entries = 0;
        debug!(dropped, "Cleared page cache");
    }

    /// Drop every expired page now instead of waiting for a read.
    pub fn purge_expired(&mut self) -> usize {
        let expired = self.evictor.expired_keys(self.entries.values(), Instant::now());
        for key in &expired {
            self.entries.remove(key);
        }
        self.stats.expirations += expired.len() as u64;
        self.stats.entries = self.entries.len();
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store statistics for monitoring.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

/// Store handle shared by a paginator and its prefetcher.
pub type SharedCache<T> = Arc<Mutex<CacheStore<T>>>;

/// Create a new shareable store.
pub fn new_shared_cache<T: Clone>(config: &CacheConfig) -> SharedCache<T> {
    Arc::new(Mutex::new(CacheStore::from_config(config)))
}

/// Lock a shared store. Critical sections never suspend, so a poisoned lock
/// still guards a consistent store.
pub fn lock_cache<T>(cache: &SharedCache<T>) -> MutexGuard<'_, CacheStore<T>> {
    cache.lock().unwrap_or_else(|e| e.into_inner())
}
