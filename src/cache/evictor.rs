//! Eviction policy: decides which cached pages to drop when the store is full.
//!
//! Victims are ordered by:
//! - Expiry (entries already past their TTL go first)
//! - Time since last access (least recently read goes next)
//!
//! Insertion time never matters for ordering: an old page that was just read
//! outlives a newer page nobody touched.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::page::{CacheEntry, PageKey};

/// An eviction candidate. Greater means evicted first.
#[derive(Debug, Clone)]
pub struct EvictionCandidate {
    pub key: PageKey,
    pub expired: bool,
    pub last_accessed_at: Instant,
    pub access_tick: u64,
}

impl PartialEq for EvictionCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EvictionCandidate {}

impl PartialOrd for EvictionCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EvictionCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.expired
            .cmp(&other.expired)
            .then_with(|| other.last_accessed_at.cmp(&self.last_accessed_at))
            .then_with(|| other.access_tick.cmp(&self.access_tick))
    }
}

/// The eviction policy engine.
#[derive(Debug, Clone)]
pub struct Evictor {
    ttl: Duration,
}

impl Evictor {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn candidate<T>(&self, entry: &CacheEntry<T>, now: Instant) -> EvictionCandidate {
        EvictionCandidate {
            key: entry.key.clone(),
            expired: !entry.is_fresh(now, self.ttl),
            last_accessed_at: entry.last_accessed_at,
            access_tick: entry.access_tick,
        }
    }

    /// Select up to `count` entries to evict, highest priority first.
    pub fn select_victims<'a, T: 'a>(
        &self,
        entries: impl Iterator<Item = &'a CacheEntry<T>>,
        count: usize,
        now: Instant,
    ) -> Vec<EvictionCandidate> {
        let mut heap: BinaryHeap<_> = entries.map(|entry| self.candidate(entry, now)).collect();

        let mut victims = Vec::with_capacity(count);
        for _ in 0..count {
            match heap.pop() {
                Some(candidate) => victims.push(candidate),
                None => break,
            }
        }
        victims
    }

    /// Keys of every entry already past its TTL.
    pub fn expired_keys<'a, T: 'a>(
        &self,
        entries: impl Iterator<Item = &'a CacheEntry<T>>,
        now: Instant,
    ) -> Vec<PageKey> {
        entries
            .filter(|entry| !entry.is_fresh(now, self.ttl))
            .map(|entry| entry.key.clone())
            .collect()
    }
}
