//! Page types and cache entry bookkeeping.
//!
//! A page is the unit of caching: one `(endpoint, page)` key maps to the
//! item list the remote source returned for it, plus the pagination
//! metadata that came with it.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Identifies one page of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey {
    pub endpoint: String,
    pub page: u32,
}

impl PageKey {
    pub fn new(endpoint: impl Into<String>, page: u32) -> Self {
        Self {
            endpoint: endpoint.into(),
            page,
        }
    }

    /// Key of the page after this one on the same endpoint.
    pub fn next(&self) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
            page: self.page + 1,
        }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.endpoint, self.page)
    }
}

/// Pagination metadata reported by the remote source.
///
/// Authoritative for boundary checks: valid pages are `1..=page_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMetadata {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(rename = "pages", alias = "pageCount", alias = "page_count")]
    pub page_count: u32,
}

impl PaginationMetadata {
    /// Whether `page` lies inside `[1, page_count]`.
    pub fn contains(&self, page: u32) -> bool {
        page >= 1 && page <= self.page_count
    }

    pub fn has_next(&self, page: u32) -> bool {
        page < self.page_count
    }
}

/// One fetched page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(rename = "posts", alias = "items")]
    pub items: Vec<T>,

    #[serde(default)]
    pub pagination: Option<PaginationMetadata>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: Option<PaginationMetadata>) -> Self {
        Self { items, pagination }
    }
}

/// A cached page with its timestamps.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub key: PageKey,
    pub payload: Page<T>,

    /// Drives TTL expiry.
    pub inserted_at: Instant,

    /// Drives least-recent-access eviction.
    pub last_accessed_at: Instant,

    /// Logical access clock. Orders entries whose `last_accessed_at`
    /// compare equal (coarse clocks, paused test time).
    pub access_tick: u64,
}

impl<T> CacheEntry<T> {
    pub fn new(key: PageKey, payload: Page<T>, now: Instant, tick: u64) -> Self {
        Self {
            key,
            payload,
            inserted_at: now,
            last_accessed_at: now,
            access_tick: tick,
        }
    }

    /// An entry is servable strictly before `inserted_at + ttl`.
    pub fn is_fresh(&self, now: Instant, ttl: std::time::Duration) -> bool {
        now.saturating_duration_since(self.inserted_at) < ttl
    }

    pub fn touch(&mut self, now: Instant, tick: u64) {
        self.last_accessed_at = now;
        self.access_tick = tick;
    }
}
