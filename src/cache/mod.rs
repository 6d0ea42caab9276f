//! Page cache management.
//!
//! This module contains the cache data structures and algorithms:
//! - [`page`]: PageKey, Page, PaginationMetadata, CacheEntry definitions
//! - [`store`]: Bounded TTL store with least-recent-access eviction
//! - [`evictor`]: Eviction victim ordering
//! - [`prefetcher`]: Next-page warming

pub mod evictor;
pub mod page;
pub mod prefetcher;
pub mod store;
