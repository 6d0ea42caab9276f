//! Prefetching: warms the next page of the current endpoint once a
//! foreground load settles, so forward navigation resolves from cache.
//!
//! The prefetcher only decides and fetches. It writes the store directly and
//! never touches visible paginator state; running it on the background lane
//! is the caller's job.

use tracing::debug;

use crate::cache::page::{PageKey, PaginationMetadata};
use crate::cache::store::{lock_cache, CacheStore, SharedCache};
use crate::config::PrefetchConfig;
use crate::error::FetchError;
use crate::fetch::source::PageSource;

/// The prefetcher decides which page to warm and warms it.
#[derive(Debug, Clone)]
pub struct Prefetcher {
    config: PrefetchConfig,
}

impl Prefetcher {
    pub fn new(config: PrefetchConfig) -> Self {
        Self { config }
    }

    /// The page worth warming after `current_page` settled, if any.
    ///
    /// Requires known metadata with a next page, and that page must not be
    /// cached already.
    pub fn plan<T: Clone>(
        &self,
        cache: &CacheStore<T>,
        endpoint: &str,
        current_page: u32,
        pagination: Option<&PaginationMetadata>,
    ) -> Option<PageKey> {
        if !self.config.enabled {
            return None;
        }
        let pagination = pagination?;
        if !pagination.has_next(current_page) {
            return None;
        }

        let key = PageKey::new(endpoint, current_page).next();
        if cache.contains(&key) {
            debug!(key = %key, "Next page already cached, skipping prefetch");
            return None;
        }
        Some(key)
    }

    /// Yield to pending work, then fetch `key` and store it.
    ///
    /// The result is written even if the page got cached some other way in
    /// the meantime. Returns the number of items warmed.
    pub async fn warm<S: PageSource>(
        &self,
        source: &S,
        cache: &SharedCache<S::Item>,
        key: &PageKey,
        page_size: u32,
    ) -> Result<usize, FetchError> {
        tokio::task::yield_now().await;
        let delay = self.config.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let page = source.fetch_page(&key.endpoint, key.page, page_size).await?;
        let items = page.items.len();
        lock_cache(cache).set(key.clone(), page);
        debug!(key = %key, items, "Prefetched page");
        Ok(items)
    }
}
