//! Paginator: bridges navigation intents to cache lookups and fetches.
//!
//! The paginator:
//! 1. Owns the visible [`PaginatorState`] and publishes every change on a
//!    watch channel
//! 2. Serves pages from the [`CacheStore`](crate::cache::store::CacheStore)
//!    when fresh, otherwise issues a foreground fetch
//! 3. Lets only the latest foreground fetch mutate state
//! 4. Keeps the previous endpoint's items on screen while a new endpoint loads
//! 5. Hands off to the [`Prefetcher`] after every settled load
//!
//! All state transitions happen under one short, non-suspending lock; the
//! only suspension points are the fetches themselves, which run in spawned
//! tasks and re-validate their ticket before touching state.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::cache::page::{Page, PageKey};
use crate::cache::prefetcher::Prefetcher;
use crate::cache::store::{lock_cache, new_shared_cache, CacheStats, SharedCache};
use crate::config::{CacheConfig, Config, PrefetchConfig};
use crate::error::FetchError;
use crate::fetch::coordinator::{Lane, LaneStats, Outcome, RequestCoordinator, TicketId};
use crate::fetch::source::PageSource;
use crate::paginator::state::PaginatorState;

/// Applied to raw cached items before they become visible.
pub type ItemTransform<T> = Arc<dyn Fn(Vec<T>) -> Vec<T> + Send + Sync>;

/// Called with every foreground failure that reaches visible state.
pub type ErrorHook = Arc<dyn Fn(&FetchError) + Send + Sync>;

/// Why a load was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadMode {
    Navigate,
    Refresh,
    SwitchEndpoint,
}

struct Session<T> {
    endpoint: String,
    state: PaginatorState<T>,
}

struct Shared<S: PageSource> {
    source: Arc<S>,
    cache: SharedCache<S::Item>,
    coordinator: RequestCoordinator,
    prefetcher: Prefetcher,
    page_size: u32,
    transform: Option<ItemTransform<S::Item>>,
    on_error: Option<ErrorHook>,
    session: Mutex<Session<S::Item>>,
    state_tx: watch::Sender<PaginatorState<S::Item>>,
}

/// Configures and opens a [`Paginator`].
pub struct PaginatorBuilder<S: PageSource> {
    source: Arc<S>,
    endpoint: String,
    page_size: u32,
    cache_config: CacheConfig,
    prefetch: PrefetchConfig,
    cache: Option<SharedCache<S::Item>>,
    transform: Option<ItemTransform<S::Item>>,
    on_error: Option<ErrorHook>,
}

impl<S: PageSource> PaginatorBuilder<S> {
    pub fn new(source: Arc<S>, endpoint: impl Into<String>) -> Self {
        let defaults = Config::default();
        Self {
            source,
            endpoint: endpoint.into(),
            page_size: defaults.paginator.page_size,
            cache_config: defaults.cache,
            prefetch: defaults.prefetch,
            cache: None,
            transform: None,
            on_error: None,
        }
    }

    /// Take page size, cache bounds and prefetch pacing from `config`.
    pub fn config(mut self, config: &Config) -> Self {
        self.page_size = config.paginator.page_size;
        self.cache_config = config.cache.clone();
        self.prefetch = config.prefetch.clone();
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn prefetch(mut self, prefetch: PrefetchConfig) -> Self {
        self.prefetch = prefetch;
        self
    }

    /// Use an existing store instead of creating one from the cache config.
    pub fn cache(mut self, cache: SharedCache<S::Item>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn transform(mut self, transform: impl Fn(Vec<S::Item>) -> Vec<S::Item> + Send + Sync + 'static) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn on_error(mut self, hook: impl Fn(&FetchError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Create the paginator and start loading page 1.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(self) -> Paginator<S> {
        let cache = self
            .cache
            .unwrap_or_else(|| new_shared_cache(&self.cache_config));
        let (state_tx, _) = watch::channel(PaginatorState::default());

        let shared = Arc::new(Shared {
            source: self.source,
            cache,
            coordinator: RequestCoordinator::new(),
            prefetcher: Prefetcher::new(self.prefetch),
            page_size: self.page_size,
            transform: self.transform,
            on_error: self.on_error,
            session: Mutex::new(Session {
                endpoint: self.endpoint,
                state: PaginatorState::default(),
            }),
            state_tx,
        });

        {
            let mut session = shared.lock_session();
            info!(endpoint = %session.endpoint, page_size = shared.page_size, "Opening paginator");
            shared.load(&mut session, LoadMode::Navigate);
        }

        Paginator { shared }
    }
}

/// Paged view over one endpoint of a [`PageSource`].
///
/// Cheap to clone; clones drive the same session.
pub struct Paginator<S: PageSource> {
    shared: Arc<Shared<S>>,
}

impl<S: PageSource> Clone for Paginator<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: PageSource> Paginator<S> {
    pub fn builder(source: S, endpoint: impl Into<String>) -> PaginatorBuilder<S> {
        PaginatorBuilder::new(Arc::new(source), endpoint)
    }

    /// Open a paginator on `endpoint` with settings from `config`.
    pub fn open(source: S, endpoint: impl Into<String>, config: &Config) -> Self {
        Self::builder(source, endpoint).config(config).open()
    }

    /// Current state snapshot.
    pub fn state(&self) -> PaginatorState<S::Item> {
        self.shared.state_tx.borrow().clone()
    }

    /// Observe every published state.
    pub fn subscribe(&self) -> watch::Receiver<PaginatorState<S::Item>> {
        self.shared.state_tx.subscribe()
    }

    pub fn endpoint(&self) -> String {
        self.shared.lock_session().endpoint.clone()
    }

    pub fn page_size(&self) -> u32 {
        self.shared.page_size
    }

    /// Navigate to `page`.
    ///
    /// No-op (returns false) for the current page, for page 0, and for pages
    /// past the known page count.
    pub fn go_to_page(&self, page: u32) -> bool {
        let shared = &self.shared;
        let mut session = shared.lock_session();
        let state = &session.state;

        if page == state.current_page || page < 1 {
            return false;
        }
        // While stale, the metadata on screen belongs to the previous endpoint.
        if let Some(pagination) = state.pagination.filter(|_| !state.is_stale) {
            if !pagination.contains(page) {
                debug!(page, page_count = pagination.page_count, "Page out of range");
                return false;
            }
        }

        info!(endpoint = %session.endpoint, from = state.current_page, to = page, "Navigating");
        session.state.current_page = page;
        shared.load(&mut session, LoadMode::Navigate);
        true
    }

    /// Drop the current page from the cache and fetch it again.
    pub fn refresh(&self) {
        let shared = &self.shared;
        let mut session = shared.lock_session();
        let key = PageKey::new(session.endpoint.as_str(), session.state.current_page);
        lock_cache(&shared.cache).delete(&key);

        info!(key = %key, "Refreshing");
        shared.load(&mut session, LoadMode::Refresh);
    }

    /// Switch to another endpoint, keeping the current items visible as
    /// stale until page 1 of the new endpoint arrives.
    ///
    /// Returns false if `endpoint` is already active.
    pub fn set_endpoint(&self, endpoint: impl Into<String>) -> bool {
        let endpoint = endpoint.into();
        let shared = &self.shared;
        let mut session = shared.lock_session();
        if session.endpoint == endpoint {
            return false;
        }

        info!(from = %session.endpoint, to = %endpoint, "Switching endpoint");
        shared.coordinator.cancel(Lane::Background);
        session.endpoint = endpoint;
        session.state.current_page = 1;
        session.state.is_stale = true;
        session.state.is_preloading = false;
        shared.load(&mut session, LoadMode::SwitchEndpoint);
        true
    }

    /// Drop every cached page (sign-out, data-invalidating events).
    pub fn clear_cache(&self) {
        lock_cache(&self.shared.cache).clear();
    }

    /// Cancel both lanes. Results still in flight are discarded.
    pub fn close(&self) {
        let shared = &self.shared;
        let mut session = shared.lock_session();
        shared.coordinator.cancel(Lane::Foreground);
        shared.coordinator.cancel(Lane::Background);
        session.state.is_loading = false;
        session.state.is_preloading = false;
        shared.publish(&session);
        debug!(endpoint = %session.endpoint, "Paginator closed");
    }

    pub fn cache(&self) -> SharedCache<S::Item> {
        Arc::clone(&self.shared.cache)
    }

    pub fn cache_stats(&self) -> CacheStats {
        lock_cache(&self.shared.cache).stats().clone()
    }

    pub fn lane_stats(&self, lane: Lane) -> LaneStats {
        self.shared.coordinator.stats(lane)
    }
}

impl<S: PageSource> Shared<S> {
    fn lock_session(&self) -> MutexGuard<'_, Session<S::Item>> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, session: &Session<S::Item>) {
        self.state_tx.send_replace(session.state.clone());
    }

    /// Make a settled page visible.
    fn apply_page(&self, session: &mut Session<S::Item>, page: Page<S::Item>) {
        let items = match &self.transform {
            Some(transform) => transform(page.items),
            None => page.items,
        };
        let state = &mut session.state;
        state.items = items;
        if page.pagination.is_some() {
            state.pagination = page.pagination;
        }
        state.is_loading = false;
        state.is_stale = false;
        state.error = None;
    }

    /// Load the session's current page, from cache unless refreshing.
    fn load(self: &Arc<Self>, session: &mut Session<S::Item>, mode: LoadMode) {
        let key = PageKey::new(session.endpoint.as_str(), session.state.current_page);

        if mode != LoadMode::Refresh {
            let cached = lock_cache(&self.cache).get(&key);
            if let Some(page) = cached {
                debug!(key = %key, "Serving page from cache");
                // A slower fetch for an earlier navigation must not land afterwards.
                self.coordinator.cancel(Lane::Foreground);
                self.apply_page(session, page);
                self.schedule_prefetch(session);
                self.publish(session);
                return;
            }
        }

        let ticket = self.coordinator.issue(Lane::Foreground);
        let id = ticket.id();
        let span = info_span!("fetch", lane = %Lane::Foreground, request_id = %ticket.request_id(), key = %key);

        // Spinners are reserved for loads with nothing of value on screen.
        session.state.is_loading = !(session.state.is_stale && session.state.has_content());
        session.state.error = None;
        self.publish(session);
        debug!(key = %key, ?mode, "Cache miss, fetching");

        let shared = Arc::clone(self);
        tokio::spawn(
            async move {
                let fetch = shared
                    .source
                    .fetch_page(&key.endpoint, key.page, shared.page_size);
                let outcome = shared.coordinator.run(ticket, fetch).await;
                shared.settle(id, key, outcome);
            }
            .instrument(span),
        );
    }

    /// Apply a foreground outcome if its ticket is still the latest.
    fn settle(self: &Arc<Self>, id: TicketId, key: PageKey, outcome: Outcome<Page<S::Item>>) {
        let result = match outcome {
            Outcome::Cancelled => {
                debug!("Foreground fetch cancelled");
                return;
            }
            Outcome::Completed(result) => result,
        };

        // Aborted fetches never get here. A fetch that completed just before
        // being superseded still holds a valid page.
        if let Ok(page) = &result {
            lock_cache(&self.cache).set(key.clone(), page.clone());
        }

        let mut session = self.lock_session();
        if !self.coordinator.is_current(id) {
            debug!("Foreground fetch superseded, discarding");
            return;
        }

        match result {
            Ok(page) => {
                debug!(items = page.items.len(), "Foreground fetch settled");
                self.apply_page(&mut session, page);
                self.schedule_prefetch(&mut session);
                self.publish(&session);
            }
            Err(err) => {
                warn!(error = %err, "Foreground fetch failed");
                session.state.error = Some(err.clone());
                session.state.is_loading = false;
                self.publish(&session);
                drop(session);

                if let Some(hook) = &self.on_error {
                    hook(&err);
                }
            }
        }
    }

    /// Warm the next page in the background if it is worth it.
    fn schedule_prefetch(self: &Arc<Self>, session: &mut Session<S::Item>) {
        let key = {
            let cache = lock_cache(&self.cache);
            self.prefetcher.plan(
                &cache,
                &session.endpoint,
                session.state.current_page,
                session.state.pagination.as_ref(),
            )
        };
        let Some(key) = key else {
            return;
        };

        let ticket = self.coordinator.issue(Lane::Background);
        let id = ticket.id();
        let span = info_span!("prefetch", lane = %Lane::Background, request_id = %ticket.request_id(), key = %key);
        session.state.is_preloading = true;

        let shared = Arc::clone(self);
        tokio::spawn(
            async move {
                let warm = shared
                    .prefetcher
                    .warm(shared.source.as_ref(), &shared.cache, &key, shared.page_size);
                if let Outcome::Completed(Err(err)) = shared.coordinator.run(ticket, warm).await {
                    debug!(error = %err, "Prefetch failed, discarding");
                }

                let mut session = shared.lock_session();
                if shared.coordinator.is_current(id) {
                    session.state.is_preloading = false;
                    shared.publish(&session);
                }
            }
            .instrument(span),
        );
    }
}
