//! Scripted in-memory page source shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use feed_pager::cache::page::{Page, PageKey, PaginationMetadata};
use feed_pager::config::PrefetchConfig;
use feed_pager::error::FetchError;
use feed_pager::fetch::source::PageSource;
use feed_pager::paginator::{PaginatorBuilder, PaginatorState};

pub const ITEMS_PER_PAGE: usize = 10;
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(10);

/// Items the scripted source returns for one page.
pub fn items(endpoint: &str, page: u32) -> Vec<String> {
    (0..ITEMS_PER_PAGE)
        .map(|i| format!("{endpoint}#{page}.{i}"))
        .collect()
}

#[derive(Default)]
struct Script {
    page_counts: HashMap<String, u32>,
    latencies: HashMap<PageKey, Duration>,
    failures: HashMap<PageKey, FetchError>,
    calls: Vec<PageKey>,
}

/// Page source whose latency and failures are set per page.
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<Script>,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    /// Page count reported for `endpoint` (default 5).
    pub fn set_page_count(&self, endpoint: &str, page_count: u32) {
        self.script().page_counts.insert(endpoint.to_string(), page_count);
    }

    pub fn set_latency(&self, endpoint: &str, page: u32, latency: Duration) {
        self.script().latencies.insert(PageKey::new(endpoint, page), latency);
    }

    pub fn fail(&self, endpoint: &str, page: u32, error: FetchError) {
        self.script().failures.insert(PageKey::new(endpoint, page), error);
    }

    pub fn heal(&self, endpoint: &str, page: u32) {
        self.script().failures.remove(&PageKey::new(endpoint, page));
    }

    pub fn calls(&self) -> Vec<PageKey> {
        self.script().calls.clone()
    }

    pub fn call_count(&self, endpoint: &str, page: u32) -> usize {
        let key = PageKey::new(endpoint, page);
        self.script().calls.iter().filter(|call| **call == key).count()
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    type Item = String;

    async fn fetch_page(
        &self,
        endpoint: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Page<String>, FetchError> {
        let key = PageKey::new(endpoint, page);
        let (latency, failure, page_count) = {
            let mut script = self.script();
            script.calls.push(key.clone());
            (
                script.latencies.get(&key).copied().unwrap_or(DEFAULT_LATENCY),
                script.failures.get(&key).cloned(),
                script.page_counts.get(endpoint).copied().unwrap_or(5),
            )
        };

        tokio::time::sleep(latency).await;

        if let Some(error) = failure {
            return Err(error);
        }
        Ok(Page::new(
            items(endpoint, page),
            Some(PaginationMetadata {
                page,
                limit: page_size,
                total: page_count as u64 * ITEMS_PER_PAGE as u64,
                page_count,
            }),
        ))
    }
}

pub fn no_prefetch() -> PrefetchConfig {
    PrefetchConfig {
        enabled: false,
        delay_ms: 0,
    }
}

/// Builder over a shared scripted source with prefetching off.
pub fn builder(source: &Arc<ScriptedSource>, endpoint: &str) -> PaginatorBuilder<ScriptedSource> {
    PaginatorBuilder::new(Arc::clone(source), endpoint).prefetch(no_prefetch())
}

/// Wait (in virtual time) for a state matching `pred`.
pub async fn wait_for(
    rx: &mut watch::Receiver<PaginatorState<String>>,
    pred: impl FnMut(&PaginatorState<String>) -> bool,
) -> PaginatorState<String> {
    tokio::time::timeout(Duration::from_secs(30), rx.wait_for(pred))
        .await
        .expect("state never reached")
        .expect("paginator dropped")
        .clone()
}

/// Wait until the foreground load settled.
pub async fn settled(rx: &mut watch::Receiver<PaginatorState<String>>) -> PaginatorState<String> {
    wait_for(rx, |s| !s.is_loading).await
}
