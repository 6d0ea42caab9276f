//! The remote page source boundary.
//!
//! The core only ever calls [`PageSource::fetch_page`]. [`HttpPageSource`]
//! implements it against a REST endpoint answering
//! `GET {base}{endpoint}?page=N&limit=M` with
//! `{ "posts": [...], "pagination": { page, limit, total, pages } }`.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::cache::page::Page;
use crate::config::SourceConfig;
use crate::error::FetchError;

/// Fetches one page of list data.
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    /// Opaque list item.
    type Item: Clone + Send + Sync + 'static;

    async fn fetch_page(
        &self,
        endpoint: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Self::Item>, FetchError>;
}

/// REST-backed page source.
pub struct HttpPageSource<T> {
    client: reqwest::Client,
    base_url: String,
    _item: PhantomData<fn() -> T>,
}

impl<T> HttpPageSource<T> {
    /// Build a source with the configured transport timeout.
    pub fn new(config: &SourceConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(client, &config.base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            _item: PhantomData,
        }
    }

    /// Full request URL; endpoints that already carry a query string get
    /// the paging parameters appended with `&`.
    pub fn request_url(&self, endpoint: &str, page: u32, page_size: u32) -> String {
        let separator = if endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{}{}{}page={}&limit={}",
            self.base_url, endpoint, separator, page, page_size
        )
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"]
                .iter()
                .find_map(|field| value.get(*field)?.as_str().map(str::to_string))
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}

#[async_trait]
impl<T> PageSource for HttpPageSource<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Item = T;

    async fn fetch_page(
        &self,
        endpoint: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Page<T>, FetchError> {
        let url = self.request_url(endpoint, page, page_size);
        debug!(url = %url, "Fetching page");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Server {
                status: status.as_u16(),
                message: error_message(&body, status),
            });
        }

        Ok(response.json::<Page<T>>().await?)
    }
}
