//! feed-pager: client-side paginated data cache for list feeds.
//!
//! Fetches, caches, prefetches and invalidates pages of list data while
//! juggling overlapping requests:
//!   navigation intent → cache lookup → foreground fetch → visible state
//!                                    → background prefetch → cache
//!
//! Exposes one reactive state value plus `go_to_page`, `refresh` and
//! endpoint switching, and an optional HTTP control surface.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod metrics;
pub mod paginator;
pub mod server;

pub use cache::page::{Page, PageKey, PaginationMetadata};
pub use error::FetchError;
pub use fetch::source::{HttpPageSource, PageSource};
pub use paginator::{Paginator, PaginatorState, Phase};
