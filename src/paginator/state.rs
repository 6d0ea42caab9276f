//! The externally observable paginator state.

use serde::{Serialize, Serializer};

use crate::cache::page::PaginationMetadata;
use crate::error::FetchError;

/// Coarse lifecycle of one endpoint session, derived from the state flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing requested yet.
    Idle,
    /// Foreground fetch in flight with nothing of this endpoint to show.
    Loading,
    /// Data present and current.
    Loaded,
    /// Endpoint changed; the previous endpoint's data stays on screen while
    /// the new one loads.
    StaleLoaded,
    /// Last foreground fetch failed; last-good data, if any, is still shown.
    Errored,
}

/// Snapshot of everything a view needs to render a paged list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatorState<T> {
    pub items: Vec<T>,
    pub pagination: Option<PaginationMetadata>,
    pub current_page: u32,
    pub is_loading: bool,
    /// Instrumentation only; never blocks navigation.
    pub is_preloading: bool,
    pub is_stale: bool,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<FetchError>,
}

fn serialize_error<S: Serializer>(error: &Option<FetchError>, serializer: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

impl<T> Default for PaginatorState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pagination: None,
            current_page: 1,
            is_loading: false,
            is_preloading: false,
            is_stale: false,
            error: None,
        }
    }
}

impl<T> PaginatorState<T> {
    /// Whether there is rendered content a spinner would hide.
    pub fn has_content(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn page_count(&self) -> Option<u32> {
        self.pagination.map(|p| p.page_count)
    }

    pub fn phase(&self) -> Phase {
        if self.error.is_some() {
            Phase::Errored
        } else if self.is_stale {
            if self.has_content() {
                Phase::StaleLoaded
            } else {
                Phase::Loading
            }
        } else if self.is_loading {
            Phase::Loading
        } else if self.pagination.is_some() || self.has_content() {
            Phase::Loaded
        } else {
            Phase::Idle
        }
    }
}
