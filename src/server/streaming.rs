//! SSE (Server-Sent Events) streaming of paginator state.
//!
//! Every published state becomes one `state` event carrying the JSON
//! snapshot. Watch semantics apply: a slow client skips intermediate
//! snapshots but always sees the latest.

use axum::response::sse::Event;
use futures::stream::Stream;
use serde::Serialize;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tracing::warn;

use crate::paginator::PaginatorState;

/// Convert a state receiver into an SSE stream.
///
/// Snapshots that fail to serialize are logged and skipped.
pub fn state_to_sse_stream<T>(
    rx: watch::Receiver<PaginatorState<T>>,
) -> impl Stream<Item = Result<Event, std::convert::Infallible>>
where
    T: Serialize + Clone + Send + Sync + 'static,
{
    WatchStream::new(rx).filter_map(|state| match serde_json::to_string(&state) {
        Ok(data) => Some(Ok(Event::default().event("state").data(data))),
        Err(err) => {
            warn!(error = %err, page = state.current_page, "Dropping unserializable state event");
            None
        }
    })
}
