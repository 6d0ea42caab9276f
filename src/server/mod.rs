//! HTTP control surface for one paginator.
//!
//! - [`api`]: Route handlers for state, navigation and cache control
//! - [`streaming`]: SSE stream of state snapshots

pub mod api;
pub mod streaming;
