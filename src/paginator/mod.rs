//! Paginated list orchestration.
//!
//! - [`state`]: PaginatorState and its derived Phase
//! - [`engine`]: the Paginator that drives cache, fetches and prefetches

pub mod engine;
pub mod state;

pub use engine::{Paginator, PaginatorBuilder};
pub use state::{Phase, PaginatorState};
