//! Fetching pages from the remote source.
//!
//! - [`source`]: the `PageSource` boundary and its HTTP implementation
//! - [`coordinator`]: foreground/background lanes with cancellation

pub mod coordinator;
pub mod source;
