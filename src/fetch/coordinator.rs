//! Request coordinator: at most one in-flight fetch per lane.
//!
//! Two independent lanes exist. The foreground lane serves user navigation;
//! the background lane serves speculative prefetches. Issuing a request on a
//! lane aborts whatever that lane had in flight and bumps the lane's
//! generation, so a superseded request settles as [`Outcome::Cancelled`] even
//! if its I/O finished before the abort landed.

use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use futures::future::{AbortHandle, AbortRegistration, Abortable};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::FetchError;

/// Which lane a request runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lane {
    /// User-triggered loads; results reach visible state.
    Foreground,
    /// Speculative loads; results only reach the cache.
    Background,
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lane::Foreground => write!(f, "foreground"),
            Lane::Background => write!(f, "background"),
        }
    }
}

/// How a coordinated request settled.
#[derive(Debug)]
pub enum Outcome<T> {
    /// The request ran to completion and is still the latest on its lane.
    Completed(Result<T, FetchError>),
    /// A newer request (or an explicit cancel) superseded this one.
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    /// The value of a successful, non-superseded request.
    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Completed(Ok(value)) => Some(value),
            _ => None,
        }
    }
}

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TicketId {
    pub lane: Lane,
    pub generation: u64,
}

/// Permission to run one request on a lane.
///
/// Issued synchronously so that issue order, not task scheduling order,
/// decides which request is the latest.
#[derive(Debug)]
pub struct Ticket {
    id: TicketId,
    request_id: Uuid,
    registration: AbortRegistration,
}

impl Ticket {
    pub fn id(&self) -> TicketId {
        self.id
    }

    /// Correlation id for logs.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}

/// Per-lane counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LaneStats {
    pub issued: u64,
    pub completed: u64,
    pub failed: u64,
    pub cancelled: u64,
}

#[derive(Debug, Default)]
struct LaneState {
    generation: u64,
    in_flight: Option<AbortHandle>,
    stats: LaneStats,
}

impl LaneState {
    /// Abort the in-flight request, if any, and invalidate its generation.
    fn supersede(&mut self) -> bool {
        self.generation += 1;
        match self.in_flight.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

/// The request coordinator.
#[derive(Debug, Default)]
pub struct RequestCoordinator {
    foreground: Mutex<LaneState>,
    background: Mutex<LaneState>,
}

impl RequestCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lane(&self, lane: Lane) -> MutexGuard<'_, LaneState> {
        let state = match lane {
            Lane::Foreground => &self.foreground,
            Lane::Background => &self.background,
        };
        state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Issue a new request on `lane`, cancelling the one in flight there.
    pub fn issue(&self, lane: Lane) -> Ticket {
        let (handle, registration) = AbortHandle::new_pair();
        let mut state = self.lane(lane);
        let aborted = state.supersede();
        state.in_flight = Some(handle);
        state.stats.issued += 1;

        let ticket = Ticket {
            id: TicketId {
                lane,
                generation: state.generation,
            },
            request_id: Uuid::new_v4(),
            registration,
        };
        debug!(
            lane = %lane,
            generation = ticket.id.generation,
            request_id = %ticket.request_id,
            aborted,
            "Issued request"
        );
        ticket
    }

    /// Drive `op` under `ticket`. Resolves to [`Outcome::Cancelled`] if the
    /// ticket was superseded at any point before settling.
    pub async fn run<T, F>(&self, ticket: Ticket, op: F) -> Outcome<T>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        let Ticket {
            id, registration, ..
        } = ticket;
        let result = Abortable::new(op, registration).await;

        let mut state = self.lane(id.lane);
        let current = state.generation == id.generation;
        if current {
            state.in_flight = None;
        }

        match result {
            Ok(result) if current => {
                if result.is_ok() {
                    state.stats.completed += 1;
                } else {
                    state.stats.failed += 1;
                }
                Outcome::Completed(result)
            }
            _ => {
                state.stats.cancelled += 1;
                debug!(lane = %id.lane, generation = id.generation, "Request superseded");
                Outcome::Cancelled
            }
        }
    }

    /// Run a user-triggered request, superseding any earlier one.
    pub async fn run_foreground<T, F>(&self, op: F) -> Outcome<T>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        let ticket = self.issue(Lane::Foreground);
        self.run(ticket, op).await
    }

    /// Run a speculative request. Failures and cancellations are swallowed.
    pub async fn run_background<T, F>(&self, op: F) -> Option<T>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        let ticket = self.issue(Lane::Background);
        match self.run(ticket, op).await {
            Outcome::Completed(Ok(value)) => Some(value),
            Outcome::Completed(Err(err)) => {
                debug!(error = %err, "Background request failed, discarding");
                None
            }
            Outcome::Cancelled => None,
        }
    }

    /// Cancel whatever `lane` has in flight. Returns whether anything was.
    pub fn cancel(&self, lane: Lane) -> bool {
        self.lane(lane).supersede()
    }

    /// Whether `id` is still the latest request issued on its lane.
    pub fn is_current(&self, id: TicketId) -> bool {
        self.lane(id.lane).generation == id.generation
    }

    pub fn in_flight(&self, lane: Lane) -> bool {
        self.lane(lane).in_flight.is_some()
    }

    pub fn stats(&self, lane: Lane) -> LaneStats {
        self.lane(lane).stats.clone()
    }
}
