//! Shared dispatch metrics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every worker of one pool, mutated concurrently.
#[derive(Debug, Default)]
pub(crate) struct DispatchStats {
    workers_spawned: AtomicU64,
    sessions_created: AtomicU64,
    sessions_closed: AtomicU64,
    requests_dispatched: AtomicU64,
}

impl DispatchStats {
    pub(crate) fn on_worker_spawned(&self) {
        self.workers_spawned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn on_session_created(&self) {
        self.sessions_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn on_session_closed(&self) {
        self.sessions_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn on_request_dispatched(&self) {
        self.requests_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            workers_spawned: self.workers_spawned.load(Ordering::Relaxed),
            sessions_created: self.sessions_created.load(Ordering::Relaxed),
            sessions_closed: self.sessions_closed.load(Ordering::Relaxed),
            requests_dispatched: self.requests_dispatched.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the pool's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Scheduler threads ever started for the pool.
    pub workers_spawned: u64,
    /// Sessions ever spawned on the pool's workers.
    pub sessions_created: u64,
    /// Sessions that have finished (their sentinel is enqueued or underway).
    pub sessions_closed: u64,
    /// Requests forwarded into session queues.
    pub requests_dispatched: u64,
}
