//! The fixed-size pool of worker slots.
//!
//! Slots hold weak references, so a worker disappears on its own once its
//! last client closes and the next client materializes a fresh one in the
//! emptiest slot.  The slot count is fixed at first use; pressure shifts
//! between slots, never by resizing.

use std::sync::{Arc, Mutex, Weak};
use std::thread;

use crate::stats::DispatchStats;
use crate::worker::Worker;

pub(crate) struct WorkerPool {
    slots: Mutex<Vec<Weak<Worker>>>,
    stats: Arc<DispatchStats>,
}

impl WorkerPool {
    pub(crate) fn new() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
            stats: Arc::new(DispatchStats::default()),
        }
    }

    pub(crate) fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Borrow the least-used slot, materializing its worker if needed.
    pub(crate) fn get(&self) -> Arc<Worker> {
        let mut slots = self.slots.lock().unwrap();
        if slots.is_empty() {
            let size = pool_size();
            log::info!("[pool] Sizing worker pool to {size} slots");
            slots.resize_with(size, Weak::new);
        }

        let slot = slots
            .iter_mut()
            .min_by_key(|slot| slot.strong_count())
            .unwrap();
        match slot.upgrade() {
            Some(worker) => worker,
            None => {
                let worker = Arc::new(Worker::spawn(Arc::clone(&self.stats)));
                *slot = Arc::downgrade(&worker);
                worker
            }
        }
    }
}

/// `clamp(available_parallelism * 5 / 4, 8, 1000)`.
fn pool_size() -> usize {
    let hardware = thread::available_parallelism().map_or(1, |n| n.get());
    (hardware * 5 / 4).clamp(8, 1000)
}
