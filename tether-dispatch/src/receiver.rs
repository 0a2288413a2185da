//! The consumer-facing response queue and the per-client callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam::channel::{self, Sender};

use crate::types::{ClientId, RequestError, RequestId, Response, ResponseObject};

// ─── ResponseQueue ────────────────────────────────────────────────────────────

/// Multi-producer single-consumer response queue.
///
/// Sessions on every worker thread push into it; exactly one thread may drain
/// it at a time.  The single-reader rule is enforced at runtime with an
/// atomic flag because breaking it is a bug in the embedding application, not
/// a condition to recover from.
pub(crate) struct ResponseQueue {
    tx: Sender<Response>,
    rx: channel::Receiver<Response>,
    receive_lock: AtomicBool,
}

impl ResponseQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = channel::unbounded();
        Self {
            tx,
            rx,
            receive_lock: AtomicBool::new(false),
        }
    }

    /// Build the callback that routes one client's responses into this queue.
    pub(crate) fn create_callback(&self, client_id: ClientId) -> ClientCallback {
        ClientCallback {
            client_id,
            tx: self.tx.clone(),
        }
    }

    /// Inject a response directly, bypassing any session.
    pub(crate) fn add_response(&self, response: Response) {
        let _ = self.tx.send(response);
    }

    /// Dequeue one response, waiting up to `timeout` seconds.  `None` when
    /// nothing arrived in time.
    ///
    /// # Panics
    /// Panics when called concurrently from two threads.
    pub(crate) fn receive(&self, timeout: f64) -> Option<Response> {
        let was_locked = self.receive_lock.swap(true, Ordering::Acquire);
        assert!(!was_locked, "concurrent receive on the same response queue");
        let response = if timeout > 0.0 {
            self.rx.recv_timeout(Duration::from_secs_f64(timeout)).ok()
        } else {
            self.rx.try_recv().ok()
        };
        self.receive_lock.store(false, Ordering::Release);
        response
    }
}

// ─── ClientCallback ───────────────────────────────────────────────────────────

/// The capability a session uses to report one client's outcomes.
///
/// Dropping the callback delivers the termination sentinel
/// `(client_id, 0, None)` — a session promises "no further responses" by
/// letting its callback go out of scope, so the sentinel cannot be forgotten
/// and cannot precede any response the engine produced.
pub struct ClientCallback {
    client_id: ClientId,
    tx: Sender<Response>,
}

impl ClientCallback {
    /// The client this callback reports for.
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Deliver a successful result for `request_id`.
    pub fn on_result(&self, request_id: RequestId, object: impl Into<String>) {
        let _ = self.tx.send(Response {
            client_id: self.client_id,
            request_id,
            object: Some(ResponseObject::Object(object.into())),
        });
    }

    /// Deliver an error for `request_id`.
    pub fn on_error(&self, request_id: RequestId, error: RequestError) {
        let _ = self.tx.send(Response {
            client_id: self.client_id,
            request_id,
            object: Some(ResponseObject::Error(error)),
        });
    }
}

impl Drop for ClientCallback {
    fn drop(&mut self) {
        let _ = self.tx.send(Response {
            client_id: self.client_id,
            request_id: 0,
            object: None,
        });
    }
}
