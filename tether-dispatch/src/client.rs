//! A convenience wrapper owning exactly one client session.

use std::sync::{Arc, OnceLock};

use crate::engine::Engine;
use crate::pool::WorkerPool;
use crate::receiver::ResponseQueue;
use crate::types::{alloc_client_id, ClientId, Request, RequestId, ResponseObject};
use crate::worker::Worker;

/// The process-wide pool shared by every [`Client`].
///
/// It lives for the whole process, so it outlives each wrapper; the workers
/// themselves still stop once their last session closes.
fn shared_pool() -> &'static WorkerPool {
    static POOL: OnceLock<WorkerPool> = OnceLock::new();
    POOL.get_or_init(WorkerPool::new)
}

/// A response as seen by a single-session [`Client`]; the client identifier
/// is implicit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientResponse {
    /// The request that produced it; `0` for unsolicited updates and the
    /// termination sentinel.
    pub request_id: RequestId,
    /// `None` with `request_id == 0` is the termination sentinel.
    pub object: Option<ResponseObject>,
}

/// One client session over the process-wide worker pool.
///
/// `send` forwards, `receive` blocks, and dropping the client closes its
/// session and drains the remaining responses.
pub struct Client {
    worker: Arc<Worker>,
    queue: ResponseQueue,
    client_id: ClientId,
}

impl Client {
    /// Host `engine` as a new session on the shared pool.
    pub fn new(engine: Box<dyn Engine>) -> Self {
        let worker = shared_pool().get();
        let queue = ResponseQueue::new();
        let client_id = alloc_client_id();
        let callback = queue.create_callback(client_id);
        worker.create_session(client_id, engine, callback);
        log::info!("[client] Created single client {client_id}");
        Self {
            worker,
            queue,
            client_id,
        }
    }

    /// Submit a request.  Malformed requests — `request_id == 0` or a
    /// missing function — are logged and dropped.
    pub fn send(&self, request_id: RequestId, request: Request) {
        if request_id == 0 || request.function.is_none() {
            log::error!("[client] Drop wrong request {request_id}");
            return;
        }
        self.worker.send(self.client_id, request_id, request);
    }

    /// Dequeue one response, waiting up to `timeout` seconds.
    pub fn receive(&self, timeout: f64) -> Option<ClientResponse> {
        self.queue.receive(timeout).map(|response| ClientResponse {
            request_id: response.request_id,
            object: response.object,
        })
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.worker.close(self.client_id);
        loop {
            if let Some(response) = self.queue.receive(10.0) {
                if response.is_terminal() {
                    break;
                }
            }
        }
    }
}
