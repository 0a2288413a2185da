//! Multi-client dispatch: many sessions, one response stream.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::engine::EngineFactory;
use crate::pool::WorkerPool;
use crate::receiver::ResponseQueue;
use crate::stats::StatsSnapshot;
use crate::types::{alloc_client_id, ClientId, Request, RequestError, RequestId, Response, ResponseObject};
use crate::worker::Worker;

/// Hosts any number of independent client sessions over a worker pool and
/// funnels their responses into one consumer-facing queue.
///
/// One thread creates clients and submits requests; one thread (possibly the
/// same) drains [`receive`].  The workers run on their own threads.  Dropping
/// the manager closes every hosted client and blocks until each has delivered
/// its termination sentinel.
///
/// [`receive`]: ClientManager::receive
pub struct ClientManager {
    factory: Arc<dyn EngineFactory>,
    pool: WorkerPool,
    queue: ResponseQueue,
    bindings: RwLock<HashMap<ClientId, Arc<Worker>>>,
}

impl ClientManager {
    /// Create an empty manager dispatching to engines built by `factory`.
    pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            factory,
            pool: WorkerPool::new(),
            queue: ResponseQueue::new(),
            bindings: RwLock::new(HashMap::new()),
        }
    }

    /// Create a new client session and return its identifier.
    ///
    /// The client is placed on the least-used worker of the pool and stays
    /// there for its whole lifetime.
    pub fn create_client(&self) -> ClientId {
        let worker = self.pool.get();
        let client_id = alloc_client_id();
        let engine = self.factory.create(client_id);
        let callback = self.queue.create_callback(client_id);
        worker.create_session(client_id, engine, callback);
        self.bindings.write().unwrap().insert(client_id, worker);
        log::info!("[dispatch] Created client {client_id}");
        client_id
    }

    /// Submit a request on behalf of `client_id`.
    ///
    /// A request for an unknown client — never created, or already past its
    /// termination sentinel — produces an error response with code 400 on
    /// the response stream instead of failing synchronously.
    pub fn send(&self, client_id: ClientId, request_id: RequestId, request: Request) {
        {
            let bindings = self.bindings.read().unwrap();
            if let Some(worker) = bindings.get(&client_id) {
                worker.send(client_id, request_id, request);
                return;
            }
        }
        log::warn!("[dispatch] Request {request_id} for unknown client {client_id}");
        self.queue.add_response(Response {
            client_id,
            request_id,
            object: Some(ResponseObject::Error(RequestError::invalid_client())),
        });
    }

    /// Dequeue one response, waiting up to `timeout` seconds; `None` when
    /// nothing arrived in time.
    ///
    /// Observing a client's termination sentinel releases the manager's
    /// record of that client — later `send`s for it synthesize errors.
    ///
    /// # Panics
    /// Panics on concurrent calls; the stream has exactly one consumer.
    pub fn receive(&self, timeout: f64) -> Option<Response> {
        let response = self.queue.receive(timeout)?;
        if response.is_terminal() {
            self.bindings.write().unwrap().remove(&response.client_id);
            log::info!("[dispatch] Client {} terminated", response.client_id);
        }
        Some(response)
    }

    /// Run a request that needs no client state; synchronous.
    pub fn execute(&self, request: Request) -> ResponseObject {
        self.factory.execute(request)
    }

    /// Snapshot of the shared worker metrics.
    pub fn stats(&self) -> StatsSnapshot {
        self.pool.stats().snapshot()
    }
}

impl Drop for ClientManager {
    fn drop(&mut self) {
        {
            let bindings = self.bindings.read().unwrap();
            for (&client_id, worker) in bindings.iter() {
                worker.close(client_id);
            }
        }
        // Wait for every hosted client to deliver its sentinel.
        while !self.bindings.read().unwrap().is_empty() {
            self.receive(10.0);
        }
    }
}
