//! Worker threads hosting client sessions.
//!
//! A [`Worker`] is one OS thread running a single-threaded tokio runtime.
//! Every hosted session is a task on that runtime owning its engine, its
//! callback and its own request queue; requests enter through the worker's
//! control channel and are forwarded into the owning session's queue, so
//! per-client submission order is preserved end to end.  Sessions share their
//! scheduler cooperatively — an engine that blocks stalls its whole worker,
//! which is why clients are spread over a pool of them.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::engine::Engine;
use crate::receiver::ClientCallback;
use crate::stats::DispatchStats;
use crate::types::{ClientId, Request, RequestId};

/// Housekeeping interval of the scheduler loop.
const TICK: Duration = Duration::from_secs(10);

enum WorkerMsg {
    Create {
        client_id: ClientId,
        engine: Box<dyn Engine>,
        callback: ClientCallback,
    },
    Request {
        client_id: ClientId,
        request_id: RequestId,
        request: Request,
    },
    Close {
        client_id: ClientId,
    },
    Shutdown,
}

// ─── Worker ───────────────────────────────────────────────────────────────────

/// Handle to one scheduler thread.
///
/// Clients hold the handle through an `Arc`; dropping the last one shuts the
/// scheduler down and joins its thread, so a worker lives exactly as long as
/// its last client.
pub(crate) struct Worker {
    tx: mpsc::UnboundedSender<WorkerMsg>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    pub(crate) fn spawn(stats: Arc<DispatchStats>) -> Self {
        static WORKER_SEQ: AtomicUsize = AtomicUsize::new(0);
        let seq = WORKER_SEQ.fetch_add(1, Ordering::Relaxed);

        stats.on_worker_spawned();
        let (tx, rx) = mpsc::unbounded_channel();
        let thread = thread::Builder::new()
            .name(format!("tether-worker-{seq}"))
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .expect("failed to build worker runtime");
                runtime.block_on(run_worker(rx, stats));
            })
            .expect("failed to spawn worker thread");
        log::info!("[worker] Started tether-worker-{seq}");
        Self {
            tx,
            thread: Some(thread),
        }
    }

    pub(crate) fn create_session(
        &self,
        client_id: ClientId,
        engine: Box<dyn Engine>,
        callback: ClientCallback,
    ) {
        self.post(WorkerMsg::Create {
            client_id,
            engine,
            callback,
        });
    }

    pub(crate) fn send(&self, client_id: ClientId, request_id: RequestId, request: Request) {
        self.post(WorkerMsg::Request {
            client_id,
            request_id,
            request,
        });
    }

    pub(crate) fn close(&self, client_id: ClientId) {
        self.post(WorkerMsg::Close { client_id });
    }

    fn post(&self, msg: WorkerMsg) {
        // The scheduler outlives every handle; a closed channel means the
        // worker thread died, which is unrecoverable.
        if self.tx.send(msg).is_err() {
            panic!("worker scheduler is gone");
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        let _ = self.tx.send(WorkerMsg::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

// ─── Scheduler loop ───────────────────────────────────────────────────────────

struct Session {
    tx: mpsc::UnboundedSender<(RequestId, Request)>,
}

async fn run_worker(mut rx: mpsc::UnboundedReceiver<WorkerMsg>, stats: Arc<DispatchStats>) {
    let mut sessions: HashMap<ClientId, Session> = HashMap::new();
    let mut tasks = JoinSet::new();
    let mut tick = tokio::time::interval(TICK);

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(WorkerMsg::Create { client_id, engine, callback }) => {
                    let (tx, requests) = mpsc::unbounded_channel();
                    let previous = sessions.insert(client_id, Session { tx });
                    assert!(previous.is_none(), "client {client_id} already hosted here");
                    stats.on_session_created();
                    tasks.spawn(run_session(client_id, engine, callback, requests, Arc::clone(&stats)));
                }
                Some(WorkerMsg::Request { client_id, request_id, request }) => {
                    match sessions.get(&client_id) {
                        Some(session) => {
                            stats.on_request_dispatched();
                            if session.tx.send((request_id, request)).is_err() {
                                // The session closed itself; its sentinel is
                                // already on the way.
                                log::warn!(
                                    "[worker] Dropping request {request_id} for closing client {client_id}"
                                );
                            }
                        }
                        None => log::warn!(
                            "[worker] Dropping request {request_id} for unknown client {client_id}"
                        ),
                    }
                }
                Some(WorkerMsg::Close { client_id }) => {
                    // Dropping the queue lets the session drain what is left
                    // and emit its sentinel.
                    if sessions.remove(&client_id).is_none() {
                        log::warn!("[worker] Close for unknown client {client_id}");
                    }
                }
                Some(WorkerMsg::Shutdown) | None => break,
            },
            _ = tick.tick() => {
                sessions.retain(|client_id, session| {
                    if session.tx.is_closed() {
                        log::debug!("[worker] Reaped finished session of client {client_id}");
                        false
                    } else {
                        true
                    }
                });
            }
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    // Close every remaining session and wait for the drains to finish.
    sessions.clear();
    while tasks.join_next().await.is_some() {}
    log::info!("[worker] Scheduler stopped");
}

async fn run_session(
    client_id: ClientId,
    mut engine: Box<dyn Engine>,
    callback: ClientCallback,
    mut requests: mpsc::UnboundedReceiver<(RequestId, Request)>,
    stats: Arc<DispatchStats>,
) {
    log::debug!("[worker] Session of client {client_id} started");
    while let Some((request_id, request)) = requests.recv().await {
        if let ControlFlow::Break(()) = engine.handle(request_id, request, &callback) {
            log::info!("[worker] Client {client_id} closed by its engine");
            break;
        }
    }
    stats.on_session_closed();
    // `callback` drops here, delivering the termination sentinel after every
    // response the engine produced.
    log::debug!("[worker] Session of client {client_id} finished");
}
