//! tether-app — echo-engine round-trip demo.
//!
//! Hosts a pair of echo clients on the dispatch layer, sends a few requests
//! to each, and prints the responses as they drain.
//!
//! Run with:
//!   RUST_LOG=tether_dispatch=info cargo run -p tether-app

use std::ops::ControlFlow;
use std::sync::Arc;

use tether_dispatch::{
    Client, ClientCallback, ClientId, ClientManager, Engine, EngineFactory, Request, RequestError,
    RequestId, ResponseObject,
};

// ── Echo engine ───────────────────────────────────────────────────────────────

struct EchoEngine;

impl Engine for EchoEngine {
    fn handle(
        &mut self,
        request_id: RequestId,
        request: Request,
        callback: &ClientCallback,
    ) -> ControlFlow<()> {
        match request.function.as_deref() {
            Some("close") => {
                callback.on_result(request_id, "closing");
                ControlFlow::Break(())
            }
            Some(function) => {
                callback.on_result(request_id, format!("echo: {function}"));
                ControlFlow::Continue(())
            }
            None => {
                callback.on_error(request_id, RequestError::new(400, "Request is empty"));
                ControlFlow::Continue(())
            }
        }
    }
}

struct EchoFactory;

impl EngineFactory for EchoFactory {
    fn create(&self, _client_id: ClientId) -> Box<dyn Engine> {
        Box::new(EchoEngine)
    }

    fn execute(&self, request: Request) -> ResponseObject {
        match request.function {
            Some(function) => ResponseObject::Object(format!("echo: {function}")),
            None => ResponseObject::Error(RequestError::new(400, "Request is empty")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        // SAFETY: single-threaded at this point, no other threads reading env
        unsafe { std::env::set_var("RUST_LOG", "tether_dispatch=info,tether_app=info") }
    }
    env_logger::init();

    let manager = ClientManager::new(Arc::new(EchoFactory));
    let alice = manager.create_client();
    let bob = manager.create_client();

    for (client, name) in [(alice, "alice"), (bob, "bob")] {
        for request_id in 1..=3u64 {
            manager.send(client, request_id, Request::new(format!("{name}-{request_id}")));
        }
    }

    let mut seen = 0;
    while seen < 6 {
        if let Some(response) = manager.receive(1.0) {
            println!(
                "client {} · request {} → {:?}",
                response.client_id, response.request_id, response.object
            );
            seen += 1;
        }
    }

    println!("execute → {:?}", manager.execute(Request::new("ping")));

    // A single-session client over the process-wide pool.
    let single = Client::new(Box::new(EchoEngine));
    single.send(7, Request::new("solo"));
    if let Some(response) = single.receive(1.0) {
        println!("single · request {} → {:?}", response.request_id, response.object);
    }

    log::info!("[app] Shutting down");
    // Dropping the manager and the single client drains their sentinels.
}
