//! # tether-dispatch
//!
//! Multi-tenant request/response dispatch for protocol client engines.
//!
//! Many logically independent client sessions are hosted over a fixed pool of
//! scheduler threads; outbound requests are multiplexed onto the pool and
//! every result funnels into a single consumer-facing queue.
//!
//! - [`ClientManager`] hosts any number of clients behind one shared response
//!   stream.
//! - [`Client`] is the single-session convenience wrapper over a process-wide
//!   pool.
//! - [`Engine`] and [`EngineFactory`] are the seams behind which the actual
//!   protocol implementation lives; the dispatch layer never looks inside a
//!   request.
//!
//! Responses for one client arrive in submission order, and every client ends
//! its stream with exactly one termination sentinel (`request_id == 0`, no
//! payload).

#![deny(unsafe_code)]

mod client;
mod engine;
mod manager;
mod pool;
mod receiver;
mod stats;
mod types;
mod worker;

pub use client::{Client, ClientResponse};
pub use engine::{Engine, EngineFactory};
pub use manager::ClientManager;
pub use receiver::ClientCallback;
pub use stats::StatsSnapshot;
pub use types::{ClientId, Request, RequestError, RequestId, Response, ResponseObject};
