//! # tether — multi-client hosting for protocol engines
//!
//! `tether` hosts many logically independent protocol client sessions over a
//! fixed pool of scheduler threads and keeps, per dialog, an ordered index of
//! the messages the dialog knows about.  It consists of two focused
//! sub-crates wired together here for convenience:
//!
//! | Sub-crate         | Role                                               |
//! |-------------------|----------------------------------------------------|
//! | `tether-index`    | Ordered per-dialog message index with adjacency    |
//! | `tether-dispatch` | Client sessions multiplexed over a worker pool     |
//!
//! ## Quick start: hosting an engine
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tether::{ClientManager, Request};
//! # fn factory() -> Arc<dyn tether::EngineFactory> { unimplemented!() }
//!
//! let manager = ClientManager::new(factory());
//! let client = manager.create_client();
//! manager.send(client, 1, Request::new("getMe"));
//! while let Some(response) = manager.receive(1.0) {
//!     println!("{} → {:?}", response.request_id, response.object);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Re-export of [`tether_index`] — the ordered per-dialog message index.
pub use tether_index as index;

/// Re-export of [`tether_dispatch`] — client dispatch over a worker pool.
pub use tether_dispatch as dispatch;

// ─── Convenience re-exports ───────────────────────────────────────────────────

pub use tether_dispatch::{
    Client, ClientCallback, ClientId, ClientManager, Engine, EngineFactory, Request,
    RequestError, RequestId, Response, ResponseObject,
};

pub use tether_index::{AttachInfo, MessageId, OrderedMessages};
