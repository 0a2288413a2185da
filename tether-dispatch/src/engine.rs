//! The seam between the dispatch layer and the hosted protocol engines.
//!
//! The dispatch layer never interprets a request: it hands the payload to the
//! client's [`Engine`] and routes whatever the engine reports back through the
//! session's [`ClientCallback`].

use std::ops::ControlFlow;

use crate::receiver::ClientCallback;
use crate::types::{ClientId, Request, RequestId, ResponseObject};

/// One hosted client instance, driven by its session.
///
/// An engine only ever runs on its session's scheduler thread, one request at
/// a time, in submission order.
pub trait Engine: Send {
    /// Process one request, reporting outcomes through `callback`.
    ///
    /// An engine may answer zero or more times per request (including
    /// unsolicited updates under request id `0`).  Returning
    /// [`ControlFlow::Break`] terminates the session: still-queued requests
    /// are discarded and the termination sentinel follows the responses
    /// already produced.
    fn handle(
        &mut self,
        request_id: RequestId,
        request: Request,
        callback: &ClientCallback,
    ) -> ControlFlow<()>;
}

/// Builds engines for new clients and runs context-free requests.
pub trait EngineFactory: Send + Sync {
    /// Build the engine backing a freshly created client session.
    fn create(&self, client_id: ClientId) -> Box<dyn Engine>;

    /// Run a request that needs no client state, synchronously.
    fn execute(&self, request: Request) -> ResponseObject;
}
