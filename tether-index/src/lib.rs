//! # tether-index
//!
//! Per-dialog ordered index of message identifiers.
//!
//! [`OrderedMessages`] keeps the set of message identifiers one dialog knows
//! about, ordered, with fast insertion and deletion, range and date queries,
//! and the adjacency bookkeeping used to detect gaps in the received history.
//!
//! The index is strictly single-threaded: the dialog that owns it is
//! responsible for serializing access.

#![deny(unsafe_code)]

mod message_id;
mod ordered;

pub use message_id::MessageId;
pub use ordered::{AttachInfo, Iter, OrderedMessage, OrderedMessages};
