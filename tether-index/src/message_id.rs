//! Message identifiers.

use std::fmt;

/// A totally-ordered message identifier within one dialog.
///
/// Server-assigned identifiers keep their low [`MessageId::SERVER_ID_SHIFT`]
/// bits zero, so consecutive server messages leave room for locally-allocated
/// identifiers between them.  The low three bits of a local identifier carry
/// a type tag; tag `1` marks a message that is queued locally but not yet
/// acknowledged by the server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(i64);

impl MessageId {
    /// Bits reserved below the server sequence number.
    pub const SERVER_ID_SHIFT: u32 = 20;

    const TYPE_MASK: i64 = (1 << 3) - 1;
    const TYPE_YET_UNSENT: i64 = 1;
    const FULL_TYPE_MASK: i64 = (1 << Self::SERVER_ID_SHIFT) - 1;

    /// The greatest representable identifier.
    pub const MAX: MessageId = MessageId(i64::MAX);

    /// Wrap a raw identifier.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// The identifier of a server-assigned message.
    pub const fn from_server_id(server_id: i32) -> Self {
        Self((server_id as i64) << Self::SERVER_ID_SHIFT)
    }

    /// A locally-allocated identifier for a message queued after the given
    /// server position but not yet acknowledged.
    pub const fn yet_unsent(server_id: i32) -> Self {
        Self(((server_id as i64) << Self::SERVER_ID_SHIFT) | Self::TYPE_YET_UNSENT)
    }

    /// The raw integer projection used for ordering.
    pub const fn get(self) -> i64 {
        self.0
    }

    /// True for any non-empty identifier.
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }

    /// True if the message was assigned its identifier by the server.
    pub const fn is_server(self) -> bool {
        self.is_valid() && self.0 & Self::FULL_TYPE_MASK == 0
    }

    /// True if the message is locally queued and not yet acknowledged.
    pub const fn is_yet_unsent(self) -> bool {
        self.is_valid() && self.0 & Self::TYPE_MASK == Self::TYPE_YET_UNSENT
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_server() {
            write!(f, "message {}", self.0 >> Self::SERVER_ID_SHIFT)
        } else {
            write!(f, "local message {}", self.0)
        }
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}
