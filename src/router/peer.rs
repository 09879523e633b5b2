//! Transport seam for outbound delivery
//!
//! The router never touches sockets. Anything that can report whether it is
//! open and accept an encoded message can be a member of a box.

use bytes::Bytes;

use crate::registry::ConnectionId;

/// Error returned when a message cannot be queued for a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The connection is closing or closed
    Closed,
    /// The connection's outbound queue is full
    QueueFull,
}

impl std::fmt::Display for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendError::Closed => write!(f, "Connection closed"),
            SendError::QueueFull => write!(f, "Outbound queue full"),
        }
    }
}

impl std::error::Error for SendError {}

/// A live connection as seen by the router
///
/// Implementations must not block in `send` or `close`; the router calls
/// them while holding the registry lock.
pub trait Peer: Clone + Send + Sync + 'static {
    /// Identity of this connection
    fn id(&self) -> ConnectionId;

    /// Whether the connection is open and ready to receive
    fn is_open(&self) -> bool;

    /// Queue an encoded message for delivery
    fn send(&self, payload: Bytes) -> Result<(), SendError>;

    /// Ask the transport to drop the connection
    ///
    /// Used when a connection falls behind. The transport must end the
    /// connection and report it through `on_close`, so the remaining members
    /// get a corrected presence count and the client can reconnect and resync.
    fn close(&self);
}
