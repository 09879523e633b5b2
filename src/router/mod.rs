//! Broadcast routing between connections
//!
//! The router receives three kinds of events from the transport and turns
//! each into one registry mutation plus one fan-out:
//!
//! ```text
//!   join {boxId}       ──► registry.join      ──► userCount  ──► all members
//!   textUpdate {text}  ──► registry.set_text  ──► textUpdate ──► members except sender
//!   close              ──► registry.leave     ──► userCount  ──► remaining members
//! ```
//!
//! Outbound messages are serialized once and shared between recipients as
//! `bytes::Bytes`. Delivery goes through the [`Peer`] trait, which the
//! transport implements on its per-connection handle.

pub mod broadcast;
pub mod peer;

pub use broadcast::BroadcastRouter;
pub use peer::{Peer, SendError};
