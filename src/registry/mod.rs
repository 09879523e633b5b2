//! Box registry for membership and text
//!
//! The registry owns every box's text and the set of connections viewing it.
//! It is a plain data structure: the router wraps it in one mutex and performs
//! all mutations and fan-out under that lock.
//!
//! # Architecture
//!
//! ```text
//!                        BoxRegistry<P>
//!            ┌──────────────────────────────────────┐
//!            │ texts:     BoxId ──► BoxEntry        │
//!            │ rooms:     BoxId ──► {ConnectionId}  │
//!            │ locations: ConnectionId ──► BoxId    │
//!            └──────────────────────────────────────┘
//!                 ▲              ▲             ▲
//!          join / leave     set_text      evict_stale
//!                 │              │             │
//!            [Router]       [Router]     [Sweep task]
//! ```
//!
//! `rooms` and `locations` are always updated together so `locate` is a
//! single lookup instead of a scan over every room.

pub mod config;
pub mod entry;
pub mod error;
pub mod key;
mod room;
pub mod store;
pub mod text_store;

pub use config::RegistryConfig;
pub use entry::{BoxEntry, RegistryStats};
pub use error::RegistryError;
pub use key::{BoxId, ConnectionId};
pub use store::{BoxRegistry, Departure, JoinOutcome};
pub use text_store::TextStore;
