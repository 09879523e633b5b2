//! Real-time collaborative text box relay
//!
//! Clients attach to a named shared text buffer (a "box") over a WebSocket and
//! see each other's edits live. Concurrent edits resolve by last write wins:
//! every text update replaces the whole buffer and is relayed to the other
//! viewers of the box, and every join or leave announces the new viewer count.
//!
//! # Example
//!
//! ```no_run
//! use textbox_relay::{RelayServer, ServerConfig};
//!
//! # async fn run() -> textbox_relay::Result<()> {
//! let server = RelayServer::new(ServerConfig::default());
//! server.run_until(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! }).await
//! # }
//! ```

pub mod error;
pub mod protocol;
pub mod registry;
pub mod router;
pub mod server;

pub use error::{Error, Result};
pub use registry::{BoxId, ConnectionId, RegistryConfig};
pub use router::{BroadcastRouter, Peer};
pub use server::{RelayServer, ServerConfig};
