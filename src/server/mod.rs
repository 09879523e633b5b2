//! WebSocket relay server
//!
//! Accepts TCP connections, upgrades them to WebSockets and feeds their
//! frames and disconnects to a shared [`BroadcastRouter`](crate::router::BroadcastRouter).

pub mod config;
pub mod connection;
pub mod listener;

pub use config::ServerConfig;
pub use connection::ConnectionHandle;
pub use listener::RelayServer;
