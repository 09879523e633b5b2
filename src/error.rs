//! Crate-level error type
//!
//! Only the transport can fail. The router and registry degrade every failure
//! to a logged no-op and never return these.

use tokio_tungstenite::tungstenite;

/// Result alias for transport operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for server and connection operations
#[derive(Debug)]
pub enum Error {
    /// Socket I/O failed
    Io(std::io::Error),
    /// WebSocket handshake or framing failed
    WebSocket(tungstenite::Error),
    /// Client did not finish the WebSocket handshake in time
    HandshakeTimeout(std::time::Duration),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::WebSocket(e) => write!(f, "WebSocket error: {}", e),
            Error::HandshakeTimeout(limit) => {
                write!(f, "WebSocket handshake timed out after {:?}", limit)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::WebSocket(e) => Some(e),
            Error::HandshakeTimeout(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<tungstenite::Error> for Error {
    fn from(e: tungstenite::Error) -> Self {
        Error::WebSocket(e)
    }
}
