//! Registry error types
//!
//! None of these reach a client. The router logs them and drops the event.

use super::key::{BoxId, ConnectionId};

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Connection is not a member of any box
    NotJoined(ConnectionId),
    /// Box has no text record (never created or already evicted)
    BoxNotFound(BoxId),
    /// Text exceeds the configured maximum length
    TextTooLarge { len: usize, max: usize },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::NotJoined(id) => write!(f, "Connection {} has not joined a box", id),
            RegistryError::BoxNotFound(id) => write!(f, "Box not found: {}", id),
            RegistryError::TextTooLarge { len, max } => {
                write!(f, "Text too large: {} bytes (max {})", len, max)
            }
        }
    }
}

impl std::error::Error for RegistryError {}
