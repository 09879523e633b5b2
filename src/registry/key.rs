//! Identifier types for boxes and connections

/// Opaque identifier of a shared text box
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoxId(String);

impl BoxId {
    /// Create a new box id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BoxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BoxId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BoxId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identity of a live connection
///
/// Allocated by the transport, unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_id_display() {
        let id = BoxId::new("room1");
        assert_eq!(id.to_string(), "room1");
        assert_eq!(id.as_str(), "room1");
        assert_eq!(BoxId::from("room1"), id);
    }

    #[test]
    fn test_connection_id_ordering() {
        assert!(ConnectionId(1) < ConnectionId(2));
        assert_eq!(ConnectionId(7).to_string(), "7");
    }
}
