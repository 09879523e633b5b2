//! Box entry and statistics types
//!
//! This module defines the per-box state stored in the registry.

use std::time::{Duration, SystemTime};

/// Text record for a single box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxEntry {
    /// Current full buffer contents
    pub text: String,

    /// Wall-clock time of the last accepted update (or creation)
    pub last_updated: SystemTime,
}

impl BoxEntry {
    /// Create an empty box stamped with `now`
    pub fn new(now: SystemTime) -> Self {
        Self {
            text: String::new(),
            last_updated: now,
        }
    }

    /// Overwrite the text and refresh the timestamp
    pub fn update(&mut self, text: String, now: SystemTime) {
        self.text = text;
        self.last_updated = now;
    }

    /// Whether the entry is older than `max_age` at `now`
    ///
    /// An entry exactly `max_age` old is not stale. Timestamps in the future
    /// (clock adjustments) are never stale.
    pub fn is_stale(&self, now: SystemTime, max_age: Duration) -> bool {
        match now.duration_since(self.last_updated) {
            Ok(age) => age > max_age,
            Err(_) => false,
        }
    }
}

/// Snapshot of registry occupancy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of stored box text records
    pub box_count: usize,
    /// Number of boxes with at least one viewer
    pub room_count: usize,
    /// Number of joined connections across all rooms
    pub connection_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(86_400);

    #[test]
    fn test_update_refreshes_timestamp() {
        let t0 = SystemTime::UNIX_EPOCH;
        let mut entry = BoxEntry::new(t0);
        assert!(entry.text.is_empty());

        entry.update("hello".to_string(), t0 + DAY);
        assert_eq!(entry.text, "hello");
        assert_eq!(entry.last_updated, t0 + DAY);
    }

    #[test]
    fn test_stale_boundary_is_exclusive() {
        let t0 = SystemTime::UNIX_EPOCH + DAY;
        let entry = BoxEntry::new(t0);

        assert!(!entry.is_stale(t0 + 30 * DAY, 30 * DAY));
        assert!(entry.is_stale(t0 + 30 * DAY + Duration::from_millis(1), 30 * DAY));
    }

    #[test]
    fn test_future_timestamp_not_stale() {
        let entry = BoxEntry::new(SystemTime::UNIX_EPOCH + DAY);
        assert!(!entry.is_stale(SystemTime::UNIX_EPOCH, Duration::ZERO));
    }
}
