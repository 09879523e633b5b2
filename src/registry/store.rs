//! Box registry implementation
//!
//! The central registry that owns box texts and the membership of live
//! connections. It performs no locking and no I/O; the router owns it behind a
//! single mutex so every mutation and the fan-out it triggers are serialized.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use super::config::RegistryConfig;
use super::entry::{BoxEntry, RegistryStats};
use super::error::RegistryError;
use super::key::{BoxId, ConnectionId};
use super::room::Room;
use super::text_store::TextStore;

/// A connection leaving a box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// Box the connection was a member of
    pub box_id: BoxId,
    /// Members left in the box after removal
    pub remaining: usize,
}

/// Result of a join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// Member count of the joined box, including the joiner
    pub count: usize,
    /// Box the connection was moved out of, if it was in a different one
    pub previous: Option<Departure>,
}

/// Central registry for boxes and their viewers
///
/// Membership is kept in two maps updated together: box to members, and
/// connection to box. A connection appears in `locations` exactly when it
/// is a member of the room that entry names.
#[derive(Debug)]
pub struct BoxRegistry<P> {
    /// Box text records
    texts: TextStore,

    /// Live viewers per box (only non-empty rooms are kept)
    rooms: HashMap<BoxId, Room<P>>,

    /// Reverse index: which box each connection is in
    locations: HashMap<ConnectionId, BoxId>,

    /// Configuration
    config: RegistryConfig,
}

impl<P> BoxRegistry<P> {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            texts: TextStore::new(),
            rooms: HashMap::new(),
            locations: HashMap::new(),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a connection as a viewer of a box
    ///
    /// Creates the box text record and the room if absent. A connection that
    /// is already in another box is moved out of it first.
    pub fn join(
        &mut self,
        box_id: &BoxId,
        connection: ConnectionId,
        peer: P,
        now: SystemTime,
    ) -> JoinOutcome {
        let moving = self
            .locations
            .get(&connection)
            .is_some_and(|current| current != box_id);
        let previous = if moving { self.leave(connection) } else { None };

        if self.texts.ensure(box_id, now) {
            tracing::debug!(box_id = %box_id, "Box created on join");
        }

        let room = self.rooms.entry(box_id.clone()).or_insert_with(|| {
            tracing::debug!(box_id = %box_id, "Room opened");
            Room::new()
        });
        room.insert(connection, peer);
        let count = room.len();

        self.locations.insert(connection, box_id.clone());

        tracing::debug!(
            box_id = %box_id,
            connection_id = %connection,
            members = count,
            "Connection joined box"
        );

        JoinOutcome { count, previous }
    }

    /// Find the box a connection is viewing
    pub fn locate(&self, connection: ConnectionId) -> Option<&BoxId> {
        self.locations.get(&connection)
    }

    /// Remove a connection from its box
    ///
    /// The room is dropped once its last member leaves; the box text stays.
    pub fn leave(&mut self, connection: ConnectionId) -> Option<Departure> {
        let box_id = self.locations.remove(&connection)?;

        let remaining = match self.rooms.get_mut(&box_id) {
            Some(room) => {
                room.remove(connection);
                room.len()
            }
            None => 0,
        };

        if remaining == 0 && self.rooms.remove(&box_id).is_some() {
            tracing::debug!(box_id = %box_id, "Room closed, no viewers left");
        }

        tracing::debug!(
            box_id = %box_id,
            connection_id = %connection,
            members = remaining,
            "Connection left box"
        );

        Some(Departure { box_id, remaining })
    }

    /// Overwrite a box's text and refresh its timestamp
    ///
    /// Content is accepted verbatim; only its length is checked.
    pub fn set_text(
        &mut self,
        box_id: &BoxId,
        text: String,
        now: SystemTime,
    ) -> Result<(), RegistryError> {
        if !self.config.accepts_len(text.len()) {
            return Err(RegistryError::TextTooLarge {
                len: text.len(),
                max: self.config.max_text_len,
            });
        }

        let entry = self
            .texts
            .get_mut(box_id)
            .ok_or_else(|| RegistryError::BoxNotFound(box_id.clone()))?;
        entry.update(text, now);

        Ok(())
    }

    /// Apply a text update on behalf of a connection
    ///
    /// Resolves the connection's box and overwrites its text. Returns the box
    /// that was updated.
    pub fn update_from(
        &mut self,
        connection: ConnectionId,
        text: String,
        now: SystemTime,
    ) -> Result<BoxId, RegistryError> {
        let box_id = self
            .locate(connection)
            .cloned()
            .ok_or(RegistryError::NotJoined(connection))?;

        self.set_text(&box_id, text, now)?;

        Ok(box_id)
    }

    /// Remove every box not updated within `max_age` of `now`
    ///
    /// Membership is untouched: viewers of an evicted box stay joined, and
    /// their further updates are dropped until someone joins it again.
    pub fn evict_stale(&mut self, now: SystemTime, max_age: Duration) -> Vec<BoxId> {
        let evicted = self.texts.evict_stale(now, max_age);

        for box_id in &evicted {
            tracing::debug!(box_id = %box_id, "Box evicted");
        }

        evicted
    }

    /// Iterate the members of a box
    pub fn members<'a>(
        &'a self,
        box_id: &BoxId,
    ) -> impl Iterator<Item = (ConnectionId, &'a P)> + 'a {
        self.rooms.get(box_id).into_iter().flat_map(|room| room.iter())
    }

    /// Number of connections viewing a box
    pub fn member_count(&self, box_id: &BoxId) -> usize {
        self.rooms.get(box_id).map_or(0, |room| room.len())
    }

    /// Whether a box currently has a room (at least one viewer)
    pub fn has_room(&self, box_id: &BoxId) -> bool {
        self.rooms.get(box_id).is_some_and(|room| !room.is_empty())
    }

    /// Whether a connection is a member of the given box
    pub fn is_member(&self, box_id: &BoxId, connection: ConnectionId) -> bool {
        self.rooms
            .get(box_id)
            .is_some_and(|room| room.contains(connection))
    }

    /// Get a box's text record
    pub fn text(&self, box_id: &BoxId) -> Option<&BoxEntry> {
        self.texts.get(box_id)
    }

    /// Create an empty box unless it exists
    pub fn ensure_box(&mut self, box_id: &BoxId, now: SystemTime) -> bool {
        self.texts.ensure(box_id, now)
    }

    /// Whether a box has a text record
    pub fn contains_box(&self, box_id: &BoxId) -> bool {
        self.texts.contains(box_id)
    }

    /// Delete a box's text record
    pub fn remove_box(&mut self, box_id: &BoxId) -> Option<BoxEntry> {
        self.texts.remove(box_id)
    }

    /// Get registry occupancy
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            box_count: self.texts.len(),
            room_count: self.rooms.len(),
            connection_count: self.locations.len(),
        }
    }
}

impl<P> Default for BoxRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(86_400);

    fn t0() -> SystemTime {
        SystemTime::UNIX_EPOCH + 1000 * DAY
    }

    #[test]
    fn test_join_counts() {
        let mut registry = BoxRegistry::new();
        let room = BoxId::new("room1");

        for k in 1..=5u64 {
            let outcome = registry.join(&room, ConnectionId(k), (), t0());
            assert_eq!(outcome.count, k as usize);
            assert!(outcome.previous.is_none());
        }

        assert_eq!(registry.member_count(&room), 5);
        assert!(registry.text(&room).is_some()); // Created on first join
    }

    #[test]
    fn test_rejoin_same_box_is_noop() {
        let mut registry = BoxRegistry::new();
        let room = BoxId::new("room1");

        registry.join(&room, ConnectionId(1), (), t0());
        let outcome = registry.join(&room, ConnectionId(1), (), t0());

        assert_eq!(outcome.count, 1);
        assert!(outcome.previous.is_none());
    }

    #[test]
    fn test_join_other_box_moves_connection() {
        let mut registry = BoxRegistry::new();
        let a = BoxId::new("a");
        let b = BoxId::new("b");

        registry.join(&a, ConnectionId(1), (), t0());
        registry.join(&a, ConnectionId(2), (), t0());
        let outcome = registry.join(&b, ConnectionId(1), (), t0());

        assert_eq!(outcome.count, 1);
        assert_eq!(
            outcome.previous,
            Some(Departure {
                box_id: a.clone(),
                remaining: 1
            })
        );
        assert!(!registry.is_member(&a, ConnectionId(1)));
        assert!(registry.is_member(&b, ConnectionId(1)));
        assert_eq!(registry.locate(ConnectionId(1)), Some(&b));
    }

    #[test]
    fn test_leave_last_member_removes_room_keeps_text() {
        let mut registry = BoxRegistry::new();
        let room = BoxId::new("room1");

        registry.join(&room, ConnectionId(1), (), t0());
        registry
            .update_from(ConnectionId(1), "kept".to_string(), t0())
            .unwrap();

        let departure = registry.leave(ConnectionId(1)).unwrap();
        assert_eq!(departure.box_id, room);
        assert_eq!(departure.remaining, 0);

        assert!(!registry.has_room(&room));
        assert_eq!(registry.stats().room_count, 0);
        assert_eq!(registry.text(&room).unwrap().text, "kept");
    }

    #[test]
    fn test_leave_unknown_connection() {
        let mut registry: BoxRegistry<()> = BoxRegistry::new();
        assert!(registry.leave(ConnectionId(9)).is_none());
    }

    #[test]
    fn test_update_from_non_member_is_rejected() {
        let mut registry: BoxRegistry<()> = BoxRegistry::new();
        registry.ensure_box(&BoxId::new("room1"), t0());

        let result = registry.update_from(ConnectionId(1), "x".to_string(), t0());

        assert_eq!(result, Err(RegistryError::NotJoined(ConnectionId(1))));
        assert_eq!(registry.text(&BoxId::new("room1")).unwrap().text, "");
    }

    #[test]
    fn test_update_after_eviction_is_rejected() {
        let mut registry = BoxRegistry::new();
        let room = BoxId::new("room1");

        registry.join(&room, ConnectionId(1), (), t0());
        let evicted = registry.evict_stale(t0() + 31 * DAY, 30 * DAY);
        assert_eq!(evicted, vec![room.clone()]);

        // Still a member, but the text record is gone
        assert!(registry.is_member(&room, ConnectionId(1)));
        let result = registry.update_from(ConnectionId(1), "x".to_string(), t0() + 31 * DAY);
        assert_eq!(result, Err(RegistryError::BoxNotFound(room.clone())));
        assert!(registry.text(&room).is_none());
    }

    #[test]
    fn test_set_text_refreshes_timestamp() {
        let mut registry: BoxRegistry<()> = BoxRegistry::new();
        let room = BoxId::new("room1");
        registry.ensure_box(&room, t0());

        registry
            .set_text(&room, "new".to_string(), t0() + DAY)
            .unwrap();

        let entry = registry.text(&room).unwrap();
        assert_eq!(entry.text, "new");
        assert_eq!(entry.last_updated, t0() + DAY);
    }

    #[test]
    fn test_set_text_too_large() {
        let config = RegistryConfig::default().max_text_len(3);
        let mut registry: BoxRegistry<()> = BoxRegistry::with_config(config);
        let room = BoxId::new("room1");
        registry.ensure_box(&room, t0());

        let result = registry.set_text(&room, "abcd".to_string(), t0());

        assert_eq!(result, Err(RegistryError::TextTooLarge { len: 4, max: 3 }));
        assert_eq!(registry.text(&room).unwrap().text, "");
    }

    #[test]
    fn test_evict_ignores_membership() {
        let mut registry = BoxRegistry::new();
        let viewed = BoxId::new("viewed");
        let idle = BoxId::new("idle");

        registry.join(&viewed, ConnectionId(1), (), t0());
        registry.ensure_box(&idle, t0() + 10 * DAY);
        registry.leave(ConnectionId(1));

        // Zero viewers but inside the window: survives
        let evicted = registry.evict_stale(t0() + 30 * DAY, 30 * DAY);
        assert!(evicted.is_empty());
        assert!(registry.text(&viewed).is_some());

        let evicted = registry.evict_stale(t0() + 35 * DAY, 30 * DAY);
        assert_eq!(evicted, vec![viewed]);
        assert!(registry.text(&idle).is_some());
    }

    #[test]
    fn test_stats() {
        let mut registry = BoxRegistry::new();
        registry.join(&BoxId::new("a"), ConnectionId(1), (), t0());
        registry.join(&BoxId::new("a"), ConnectionId(2), (), t0());
        registry.join(&BoxId::new("b"), ConnectionId(3), (), t0());
        registry.ensure_box(&BoxId::new("c"), t0());

        assert_eq!(
            registry.stats(),
            RegistryStats {
                box_count: 3,
                room_count: 2,
                connection_count: 3,
            }
        );
    }
}
