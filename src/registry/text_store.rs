//! In-memory key-value store of box texts
//!
//! The store is the only place box text lives. The live event path mutates it
//! through the registry; page and read collaborators use `ensure`/`get`.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use super::entry::BoxEntry;
use super::key::BoxId;

/// Box text records keyed by box id
#[derive(Debug, Default)]
pub struct TextStore {
    entries: HashMap<BoxId, BoxEntry>,
}

impl TextStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a box's record
    pub fn get(&self, id: &BoxId) -> Option<&BoxEntry> {
        self.entries.get(id)
    }

    /// Get a mutable reference to a box's record
    pub fn get_mut(&mut self, id: &BoxId) -> Option<&mut BoxEntry> {
        self.entries.get_mut(id)
    }

    /// Insert or replace a box's record
    pub fn insert(&mut self, id: BoxId, entry: BoxEntry) -> Option<BoxEntry> {
        self.entries.insert(id, entry)
    }

    /// Remove a box's record
    pub fn remove(&mut self, id: &BoxId) -> Option<BoxEntry> {
        self.entries.remove(id)
    }

    /// Check whether a box exists
    pub fn contains(&self, id: &BoxId) -> bool {
        self.entries.contains_key(id)
    }

    /// Create an empty record for `id` unless one exists
    ///
    /// Returns true if a record was created.
    pub fn ensure(&mut self, id: &BoxId, now: SystemTime) -> bool {
        if self.contains(id) {
            return false;
        }
        self.insert(id.clone(), BoxEntry::new(now));
        true
    }

    /// Remove every record older than `max_age` at `now`
    ///
    /// Returns the evicted ids.
    pub fn evict_stale(&mut self, now: SystemTime, max_age: Duration) -> Vec<BoxId> {
        let stale: Vec<BoxId> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_stale(now, max_age))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stale {
            self.entries.remove(id);
        }

        stale
    }

    /// Number of stored boxes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
