//! Membership set of a single box

use std::collections::HashMap;

use super::key::ConnectionId;

/// Connections currently viewing one box
#[derive(Debug)]
pub(super) struct Room<P> {
    members: HashMap<ConnectionId, P>,
}

impl<P> Room<P> {
    pub(super) fn new() -> Self {
        Self {
            members: HashMap::new(),
        }
    }

    /// Add a member, replacing any handle with the same id
    pub(super) fn insert(&mut self, id: ConnectionId, peer: P) {
        self.members.insert(id, peer);
    }

    pub(super) fn remove(&mut self, id: ConnectionId) -> Option<P> {
        self.members.remove(&id)
    }

    pub(super) fn contains(&self, id: ConnectionId) -> bool {
        self.members.contains_key(&id)
    }

    pub(super) fn len(&self) -> usize {
        self.members.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = (ConnectionId, &P)> {
        self.members.iter().map(|(id, peer)| (*id, peer))
    }
}
