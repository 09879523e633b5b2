//! Broadcast router implementation
//!
//! Translates inbound connection events into registry mutations and fans the
//! resulting messages out to the members of the affected box.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use tokio::sync::Mutex;

use crate::protocol::{encode_text_update, InboundMessage, OutboundMessage};
use crate::registry::{
    BoxId, BoxRegistry, ConnectionId, Departure, RegistryConfig, RegistryError, RegistryStats,
};

use super::peer::{Peer, SendError};

/// Routes connection events through the box registry
///
/// The registry lives behind a single mutex. Every event takes the lock once,
/// mutates, and queues its fan-out before releasing it, so the presence
/// counts each member sees are in the same order as the joins and leaves that
/// produced them.
pub struct BroadcastRouter<P> {
    /// Box texts and membership
    registry: Mutex<BoxRegistry<P>>,

    /// Configuration (copied out of the registry for lock-free access)
    config: RegistryConfig,
}

impl<P: Peer> BroadcastRouter<P> {
    /// Create a new router with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new router with custom registry configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            registry: Mutex::new(BoxRegistry::with_config(config.clone())),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Handle a raw inbound frame from a connection
    ///
    /// Malformed payloads are logged and discarded; unknown message types are
    /// ignored. Neither affects the registry or the connection.
    pub async fn on_message(&self, peer: &P, raw: &[u8]) {
        let message = match InboundMessage::decode(raw) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(
                    connection_id = %peer.id(),
                    len = raw.len(),
                    error = %e,
                    "Discarding malformed message"
                );
                return;
            }
        };

        match message {
            InboundMessage::Join { box_id } => {
                self.join(peer, BoxId::from(box_id)).await;
            }
            InboundMessage::TextUpdate { text } => {
                self.update_text(peer.id(), text).await;
            }
            InboundMessage::Unknown => {
                tracing::debug!(connection_id = %peer.id(), "Ignoring message of unknown type");
            }
        }
    }

    /// Handle a connection going away
    pub async fn on_close(&self, connection: ConnectionId) {
        let mut registry = self.registry.lock().await;

        if let Some(departure) = registry.leave(connection) {
            broadcast_presence(&registry, &departure);
        }
    }

    /// Add a connection to a box and announce the new presence count
    ///
    /// Every member, the joiner included, receives the count. Returns it.
    pub async fn join(&self, peer: &P, box_id: BoxId) -> usize {
        let mut registry = self.registry.lock().await;

        let outcome = registry.join(&box_id, peer.id(), peer.clone(), SystemTime::now());

        if let Some(previous) = &outcome.previous {
            broadcast_presence(&registry, previous);
        }

        match OutboundMessage::user_count(outcome.count).encode() {
            Ok(payload) => {
                fan_out(&registry, &box_id, &payload, None);
            }
            Err(e) => tracing::error!(box_id = %box_id, error = %e, "Failed to encode user count"),
        }

        outcome.count
    }

    /// Apply a text update from a connection and relay it to the other members
    ///
    /// Updates from connections outside any box, for boxes without a text
    /// record, or over the length limit are dropped without telling the
    /// sender. Returns the number of members the update was queued for.
    pub async fn update_text(&self, connection: ConnectionId, text: String) -> usize {
        let mut registry = self.registry.lock().await;

        let box_id = match registry.update_from(connection, text, SystemTime::now()) {
            Ok(box_id) => box_id,
            Err(e @ RegistryError::TextTooLarge { .. }) => {
                tracing::warn!(connection_id = %connection, error = %e, "Dropping text update");
                return 0;
            }
            Err(e) => {
                tracing::debug!(connection_id = %connection, error = %e, "Dropping text update");
                return 0;
            }
        };

        let encoded = match registry.text(&box_id) {
            Some(entry) => encode_text_update(&entry.text),
            None => return 0,
        };

        match encoded {
            Ok(payload) => fan_out(&registry, &box_id, &payload, Some(connection)),
            Err(e) => {
                tracing::error!(box_id = %box_id, error = %e, "Failed to encode text update");
                0
            }
        }
    }

    /// Remove every box not updated within `max_age` of `now`
    pub async fn evict_stale(&self, now: SystemTime, max_age: Duration) -> Vec<BoxId> {
        let evicted = self.registry.lock().await.evict_stale(now, max_age);

        if !evicted.is_empty() {
            tracing::info!(count = evicted.len(), "Evicted stale boxes");
        }

        evicted
    }

    /// Run one eviction sweep with the configured retention
    pub async fn sweep(&self) -> Vec<BoxId> {
        self.evict_stale(SystemTime::now(), self.config.retention)
            .await
    }

    /// Spawn background eviction task
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn spawn_sweep_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let router = Arc::clone(self);
        let interval = router.config.sweep_interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                router.sweep().await;
            }
        })
    }

    /// Current text of a box
    pub async fn text(&self, box_id: &BoxId) -> Option<String> {
        self.registry
            .lock()
            .await
            .text(box_id)
            .map(|entry| entry.text.clone())
    }

    /// Create an empty box unless it exists
    ///
    /// Returns true if the box was created.
    pub async fn ensure_box(&self, box_id: &BoxId) -> bool {
        self.registry
            .lock()
            .await
            .ensure_box(box_id, SystemTime::now())
    }

    /// Whether a box has a text record
    pub async fn contains_box(&self, box_id: &BoxId) -> bool {
        self.registry.lock().await.contains_box(box_id)
    }

    /// Delete a box's text record
    ///
    /// Viewers stay joined; their updates are dropped until the box is
    /// recreated by a join.
    pub async fn remove_box(&self, box_id: &BoxId) -> Option<String> {
        let removed = self.registry.lock().await.remove_box(box_id);

        if removed.is_some() {
            tracing::info!(box_id = %box_id, "Box removed");
        }

        removed.map(|entry| entry.text)
    }

    /// Box a connection is currently viewing
    pub async fn locate(&self, connection: ConnectionId) -> Option<BoxId> {
        self.registry.lock().await.locate(connection).cloned()
    }

    /// Number of connections viewing a box
    pub async fn member_count(&self, box_id: &BoxId) -> usize {
        self.registry.lock().await.member_count(box_id)
    }

    /// Get registry occupancy
    pub async fn stats(&self) -> RegistryStats {
        self.registry.lock().await.stats()
    }
}

impl<P: Peer> Default for BroadcastRouter<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Send the remaining member count of a box after a departure
fn broadcast_presence<P: Peer>(registry: &BoxRegistry<P>, departure: &Departure) {
    if departure.remaining == 0 {
        return;
    }

    match OutboundMessage::user_count(departure.remaining).encode() {
        Ok(payload) => {
            fan_out(registry, &departure.box_id, &payload, None);
        }
        Err(e) => {
            tracing::error!(box_id = %departure.box_id, error = %e, "Failed to encode user count")
        }
    }
}

/// Queue a payload for every open member of a box except `exclude`
///
/// Returns the number of members it was queued for.
fn fan_out<P: Peer>(
    registry: &BoxRegistry<P>,
    box_id: &BoxId,
    payload: &Bytes,
    exclude: Option<ConnectionId>,
) -> usize {
    let mut delivered = 0;

    for (id, peer) in registry.members(box_id) {
        if exclude == Some(id) || !peer.is_open() {
            continue;
        }

        match peer.send(payload.clone()) {
            Ok(()) => delivered += 1,
            Err(SendError::Closed) => {
                tracing::trace!(box_id = %box_id, connection_id = %id, "Skipping closed connection");
            }
            Err(SendError::QueueFull) => {
                tracing::warn!(
                    box_id = %box_id,
                    connection_id = %id,
                    "Slow connection, closing it"
                );
                peer.close();
            }
        }
    }

    delivered
}
