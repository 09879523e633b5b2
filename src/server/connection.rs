//! Per-connection WebSocket handling
//!
//! Each accepted socket gets one task. The task upgrades the socket, then
//! multiplexes inbound frames (handed to the router) and the connection's
//! outbound queue (filled by the router's fan-out) until either side closes.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Notify};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;

use crate::error::{Error, Result};
use crate::registry::ConnectionId;
use crate::router::{BroadcastRouter, Peer, SendError};
use crate::server::config::ServerConfig;

/// Router handle to a connection's outbound queue
///
/// Cheap to clone; the registry keeps one clone per joined connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::Sender<Bytes>,
    open: Arc<AtomicBool>,
    closed: Arc<Notify>,
}

impl ConnectionHandle {
    /// Create a handle and the receiving end of its outbound queue
    pub fn new(id: ConnectionId, capacity: usize) -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id,
            tx,
            open: Arc::new(AtomicBool::new(true)),
            closed: Arc::new(Notify::new()),
        };
        (handle, rx)
    }

    /// Wait until the connection is marked as closing
    pub async fn closed(&self) {
        if !self.open.load(Ordering::Acquire) {
            return;
        }
        self.closed.notified().await;
    }
}

impl Peer for ConnectionHandle {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire) && !self.tx.is_closed()
    }

    fn send(&self, payload: Bytes) -> std::result::Result<(), SendError> {
        self.tx.try_send(payload).map_err(|e| match e {
            TrySendError::Full(_) => SendError::QueueFull,
            TrySendError::Closed(_) => SendError::Closed,
        })
    }

    /// Mark the connection as closing and wake its task
    ///
    /// Fan-out skips it from this point on.
    fn close(&self) {
        self.open.store(false, Ordering::Release);
        self.closed.notify_one();
    }
}

/// A single client connection
pub struct Connection {
    handle: ConnectionHandle,
    outbound_rx: mpsc::Receiver<Bytes>,
    socket: TcpStream,
    peer_addr: SocketAddr,
    config: ServerConfig,
    router: Arc<BroadcastRouter<ConnectionHandle>>,
}

impl Connection {
    /// Create a new connection over an accepted socket
    pub fn new(
        connection_id: ConnectionId,
        socket: TcpStream,
        peer_addr: SocketAddr,
        config: ServerConfig,
        router: Arc<BroadcastRouter<ConnectionHandle>>,
    ) -> Self {
        let (handle, outbound_rx) =
            ConnectionHandle::new(connection_id, config.outbound_queue_capacity);

        Self {
            handle,
            outbound_rx,
            socket,
            peer_addr,
            config,
            router,
        }
    }

    /// Run the connection until the client disconnects
    ///
    /// Once the WebSocket handshake has completed, the router is told about
    /// the disconnect whatever ended the connection. A socket that fails or
    /// times out during the handshake never reached the router.
    pub async fn run(self) -> Result<()> {
        let Connection {
            handle,
            mut outbound_rx,
            socket,
            peer_addr,
            config,
            router,
        } = self;

        let mut ws_config = WebSocketConfig::default();
        ws_config.max_message_size = Some(config.max_message_size);
        ws_config.max_frame_size = Some(config.max_message_size);

        let ws = accept_with_timeout(socket, ws_config, config.connection_timeout).await?;
        let (mut ws_tx, mut ws_rx) = ws.split();

        tracing::debug!(
            connection_id = %handle.id(),
            peer = %peer_addr,
            "WebSocket connection established"
        );

        let result: Result<()> = loop {
            tokio::select! {
                // Server -> client
                Some(payload) = outbound_rx.recv() => {
                    // tungstenite 0.24 frames own their text, so each recipient
                    // gets one copy of the shared payload here
                    let text = match std::str::from_utf8(&payload) {
                        Ok(text) => text.to_owned(),
                        Err(e) => {
                            tracing::error!(connection_id = %handle.id(), error = %e, "Outbound payload is not UTF-8");
                            continue;
                        }
                    };
                    if let Err(e) = ws_tx.send(Message::Text(text)).await {
                        break Err(Error::from(e));
                    }
                }

                // Client -> server
                frame = ws_rx.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            router.on_message(&handle, text.as_bytes()).await;
                        }
                        Some(Ok(Message::Binary(data))) => {
                            router.on_message(&handle, &data).await;
                        }
                        Some(Ok(Message::Close(_))) | None => break Ok(()),
                        Some(Ok(_)) => {} // Ping/pong are answered by tungstenite
                        Some(Err(e)) => break Err(Error::from(e)),
                    }
                }

                // Router gave up on this connection
                _ = handle.closed() => {
                    tracing::debug!(connection_id = %handle.id(), "Closing lagging connection");
                    break Ok(());
                }
            }
        };

        handle.close();
        router.on_close(handle.id()).await;
        let _ = ws_tx.close().await;

        tracing::debug!(connection_id = %handle.id(), peer = %peer_addr, "WebSocket connection closed");

        result
    }
}

/// Perform the WebSocket handshake within `limit`
async fn accept_with_timeout(
    socket: TcpStream,
    ws_config: WebSocketConfig,
    limit: Duration,
) -> Result<tokio_tungstenite::WebSocketStream<TcpStream>> {
    match tokio::time::timeout(
        limit,
        tokio_tungstenite::accept_async_with_config(socket, Some(ws_config)),
    )
    .await
    {
        Ok(ws) => Ok(ws?),
        Err(_) => Err(Error::HandshakeTimeout(limit)),
    }
}
