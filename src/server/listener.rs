//! Signaling server listener
//!
//! Handles the TCP accept loop, WebSocket upgrades, and per-connection
//! reader/writer tasks. Every decoded inbound event funnels through one
//! mpsc channel into the coordinator's dispatch task, which serializes all
//! registry access: arrival order across the queue, FIFO per connection.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Semaphore};
use tokio_tungstenite::tungstenite::Message;

use crate::error::Result;
use crate::protocol::{ClientEvent, ConnectionId, ServerEvent};
use crate::room::{InboundEvent, RoomCoordinator};
use crate::server::config::ServerConfig;
use crate::stats::RelayStats;
use crate::transport::{Transport, WsTransport};

/// WebSocket signaling relay server
pub struct SignalServer {
    config: ServerConfig,
    transport: Arc<WsTransport>,
    stats: Arc<RelayStats>,
    next_conn_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl SignalServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            transport: Arc::new(WsTransport::new()),
            stats: Arc::new(RelayStats::new()),
            next_conn_id: AtomicU64::new(1),
            connection_semaphore,
        }
    }

    /// Get a reference to the transport
    pub fn transport(&self) -> &Arc<WsTransport> {
        &self.transport
    }

    /// Get a reference to the server counters
    pub fn stats(&self) -> &Arc<RelayStats> {
        &self.stats
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Signaling relay listening");

        let (dispatch_tx, dispatch_handle) = self.spawn_dispatch_task();
        let result = self.accept_loop(&listener, dispatch_tx).await;
        dispatch_handle.abort();
        result
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Signaling relay listening");

        let (dispatch_tx, dispatch_handle) = self.spawn_dispatch_task();

        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener, dispatch_tx) => result,
        };

        dispatch_handle.abort();
        result
    }

    /// Spawn the single task that owns the coordinator and its registry
    fn spawn_dispatch_task(
        &self,
    ) -> (mpsc::Sender<InboundEvent>, tokio::task::JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(self.config.dispatch_capacity);
        let transport: Arc<dyn Transport> = self.transport.clone();
        let stats = Arc::clone(&self.stats);

        let handle = tokio::spawn(async move {
            let mut coordinator = RoomCoordinator::new(transport, stats);
            while let Some(event) = rx.recv().await {
                match event {
                    InboundEvent::Client(conn, event) => {
                        coordinator.dispatch(conn, event).await;
                    }
                    InboundEvent::Disconnected(conn) => {
                        coordinator.handle_disconnect(conn).await;
                    }
                }
            }
        });

        (tx, handle)
    }

    async fn accept_loop(
        &self,
        listener: &TcpListener,
        dispatch_tx: mpsc::Sender<InboundEvent>,
    ) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr, dispatch_tx.clone());
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(
        &self,
        socket: TcpStream,
        peer_addr: SocketAddr,
        dispatch_tx: mpsc::Sender<InboundEvent>,
    ) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::debug!(error = %e, "Failed to set TCP_NODELAY");
            }
        }

        let conn_id = ConnectionId(self.next_conn_id.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(conn_id = %conn_id, peer = %peer_addr, "New connection");

        let transport = Arc::clone(&self.transport);
        let stats = Arc::clone(&self.stats);

        tokio::spawn(async move {
            let _permit = permit;

            let ws = match tokio_tungstenite::accept_async(socket).await {
                Ok(ws) => ws,
                Err(e) => {
                    tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket handshake failed");
                    return;
                }
            };

            let (mut sink, mut stream) = ws.split();
            let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
            transport.register(conn_id, out_tx).await;
            stats.connection_opened();

            let writer = tokio::spawn(async move {
                while let Some(frame) = out_rx.recv().await {
                    if sink.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
            });

            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => match ClientEvent::decode(&text) {
                        Ok(event) => {
                            if dispatch_tx
                                .send(InboundEvent::Client(conn_id, event))
                                .await
                                .is_err()
                            {
                                break;
                            }
                        }
                        Err(e) => {
                            // Reject the single event, reply to the sender
                            // only, no broadcast
                            tracing::warn!(conn_id = %conn_id, error = %e, "Rejected inbound event");
                            transport
                                .send(
                                    conn_id,
                                    &ServerEvent::InvalidEvent { reason: e.to_string() },
                                )
                                .await;
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {} // Binary/ping/pong frames carry no events
                    Err(e) => {
                        tracing::debug!(conn_id = %conn_id, error = %e, "Connection error");
                        break;
                    }
                }
            }

            // Abrupt closure and explicit leave share one cleanup path
            let _ = dispatch_tx.send(InboundEvent::Disconnected(conn_id)).await;
            transport.unregister(conn_id).await;
            stats.connection_closed();
            writer.abort();

            tracing::debug!(conn_id = %conn_id, "Connection closed");
        });
    }
}
