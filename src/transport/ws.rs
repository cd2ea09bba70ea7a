//! WebSocket transport implementation
//!
//! Delivery queues are per-connection unbounded channels of encoded JSON
//! frames; the server's writer tasks drain them into the WebSocket sinks.
//! Room membership lives here because the transport is what a "room" is
//! derived from; the presence records stay in the registry.

use std::collections::{HashMap, HashSet};

use tokio::sync::{mpsc, RwLock};

use async_trait::async_trait;

use crate::protocol::{ConnectionId, RoomId, ServerEvent};

use super::{Transport, TransportError};

/// WebSocket-backed transport
///
/// Thread-safe via `RwLock`; broadcasts and membership enumerations are
/// read-heavy, mutation only happens on connect/disconnect/join/leave.
#[derive(Default)]
pub struct WsTransport {
    /// Per-connection outbound frame queues
    peers: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<String>>>,

    /// Derived room membership (room id to member set)
    rooms: RwLock<HashMap<RoomId, HashSet<ConnectionId>>>,
}

impl WsTransport {
    /// Create an empty transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a connection's delivery queue
    ///
    /// Called by the server when a WebSocket finishes its handshake, before
    /// any event from that connection is dispatched.
    pub async fn register(&self, conn: ConnectionId, tx: mpsc::UnboundedSender<String>) {
        self.peers.write().await.insert(conn, tx);
        tracing::debug!(conn_id = %conn, "Connection registered");
    }

    /// Detach a connection's delivery queue
    ///
    /// Idempotent. Room membership cleanup is driven separately by the
    /// coordinator's disconnect handling so the member-left broadcast goes
    /// out before the membership view changes underneath it.
    pub async fn unregister(&self, conn: ConnectionId) {
        self.peers.write().await.remove(&conn);
        tracing::debug!(conn_id = %conn, "Connection unregistered");
    }

    /// Number of live connections
    pub async fn connection_count(&self) -> usize {
        self.peers.read().await.len()
    }

    /// Number of rooms with at least one member
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    async fn deliver(&self, target: ConnectionId, frame: &str) -> bool {
        let peers = self.peers.read().await;
        match peers.get(&target) {
            Some(tx) => tx.send(frame.to_string()).is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&self, target: ConnectionId, event: &ServerEvent) -> bool {
        let frame = match event.encode() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode outbound event");
                return false;
            }
        };

        let delivered = self.deliver(target, &frame).await;
        if !delivered {
            tracing::debug!(conn_id = %target, "Unicast dropped: target not live");
        }
        delivered
    }

    async fn broadcast(&self, room: &RoomId, event: &ServerEvent, exclude: Option<ConnectionId>) {
        let frame = match event.encode() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode outbound event");
                return;
            }
        };

        let members: Vec<ConnectionId> = {
            let rooms = self.rooms.read().await;
            match rooms.get(room) {
                Some(set) => set.iter().copied().collect(),
                None => return,
            }
        };

        for member in members {
            if Some(member) == exclude {
                continue;
            }
            self.deliver(member, &frame).await;
        }
    }

    async fn join_room(&self, room: &RoomId, conn: ConnectionId) {
        let mut rooms = self.rooms.write().await;
        let members = rooms.entry(room.clone()).or_default();
        if members.insert(conn) {
            tracing::debug!(conn_id = %conn, room = %room, members = members.len(), "Joined room");
        }
    }

    async fn leave_room(&self, room: &RoomId, conn: ConnectionId) {
        let mut rooms = self.rooms.write().await;
        if let Some(members) = rooms.get_mut(room) {
            members.remove(&conn);
            if members.is_empty() {
                // Last member out; the room ceases to exist
                rooms.remove(room);
                tracing::debug!(room = %room, "Room emptied");
            }
        }
    }

    async fn room_members(&self, room: &RoomId) -> Result<Vec<ConnectionId>, TransportError> {
        let rooms = self.rooms.read().await;
        let mut members: Vec<ConnectionId> = rooms
            .get(room)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        members.sort();
        Ok(members)
    }
}
