//! Room coordinator state machine
//!
//! All handlers run on one dispatch task in arrival order, so the registry
//! needs no locking. Handlers do suspend on transport calls (enumeration,
//! broadcast); state may change across such an await, and every handler
//! re-validates registry lookups on resume instead of assuming them stable.
//!
//! The name check is deliberately advisory: check and join are separate
//! client round-trips, so two connections can both pass the check for the
//! same name before either joins. Joins never reject on collision; fixing
//! the race atomically would change observable protocol behavior.

use std::sync::Arc;

use crate::protocol::{ClientEvent, ConnectionId, MediaTarget, RoomId, ServerEvent};
use crate::registry::{ConnectionRegistry, PresenceRecord};
use crate::relay::SignalRelay;
use crate::stats::RelayStats;
use crate::transport::Transport;

/// One unit of work for the dispatch task
#[derive(Debug)]
pub enum InboundEvent {
    /// A decoded event from a client
    Client(ConnectionId, ClientEvent),
    /// The transport closed a connection (implicit leave)
    Disconnected(ConnectionId),
}

/// The relay's protocol state machine
///
/// Owns the connection registry (single writer) and drives the transport
/// for all presence fan-out. Created once per server and fed by a single
/// event channel.
pub struct RoomCoordinator {
    registry: ConnectionRegistry,
    relay: SignalRelay,
    transport: Arc<dyn Transport>,
    stats: Arc<RelayStats>,
}

impl RoomCoordinator {
    /// Create a coordinator over the given transport
    pub fn new(transport: Arc<dyn Transport>, stats: Arc<RelayStats>) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            relay: SignalRelay::new(transport.clone(), stats.clone()),
            transport,
            stats,
        }
    }

    /// Read-only view of the registry (used by tests and embedders)
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Handle one decoded client event
    pub async fn dispatch(&mut self, conn: ConnectionId, event: ClientEvent) {
        self.stats.event_dispatched();

        match event {
            ClientEvent::CheckName { call_id, user_name } => {
                self.check_name(conn, &call_id, &user_name).await;
            }
            ClientEvent::JoinCall { call_id, user_name } => {
                self.join(conn, call_id, user_name).await;
            }
            ClientEvent::CallOffer { target, from, signal } => {
                self.relay.relay_offer(&self.registry, target, from, signal).await;
            }
            ClientEvent::CallAnswer { target, signal } => {
                self.relay.relay_answer(target, conn, signal).await;
            }
            ClientEvent::SendMessage { call_id, message, sender_id } => {
                self.send_chat(conn, &call_id, message, sender_id).await;
            }
            ClientEvent::LeaveCall { call_id } => {
                self.leave(conn, &call_id).await;
            }
            ClientEvent::ToggleMedia { call_id, target } => {
                self.toggle_media(conn, &call_id, target).await;
            }
        }
    }

    /// Handle an abrupt transport closure as an implicit leave
    pub async fn handle_disconnect(&mut self, conn: ConnectionId) {
        let Some(room) = self.registry.room_of(conn).cloned() else {
            // Never joined, or already cleaned up
            return;
        };
        tracing::debug!(conn_id = %conn, room = %room, "Disconnect treated as leave");
        self.leave(conn, &room).await;
    }

    /// Advisory name-availability check, replied to the requester only
    async fn check_name(&mut self, conn: ConnectionId, room: &RoomId, user_name: &str) {
        let taken = match self.transport.room_members(room).await {
            Ok(members) => self.registry.name_in_use(&members, user_name),
            Err(e) => {
                tracing::warn!(room = %room, error = %e, "Name check enumeration failed");
                false
            }
        };

        self.transport
            .send(conn, &ServerEvent::NameCheckResult { taken })
            .await;
    }

    /// Register the connection in a room and announce the new member list
    async fn join(&mut self, conn: ConnectionId, room: RoomId, user_name: String) {
        // Membership is exclusive: joining while in another room leaves it
        // first, with the full member-left fan-out.
        if let Some(prev) = self.registry.room_of(conn).cloned() {
            if prev != room {
                tracing::debug!(conn_id = %conn, prev = %prev, next = %room, "Re-join, leaving prior room");
                self.leave(conn, &prev).await;
            }
        }

        self.transport.join_room(&room, conn).await;
        self.registry
            .upsert(conn, PresenceRecord::new(room.clone(), user_name));

        match self.transport.room_members(&room).await {
            Ok(members) => {
                tracing::info!(conn_id = %conn, room = %room, members = members.len(), "Member joined");

                // Snapshot includes the joiner; the broadcast excludes it.
                // Members that vanished since enumeration are skipped.
                let members = self.registry.snapshot(&members);
                self.transport
                    .broadcast(&room, &ServerEvent::MemberList { members }, Some(conn))
                    .await;
            }
            Err(e) => {
                tracing::error!(room = %room, error = %e, "Membership enumeration failed");
                self.transport
                    .broadcast(
                        &room,
                        &ServerEvent::JoinError { message: e.to_string() },
                        None,
                    )
                    .await;
            }
        }
    }

    /// Fan a chat payload out to the rest of the room (no sender echo)
    async fn send_chat(
        &mut self,
        conn: ConnectionId,
        room: &RoomId,
        message: String,
        sender_id: String,
    ) {
        self.transport
            .broadcast(
                room,
                &ServerEvent::MessageReceived { message, sender_id },
                Some(conn),
            )
            .await;
    }

    /// Remove a connection from a room and notify the remaining members
    ///
    /// Shared terminal path for explicit leave and disconnect. Idempotent:
    /// a connection that was never registered leaves no trace.
    async fn leave(&mut self, conn: ConnectionId, room: &RoomId) {
        self.registry.remove(conn);
        self.transport.leave_room(room, conn).await;
        self.transport
            .broadcast(
                room,
                &ServerEvent::MemberLeft { connection_id: conn },
                Some(conn),
            )
            .await;
        tracing::info!(conn_id = %conn, room = %room, "Member left");
    }

    /// Flip the caller's media flag and broadcast the resulting value
    async fn toggle_media(&mut self, conn: ConnectionId, room: &RoomId, target: MediaTarget) {
        let Some(record) = self.registry.get_mut(conn) else {
            // Toggle raced a disconnect; nothing to update
            tracing::debug!(conn_id = %conn, "Toggle for unregistered connection ignored");
            return;
        };
        let enabled = record.toggle(target);

        tracing::debug!(conn_id = %conn, target = %target, enabled = enabled, "Media toggled");

        self.transport
            .broadcast(
                room,
                &ServerEvent::MediaToggled { connection_id: conn, target, enabled },
                Some(conn),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{TransportError, WsTransport};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::mpsc;

    struct Harness {
        transport: Arc<WsTransport>,
        coordinator: RoomCoordinator,
        stats: Arc<RelayStats>,
    }

    impl Harness {
        async fn new() -> Self {
            let transport = Arc::new(WsTransport::new());
            let stats = Arc::new(RelayStats::new());
            let coordinator = RoomCoordinator::new(transport.clone(), stats.clone());
            Self { transport, coordinator, stats }
        }

        async fn connect(&self, id: u64) -> mpsc::UnboundedReceiver<String> {
            let (tx, rx) = mpsc::unbounded_channel();
            self.transport.register(ConnectionId(id), tx).await;
            rx
        }

        async fn join(&mut self, id: u64, room: &str, name: &str) {
            self.coordinator
                .dispatch(
                    ConnectionId(id),
                    ClientEvent::JoinCall {
                        call_id: RoomId::new(room),
                        user_name: name.to_string(),
                    },
                )
                .await;
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<Value> {
        let mut events = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            events.push(serde_json::from_str(&frame).unwrap());
        }
        events
    }

    #[tokio::test]
    async fn test_join_broadcasts_full_list_to_others_only() {
        let mut h = Harness::new().await;
        let mut rx1 = h.connect(1).await;
        let mut rx2 = h.connect(2).await;

        h.join(1, "room1", "Alice").await;
        // Sole member: the broadcast excludes the joiner, so nobody hears it
        assert!(drain(&mut rx1).is_empty());

        h.join(2, "room1", "Bob").await;

        let events = drain(&mut rx1);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["type"], "member-list");
        let members = events[0]["members"].as_array().unwrap();
        assert_eq!(members.len(), 2);
        let names: Vec<&str> =
            members.iter().map(|m| m["userName"].as_str().unwrap()).collect();
        assert!(names.contains(&"Alice"));
        assert!(names.contains(&"Bob"));

        // The joiner itself hears nothing
        assert!(drain(&mut rx2).is_empty());
    }

    #[tokio::test]
    async fn test_membership_tracks_joins_and_leaves() {
        let mut h = Harness::new().await;
        let _rx1 = h.connect(1).await;
        let _rx2 = h.connect(2).await;
        let _rx3 = h.connect(3).await;
        let room = RoomId::new("room1");

        h.join(1, "room1", "A").await;
        h.join(2, "room1", "B").await;
        h.join(3, "room1", "C").await;
        assert_eq!(h.transport.room_members(&room).await.unwrap().len(), 3);

        h.coordinator
            .dispatch(ConnectionId(2), ClientEvent::LeaveCall { call_id: room.clone() })
            .await;

        assert_eq!(
            h.transport.room_members(&room).await.unwrap(),
            vec![ConnectionId(1), ConnectionId(3)]
        );
        assert!(h.coordinator.registry().get(ConnectionId(2)).is_none());
    }

    #[tokio::test]
    async fn test_name_check_is_advisory_and_join_never_rejects() {
        let mut h = Harness::new().await;
        let mut rx_x = h.connect(1).await;
        let mut rx_y = h.connect(2).await;

        // X and Y both check "Alice" before either joins: both get false
        for id in [1, 2] {
            h.coordinator
                .dispatch(
                    ConnectionId(id),
                    ClientEvent::CheckName {
                        call_id: RoomId::new("room1"),
                        user_name: "Alice".to_string(),
                    },
                )
                .await;
        }
        let x_events = drain(&mut rx_x);
        let y_events = drain(&mut rx_y);
        assert_eq!(x_events[0]["type"], "name-check-result");
        assert_eq!(x_events[0]["taken"], false);
        assert_eq!(y_events[0]["taken"], false);

        // Both join anyway; the second broadcast lists two Alices
        h.join(1, "room1", "Alice").await;
        h.join(2, "room1", "Alice").await;

        let events = drain(&mut rx_x);
        let members = events[0]["members"].as_array().unwrap();
        assert_eq!(members.len(), 2);
        assert!(members.iter().all(|m| m["userName"] == "Alice"));

        // And a later check reports the collision
        h.coordinator
            .dispatch(
                ConnectionId(1),
                ClientEvent::CheckName {
                    call_id: RoomId::new("room1"),
                    user_name: "Alice".to_string(),
                },
            )
            .await;
        let events = drain(&mut rx_x);
        assert_eq!(events[0]["taken"], true);
    }

    #[tokio::test]
    async fn test_disconnect_equals_explicit_leave() {
        let mut h = Harness::new().await;
        let _rx1 = h.connect(1).await;
        let mut rx2 = h.connect(2).await;
        h.join(1, "room1", "A").await;
        h.join(2, "room1", "B").await;
        drain(&mut rx2);

        h.transport.unregister(ConnectionId(1)).await;
        h.coordinator.handle_disconnect(ConnectionId(1)).await;

        let events = drain(&mut rx2);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["type"], "member-left");
        assert_eq!(events[0]["connectionId"], 1);
        assert!(h.coordinator.registry().get(ConnectionId(1)).is_none());
        assert_eq!(
            h.transport.room_members(&RoomId::new("room1")).await.unwrap(),
            vec![ConnectionId(2)]
        );

        // Disconnect of a connection that never joined is a no-op
        h.coordinator.handle_disconnect(ConnectionId(9)).await;
        assert!(drain(&mut rx2).is_empty());
    }

    #[tokio::test]
    async fn test_toggle_camera_broadcast_and_registry_agree() {
        let mut h = Harness::new().await;
        let mut rx_bob = h.connect(1).await;
        let mut rx_other = h.connect(2).await;
        h.join(1, "room1", "Bob").await;
        h.join(2, "room1", "Eve").await;
        drain(&mut rx_bob);
        drain(&mut rx_other);

        h.coordinator
            .dispatch(
                ConnectionId(1),
                ClientEvent::ToggleMedia {
                    call_id: RoomId::new("room1"),
                    target: MediaTarget::Camera,
                },
            )
            .await;

        let events = drain(&mut rx_other);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["type"], "media-toggled");
        assert_eq!(events[0]["connectionId"], 1);
        assert_eq!(events[0]["target"], "camera");
        assert_eq!(events[0]["enabled"], false);

        // No echo to Bob
        assert!(drain(&mut rx_bob).is_empty());

        // Bob's record reflects the new camera value, mic untouched,
        // and Eve's flags are unaffected
        let bob = h.coordinator.registry().get(ConnectionId(1)).unwrap();
        assert!(!bob.camera_on);
        assert!(bob.microphone_on);
        let eve = h.coordinator.registry().get(ConnectionId(2)).unwrap();
        assert!(eve.camera_on);
        assert!(eve.microphone_on);
    }

    #[tokio::test]
    async fn test_toggle_after_disconnect_is_ignored() {
        let mut h = Harness::new().await;
        let _rx = h.connect(1).await;
        h.join(1, "room1", "A").await;
        h.coordinator.handle_disconnect(ConnectionId(1)).await;

        // Must not panic and must not resurrect a record
        h.coordinator
            .dispatch(
                ConnectionId(1),
                ClientEvent::ToggleMedia {
                    call_id: RoomId::new("room1"),
                    target: MediaTarget::Microphone,
                },
            )
            .await;
        assert!(h.coordinator.registry().get(ConnectionId(1)).is_none());
    }

    #[tokio::test]
    async fn test_chat_fans_out_without_echo() {
        let mut h = Harness::new().await;
        let mut rx1 = h.connect(1).await;
        let mut rx2 = h.connect(2).await;
        let mut rx3 = h.connect(3).await;
        h.join(1, "room1", "A").await;
        h.join(2, "room1", "B").await;
        h.join(3, "room1", "C").await;
        drain(&mut rx1);
        drain(&mut rx2);
        drain(&mut rx3);

        h.coordinator
            .dispatch(
                ConnectionId(1),
                ClientEvent::SendMessage {
                    call_id: RoomId::new("room1"),
                    message: "hi all".to_string(),
                    sender_id: "A".to_string(),
                },
            )
            .await;

        for rx in [&mut rx2, &mut rx3] {
            let events = drain(rx);
            assert_eq!(events.len(), 1);
            assert_eq!(events[0]["type"], "message-received");
            assert_eq!(events[0]["message"], "hi all");
            assert_eq!(events[0]["senderId"], "A");
        }
        assert!(drain(&mut rx1).is_empty());
    }

    #[tokio::test]
    async fn test_rejoin_other_room_leaves_first() {
        let mut h = Harness::new().await;
        let _rx1 = h.connect(1).await;
        let mut rx2 = h.connect(2).await;
        h.join(1, "room1", "A").await;
        h.join(2, "room1", "B").await;
        drain(&mut rx2);

        h.join(1, "room2", "A").await;

        // room1 saw the departure, and membership is exclusive
        let events = drain(&mut rx2);
        assert_eq!(events[0]["type"], "member-left");
        assert_eq!(events[0]["connectionId"], 1);
        assert_eq!(
            h.transport.room_members(&RoomId::new("room1")).await.unwrap(),
            vec![ConnectionId(2)]
        );
        assert_eq!(
            h.transport.room_members(&RoomId::new("room2")).await.unwrap(),
            vec![ConnectionId(1)]
        );
        assert_eq!(
            h.coordinator.registry().room_of(ConnectionId(1)),
            Some(&RoomId::new("room2"))
        );
    }

    #[tokio::test]
    async fn test_offer_relay_through_dispatch() {
        let mut h = Harness::new().await;
        let _rx1 = h.connect(1).await;
        let mut rx2 = h.connect(2).await;
        let mut rx3 = h.connect(3).await;
        h.join(1, "room1", "X").await;
        h.join(2, "room1", "Y").await;
        h.join(3, "room1", "Z").await;
        drain(&mut rx2);
        drain(&mut rx3);

        h.coordinator
            .dispatch(
                ConnectionId(1),
                ClientEvent::CallOffer {
                    target: ConnectionId(2),
                    from: ConnectionId(1),
                    signal: json!({"sdp": "P"}),
                },
            )
            .await;

        let events = drain(&mut rx2);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["type"], "offer-received");
        assert_eq!(events[0]["from"], 1);
        assert_eq!(events[0]["signal"]["sdp"], "P");
        // No broadcast to other room members
        assert!(drain(&mut rx3).is_empty());
        assert_eq!(h.stats.snapshot().relays_delivered, 1);
    }

    /// Transport whose membership enumeration always fails
    struct BrokenEnumeration(Arc<WsTransport>);

    #[async_trait]
    impl Transport for BrokenEnumeration {
        async fn send(&self, target: ConnectionId, event: &ServerEvent) -> bool {
            self.0.send(target, event).await
        }
        async fn broadcast(
            &self,
            room: &RoomId,
            event: &ServerEvent,
            exclude: Option<ConnectionId>,
        ) {
            self.0.broadcast(room, event, exclude).await;
        }
        async fn join_room(&self, room: &RoomId, conn: ConnectionId) {
            self.0.join_room(room, conn).await;
        }
        async fn leave_room(&self, room: &RoomId, conn: ConnectionId) {
            self.0.leave_room(room, conn).await;
        }
        async fn room_members(
            &self,
            room: &RoomId,
        ) -> Result<Vec<ConnectionId>, TransportError> {
            Err(TransportError::RoomUnavailable(room.clone()))
        }
    }

    #[tokio::test]
    async fn test_enumeration_failure_broadcasts_join_error() {
        let inner = Arc::new(WsTransport::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        inner.register(ConnectionId(1), tx).await;

        let stats = Arc::new(RelayStats::new());
        let transport = Arc::new(BrokenEnumeration(inner));
        let mut coordinator = RoomCoordinator::new(transport, stats);

        coordinator
            .dispatch(
                ConnectionId(1),
                ClientEvent::JoinCall {
                    call_id: RoomId::new("room1"),
                    user_name: "A".to_string(),
                },
            )
            .await;

        // The error reaches the whole room, joiner included
        let value: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(value["type"], "join-error");
    }
}
