//! Transport layer abstraction
//!
//! The coordinator and relay are written against the [`Transport`] trait,
//! not against a concrete socket type: the trait covers per-connection
//! unicast, room-scoped broadcast and membership bookkeeping. The bundled
//! implementation is [`WsTransport`] (WebSocket text frames).

pub mod ws;

use async_trait::async_trait;

use crate::protocol::{ConnectionId, RoomId, ServerEvent};

pub use ws::WsTransport;

/// Error type for transport operations
#[derive(Debug, Clone)]
pub enum TransportError {
    /// The room's membership could not be enumerated
    RoomUnavailable(RoomId),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::RoomUnavailable(room) => {
                write!(f, "Room unavailable: {}", room)
            }
        }
    }
}

impl std::error::Error for TransportError {}

/// Duplex-connection substrate the relay core runs on
///
/// All delivery is fire-and-forget: the relay gets no acknowledgement and
/// no delivery guarantee beyond what the underlying channel provides.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Unicast an event to one connection
    ///
    /// Returns whether the target had a live delivery queue; a missing or
    /// closed target is a silent no-op. The return value feeds internal
    /// counters only and is never surfaced to the sender.
    async fn send(&self, target: ConnectionId, event: &ServerEvent) -> bool;

    /// Fan an event out to every member of a room, optionally excluding one
    /// connection (typically the originator)
    async fn broadcast(&self, room: &RoomId, event: &ServerEvent, exclude: Option<ConnectionId>);

    /// Add a connection to a room, creating the room implicitly
    async fn join_room(&self, room: &RoomId, conn: ConnectionId);

    /// Remove a connection from a room; the room ceases to exist when its
    /// last member leaves
    async fn leave_room(&self, room: &RoomId, conn: ConnectionId);

    /// Enumerate the current members of a room
    ///
    /// An unknown room is an empty room, not an error. The fallible
    /// signature exists because enumeration is asynchronous and transports
    /// may lose the membership view; the coordinator turns that failure
    /// into a room-wide error event.
    async fn room_members(&self, room: &RoomId) -> Result<Vec<ConnectionId>, TransportError>;
}
