//! Inbound and outbound event types
//!
//! Events are internally tagged (`"type"` field, kebab-case) with camelCase
//! payload fields, so every event round-trips losslessly through JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::{ConnectionId, RoomId};
use crate::error::ProtocolError;

/// Which media flag a toggle event targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaTarget {
    /// The camera flag
    #[serde(rename = "camera")]
    Camera,
    /// The microphone flag
    #[serde(rename = "mic")]
    Microphone,
}

impl std::fmt::Display for MediaTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaTarget::Camera => write!(f, "camera"),
            MediaTarget::Microphone => write!(f, "mic"),
        }
    }
}

/// One member's presence as carried in broadcasts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    /// The member's connection id
    pub connection_id: ConnectionId,
    /// Display name chosen at join time
    pub user_name: String,
    /// Whether the camera is on
    pub camera_on: bool,
    /// Whether the microphone is on
    pub microphone_on: bool,
}

/// Events sent by clients to the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Pre-flight, non-binding check whether a display name is already in
    /// use in a room. Advisory only; a join is never rejected on collision.
    #[serde(rename_all = "camelCase")]
    CheckName {
        call_id: RoomId,
        user_name: String,
    },

    /// Join a room (creates the room implicitly if it does not exist)
    #[serde(rename_all = "camelCase")]
    JoinCall {
        call_id: RoomId,
        user_name: String,
    },

    /// Unicast a negotiation offer to one connection
    #[serde(rename_all = "camelCase")]
    CallOffer {
        /// Connection to deliver the offer to
        target: ConnectionId,
        /// Connection the answer should go back to
        from: ConnectionId,
        /// Opaque negotiation payload
        signal: Value,
    },

    /// Unicast a negotiation answer back to the offering connection
    #[serde(rename_all = "camelCase")]
    CallAnswer {
        target: ConnectionId,
        signal: Value,
    },

    /// Chat-style payload fanned out to the rest of the room
    #[serde(rename_all = "camelCase")]
    SendMessage {
        call_id: RoomId,
        message: String,
        sender_id: String,
    },

    /// Explicitly leave a room
    #[serde(rename_all = "camelCase")]
    LeaveCall {
        call_id: RoomId,
    },

    /// Flip the sender's camera or microphone flag
    #[serde(rename_all = "camelCase")]
    ToggleMedia {
        call_id: RoomId,
        target: MediaTarget,
    },
}

impl ClientEvent {
    /// Decode a JSON text frame into an event
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::MalformedEvent(e.to_string()))
    }
}

/// Events sent by the relay to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Reply to a name check; `taken` is true if some current member of the
    /// room already uses the name
    NameCheckResult {
        taken: bool,
    },

    /// Full member list of a room after a join, delivered to every member
    /// except the joiner
    MemberList {
        members: Vec<MemberInfo>,
    },

    /// A negotiation offer addressed to this connection
    #[serde(rename_all = "camelCase")]
    OfferReceived {
        signal: Value,
        from: ConnectionId,
        /// Presence snapshot of the caller at relay time, if it is still
        /// registered
        caller: Option<MemberInfo>,
    },

    /// A negotiation answer addressed to this connection
    #[serde(rename_all = "camelCase")]
    AnswerAccepted {
        signal: Value,
        answerer: ConnectionId,
    },

    /// A chat message fanned out to the room
    #[serde(rename_all = "camelCase")]
    MessageReceived {
        message: String,
        sender_id: String,
    },

    /// A member left the room (explicit leave or disconnect)
    #[serde(rename_all = "camelCase")]
    MemberLeft {
        connection_id: ConnectionId,
    },

    /// A member's media flag changed; `enabled` carries the resulting value
    /// explicitly so consumers need not recompute it
    #[serde(rename_all = "camelCase")]
    MediaToggled {
        connection_id: ConnectionId,
        target: MediaTarget,
        enabled: bool,
    },

    /// Room-wide error when the membership enumeration for a join failed
    JoinError {
        message: String,
    },

    /// Unicast rejection of a single malformed inbound event
    InvalidEvent {
        reason: String,
    },
}

impl ServerEvent {
    /// Encode the event as a JSON text frame
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}
