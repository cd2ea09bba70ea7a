//! Per-connection presence record

use crate::protocol::{ConnectionId, MediaTarget, MemberInfo, RoomId};

/// Presence state of one connection that has joined a room
///
/// A connection that has not joined any room has no record. Records are
/// created on join with both media flags on, mutated by toggle events, and
/// removed on leave or disconnect.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceRecord {
    /// Room the connection currently belongs to
    pub room: RoomId,
    /// Display name chosen by the client at join time
    pub user_name: String,
    /// Whether the camera is on
    pub camera_on: bool,
    /// Whether the microphone is on
    pub microphone_on: bool,
}

impl PresenceRecord {
    /// Create a record for a fresh join; media flags default to on
    pub fn new(room: RoomId, user_name: impl Into<String>) -> Self {
        Self {
            room,
            user_name: user_name.into(),
            camera_on: true,
            microphone_on: true,
        }
    }

    /// Flip the targeted media flag, returning the resulting value
    pub fn toggle(&mut self, target: MediaTarget) -> bool {
        match target {
            MediaTarget::Camera => {
                self.camera_on = !self.camera_on;
                self.camera_on
            }
            MediaTarget::Microphone => {
                self.microphone_on = !self.microphone_on;
                self.microphone_on
            }
        }
    }

    /// Snapshot this record as the wire-level member info
    pub fn member_info(&self, id: ConnectionId) -> MemberInfo {
        MemberInfo {
            connection_id: id,
            user_name: self.user_name.clone(),
            camera_on: self.camera_on,
            microphone_on: self.microphone_on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_defaults() {
        let record = PresenceRecord::new(RoomId::new("room1"), "Alice");

        assert_eq!(record.user_name, "Alice");
        assert!(record.camera_on);
        assert!(record.microphone_on);
    }

    #[test]
    fn test_toggle_is_independent_per_flag() {
        let mut record = PresenceRecord::new(RoomId::new("room1"), "Alice");

        assert!(!record.toggle(MediaTarget::Camera));
        assert!(!record.camera_on);
        // Microphone untouched
        assert!(record.microphone_on);

        assert!(record.toggle(MediaTarget::Camera));
        assert!(record.camera_on);

        assert!(!record.toggle(MediaTarget::Microphone));
        assert!(record.camera_on);
        assert!(!record.microphone_on);
    }

    #[test]
    fn test_member_info_snapshot() {
        let mut record = PresenceRecord::new(RoomId::new("room1"), "Bob");
        record.toggle(MediaTarget::Microphone);

        let info = record.member_info(ConnectionId(3));
        assert_eq!(info.connection_id, ConnectionId(3));
        assert_eq!(info.user_name, "Bob");
        assert!(info.camera_on);
        assert!(!info.microphone_on);
    }
}
