//! Connection registry implementation
//!
//! The presence store consulted and mutated by every coordinator handler.
//! All access happens on the single dispatch task, which serializes handlers
//! at suspension-point granularity; a handler that resumes after an await
//! must treat a lookup miss as "already cleaned up", not as an error.

use std::collections::HashMap;

use crate::protocol::{ConnectionId, MemberInfo, RoomId};

use super::record::PresenceRecord;

/// Registry of presence records for all connections that joined a room
///
/// Plain single-writer map; the dispatch model replaces locking. Absence of
/// a record is a valid state, not an error.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, PresenceRecord>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    /// Insert or replace the presence record for a connection
    pub fn upsert(&mut self, id: ConnectionId, record: PresenceRecord) {
        self.connections.insert(id, record);
    }

    /// Look up a connection's record
    pub fn get(&self, id: ConnectionId) -> Option<&PresenceRecord> {
        self.connections.get(&id)
    }

    /// Look up a connection's record for mutation
    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut PresenceRecord> {
        self.connections.get_mut(&id)
    }

    /// Remove a connection's record, returning it if present
    ///
    /// Idempotent; removing an unknown id is a no-op.
    pub fn remove(&mut self, id: ConnectionId) -> Option<PresenceRecord> {
        self.connections.remove(&id)
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Snapshot member info for the given connection ids
    ///
    /// Ids without a record are skipped: a member that disconnected between
    /// the transport enumeration and this lookup has already been cleaned up.
    pub fn snapshot(&self, ids: &[ConnectionId]) -> Vec<MemberInfo> {
        ids.iter()
            .filter_map(|id| self.connections.get(id).map(|r| r.member_info(*id)))
            .collect()
    }

    /// Whether any of the given connections uses this display name
    ///
    /// Case-sensitive comparison, per the join-acceptance check.
    pub fn name_in_use(&self, ids: &[ConnectionId], user_name: &str) -> bool {
        ids.iter()
            .filter_map(|id| self.connections.get(id))
            .any(|record| record.user_name == user_name)
    }

    /// Room of a connection, if it has joined one
    pub fn room_of(&self, id: ConnectionId) -> Option<&RoomId> {
        self.connections.get(&id).map(|record| &record.room)
    }
}
