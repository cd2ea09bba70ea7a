//! Call directory
//!
//! Mints room identifiers for embedding applications. The relay core never
//! consults this; it only accepts the resulting id as an opaque room label
//! at join time. The creator identity is an opaque string as well, so any
//! account system can sit in front of it.

use std::collections::HashMap;
use std::time::Instant;

use rand::distributions::Alphanumeric;
use rand::Rng;

use tokio::sync::RwLock;

use crate::protocol::RoomId;

/// Length of minted room ids
const ROOM_ID_LEN: usize = 12;

/// One created call
#[derive(Debug, Clone)]
pub struct CallRecord {
    /// Opaque identity of whoever created the call
    pub admin_id: String,
    /// When the call record was created
    pub created_at: Instant,
}

/// In-memory directory of created calls
#[derive(Debug, Default)]
pub struct CallDirectory {
    calls: RwLock<HashMap<RoomId, CallRecord>>,
}

impl CallDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh room id labeled with the creator's identity
    pub async fn create(&self, admin_id: impl Into<String>) -> RoomId {
        let mut calls = self.calls.write().await;

        let room = loop {
            let candidate = RoomId::new(random_room_id());
            if !calls.contains_key(&candidate) {
                break candidate;
            }
        };

        calls.insert(
            room.clone(),
            CallRecord {
                admin_id: admin_id.into(),
                created_at: Instant::now(),
            },
        );
        tracing::info!(room = %room, "Call created");
        room
    }

    /// Look up who created a call
    pub async fn get(&self, room: &RoomId) -> Option<CallRecord> {
        self.calls.read().await.get(room).cloned()
    }

    /// Remove a call record; removing an unknown room is a no-op
    pub async fn remove(&self, room: &RoomId) {
        self.calls.write().await.remove(room);
    }

    /// Number of recorded calls
    pub async fn len(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Whether the directory is empty
    pub async fn is_empty(&self) -> bool {
        self.calls.read().await.is_empty()
    }
}

fn random_room_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ROOM_ID_LEN)
        .map(char::from)
        .collect()
}
