//! Connection registry
//!
//! Maps each live connection to its presence record (room, display name,
//! media flags). The registry is the only shared mutable state in the relay
//! and is owned exclusively by the coordinator's dispatch task, so it needs
//! no locking of its own.

pub mod record;
pub mod store;

pub use record::PresenceRecord;
pub use store::ConnectionRegistry;
