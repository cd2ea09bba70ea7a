//! Room coordination
//!
//! The protocol state machine of the relay: join/leave/disconnect handling,
//! the advisory name check, chat fan-out and media-toggle updates. Each
//! connection moves `Unjoined -> Joined -> Left/Disconnected`; the
//! coordinator owns the registry that tracks the `Joined` stretch.

pub mod coordinator;

pub use coordinator::{InboundEvent, RoomCoordinator};
