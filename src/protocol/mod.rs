//! Wire protocol for the signaling relay
//!
//! All traffic between clients and the relay is JSON text frames. Inbound
//! frames decode to [`ClientEvent`], outbound frames encode from
//! [`ServerEvent`]. Negotiation payloads (SDP offers/answers, ICE blobs)
//! are carried opaquely as [`serde_json::Value`] and never inspected.

pub mod event;
pub mod ids;

pub use event::{ClientEvent, MediaTarget, MemberInfo, ServerEvent};
pub use ids::{ConnectionId, RoomId};
