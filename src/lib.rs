//! WebRTC signaling relay server
//!
//! Coordinates peer-to-peer call setup among clients that cannot reach each
//! other directly. Clients hold a persistent WebSocket to the relay,
//! exchange connection-negotiation payloads through it, and receive room
//! membership and presence updates. Media never touches the relay; it only
//! routes small control messages.
//!
//! # Architecture
//!
//! - [`registry`] — presence records (room, display name, camera/mic flags)
//!   per live connection, owned by the coordinator's single dispatch task
//! - [`room`] — the protocol state machine: joins, name checks, leaves,
//!   disconnect cleanup, media toggles
//! - [`relay`] — stateless unicast forwarding of offers and answers
//! - [`transport`] — the duplex-connection substrate behind a trait, with a
//!   WebSocket implementation
//! - [`server`] — accept loop and event dispatch
//! - [`call`] — room-id minting for embedding applications
//!
//! # Example
//!
//! ```no_run
//! use sigrelay_rs::{ServerConfig, SignalServer};
//!
//! #[tokio::main]
//! async fn main() -> sigrelay_rs::Result<()> {
//!     let server = SignalServer::new(ServerConfig::default());
//!     server.run().await
//! }
//! ```

pub mod call;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod room;
pub mod server;
pub mod stats;
pub mod transport;

pub use error::{Error, Result};
pub use server::{ServerConfig, SignalServer};
