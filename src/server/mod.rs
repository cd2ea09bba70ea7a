//! Signaling relay server
//!
//! Accept loop, WebSocket upgrades, and the single dispatch task that feeds
//! the room coordinator.

pub mod config;
pub mod listener;

pub use config::ServerConfig;
pub use listener::SignalServer;
