//! Minimal signaling relay example
//!
//! Run with: cargo run --example relay_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example relay_server                  # binds to 0.0.0.0:5000
//!   cargo run --example relay_server 127.0.0.1:5001   # custom address
//!
//! Clients connect over WebSocket and speak JSON events, e.g.:
//!   {"type":"join-call","callId":"room1","userName":"Alice"}
//!   {"type":"toggle-media","callId":"room1","target":"camera"}
//!
//! Logging is controlled via RUST_LOG (e.g. RUST_LOG=sigrelay_rs=debug).

use std::net::SocketAddr;

use sigrelay_rs::{ServerConfig, SignalServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> sigrelay_rs::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(arg) => {
            let addr: SocketAddr = arg.parse().expect("invalid bind address");
            ServerConfig::with_addr(addr)
        }
        None => ServerConfig::default(),
    };

    let server = SignalServer::new(config);
    tracing::info!(addr = %server.bind_addr(), "Starting signaling relay");

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    let stats = server.stats().snapshot();
    tracing::info!(
        total_connections = stats.total_connections,
        events_dispatched = stats.events_dispatched,
        relays_delivered = stats.relays_delivered,
        "Relay stopped"
    );

    Ok(())
}
