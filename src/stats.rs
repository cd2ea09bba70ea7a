//! Server-wide counters for the signaling relay

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide relay counters
///
/// Updated from the accept loop and the dispatch task, read via
/// [`RelayStats::snapshot`]. Logging-level observability only; there is no
/// metrics export.
#[derive(Debug, Default)]
pub struct RelayStats {
    total_connections: AtomicU64,
    active_connections: AtomicU64,
    events_dispatched: AtomicU64,
    relays_delivered: AtomicU64,
    relays_dropped: AtomicU64,
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Connections accepted since startup
    pub total_connections: u64,
    /// Currently live connections
    pub active_connections: u64,
    /// Inbound events handled by the coordinator
    pub events_dispatched: u64,
    /// Offer/answer unicasts that reached a live target
    pub relays_delivered: u64,
    /// Offer/answer unicasts dropped because the target was gone
    pub relays_dropped: u64,
}

impl RelayStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted connection
    pub fn connection_opened(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a closed connection
    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record one dispatched inbound event
    pub fn event_dispatched(&self) {
        self.events_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one unicast relay
    pub fn relay_attempted(&self, delivered: bool) {
        if delivered {
            self.relays_delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.relays_dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Read all counters at once
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            relays_delivered: self.relays_delivered.load(Ordering::Relaxed),
            relays_dropped: self.relays_dropped.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_counters() {
        let stats = RelayStats::new();
        stats.connection_opened();
        stats.connection_opened();
        stats.connection_closed();

        let snap = stats.snapshot();
        assert_eq!(snap.total_connections, 2);
        assert_eq!(snap.active_connections, 1);
    }

    #[test]
    fn test_relay_outcomes() {
        let stats = RelayStats::new();
        stats.relay_attempted(true);
        stats.relay_attempted(false);
        stats.relay_attempted(false);
        stats.event_dispatched();

        let snap = stats.snapshot();
        assert_eq!(snap.relays_delivered, 1);
        assert_eq!(snap.relays_dropped, 2);
        assert_eq!(snap.events_dispatched, 1);
    }
}
