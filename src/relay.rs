//! Signaling relay
//!
//! Stateless unicast forwarding of negotiation payloads between two
//! connections. Both directions are fire-and-forget: no acknowledgement, no
//! retry, and a relay whose target has disconnected is dropped without
//! surfacing anything to the sender.

use std::sync::Arc;

use serde_json::Value;

use crate::protocol::{ConnectionId, ServerEvent};
use crate::registry::ConnectionRegistry;
use crate::stats::RelayStats;
use crate::transport::Transport;

/// Forwards offers and answers to their target connections
pub struct SignalRelay {
    transport: Arc<dyn Transport>,
    stats: Arc<RelayStats>,
}

impl SignalRelay {
    /// Create a relay over the given transport
    pub fn new(transport: Arc<dyn Transport>, stats: Arc<RelayStats>) -> Self {
        Self { transport, stats }
    }

    /// Deliver an offer to exactly `target`
    ///
    /// The event carries the sender's presence snapshot when the sender is
    /// still registered. No room-membership check is made on the target:
    /// any id known to the transport is accepted. That mirrors the minimal
    /// trust model of the protocol and leaves target-id spoofing as a known
    /// hardening point.
    pub async fn relay_offer(
        &self,
        registry: &ConnectionRegistry,
        target: ConnectionId,
        from: ConnectionId,
        signal: Value,
    ) {
        let caller = registry.get(from).map(|record| record.member_info(from));
        let event = ServerEvent::OfferReceived { signal, from, caller };

        let delivered = self.transport.send(target, &event).await;
        self.stats.relay_attempted(delivered);

        tracing::debug!(
            from = %from,
            target = %target,
            delivered = delivered,
            "Offer relayed"
        );
    }

    /// Deliver an answer from `answerer` to exactly `target`
    pub async fn relay_answer(&self, target: ConnectionId, answerer: ConnectionId, signal: Value) {
        let event = ServerEvent::AnswerAccepted { signal, answerer };

        let delivered = self.transport.send(target, &event).await;
        self.stats.relay_attempted(delivered);

        tracing::debug!(
            answerer = %answerer,
            target = %target,
            delivered = delivered,
            "Answer relayed"
        );
    }
}
