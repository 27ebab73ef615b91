//! Broadcast dispatch: forwarding each inbound message to every other
//! registered connection, plus the per-connection lifecycle hooks.
//!
//! Delivery is fire-and-forget. `on_message` only enqueues onto each
//! recipient's bounded outbound queue; the recipient's own send task drains
//! the queue into its socket, so one slow peer never blocks the sender's
//! task or the fan-out loop.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::metrics::RelayMetrics;
use crate::payload::{ClientId, Payload};
use crate::registry::{ConnectionRegistry, PayloadSender};

/// Why a relayed message failed to reach one recipient.
///
/// These are recovered locally: the failing recipient is skipped and the
/// fan-out continues. Nothing is surfaced to the sending client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("recipient outbound queue is full")]
    QueueFull,
    #[error("recipient connection is gone")]
    RecipientGone,
}

/// Proof of registration handed to a connection task on `connected`.
///
/// Carries the registration epoch so a `disconnected` from a superseded
/// connection cannot evict its replacement from the registry.
#[derive(Debug, Clone)]
pub struct ConnectionTicket {
    pub identity: ClientId,
    epoch: u64,
}

/// The relay core: owns the connection registry and dispatches broadcasts.
///
/// Constructed once at startup and shared by `Arc` into every connection
/// task; its lifetime is the server's run scope.
#[derive(Debug)]
pub struct BroadcastRelay {
    registry: ConnectionRegistry,
    metrics: Arc<RelayMetrics>,
    config: RelayConfig,
}

impl BroadcastRelay {
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            metrics: Arc::new(RelayMetrics::new()),
            config,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    #[must_use]
    pub fn metrics(&self) -> &Arc<RelayMetrics> {
        &self.metrics
    }

    #[must_use]
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Lifecycle hook: the transport handshake completed for `addr`.
    ///
    /// Registers the connection's outbound queue so it receives broadcasts
    /// from this point on. If the identity was still registered to a prior
    /// connection, that entry is replaced and its sender dropped, which
    /// closes the superseded connection's queue and winds it down.
    pub fn connected(&self, addr: SocketAddr, sender: PayloadSender) -> ConnectionTicket {
        let identity = ClientId::from(addr);
        let (epoch, superseded) = self.registry.register(identity.clone(), sender);
        self.metrics.increment_connections();

        if superseded.is_some() {
            // The replaced entry's sender is dropped here, closing the old
            // connection's queue. Count it as disconnected now; its own late
            // `disconnected` call carries a stale epoch and is a no-op.
            self.metrics.record_identity_reuse();
            self.metrics.record_disconnection();
            warn!(
                client_id = %identity,
                "Identity re-registered while still live, superseding prior connection"
            );
        }

        info!(client_id = %identity, "Client connected");
        ConnectionTicket { identity, epoch }
    }

    /// Lifecycle hook: the transport signaled closure for this connection.
    ///
    /// Idempotent: a second call for the same ticket, or a late call from a
    /// connection whose identity has been re-registered since, is a no-op.
    pub fn disconnected(&self, ticket: &ConnectionTicket) {
        if self.registry.unregister(&ticket.identity, ticket.epoch) {
            self.metrics.record_disconnection();
            info!(client_id = %ticket.identity, "Client disconnected");
        }
    }

    /// Forward `payload` to every registered connection except the sender.
    ///
    /// An empty payload is normalized to the `"N/A"` placeholder first.
    /// Each enqueue is attempted independently; a failure for one recipient
    /// is logged and counted, never propagated. Returns how many recipients
    /// the message was enqueued for.
    pub fn on_message(&self, sender_identity: &ClientId, payload: Payload) -> usize {
        let payload = payload.normalize();
        self.metrics.record_message_received();
        debug!(
            client_id = %sender_identity,
            bytes = payload.len(),
            "Message received, relaying to peers"
        );

        let mut delivered = 0;
        for (recipient, sender) in self.registry.snapshot_excluding(sender_identity) {
            match Self::deliver(&sender, payload.clone()) {
                Ok(()) => {
                    self.metrics.record_message_relayed();
                    delivered += 1;
                }
                Err(DeliveryError::QueueFull) => {
                    self.metrics.record_send_dropped_full();
                    warn!(client_id = %recipient, "Outbound queue full, dropping relayed message");
                }
                Err(DeliveryError::RecipientGone) => {
                    self.metrics.record_send_dropped_closed();
                    debug!(client_id = %recipient, "Recipient already gone, dropping relayed message");
                }
            }
        }
        delivered
    }

    fn deliver(sender: &PayloadSender, payload: Payload) -> Result<(), DeliveryError> {
        sender.try_send(payload).map_err(|err| match err {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::RecipientGone,
        })
    }
}
