//! Relay activity counters, served as JSON from the `/metrics` endpoint.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for connection lifecycle and broadcast dispatch.
///
/// Everything is a plain atomic so recording from any connection task is
/// lock-free and never blocks the relay path.
#[derive(Debug, Default)]
pub struct RelayMetrics {
    // Connection metrics
    pub total_connections: AtomicU64,
    pub active_connections: AtomicU64,
    pub disconnections: AtomicU64,
    /// Re-registrations of an identity that was still live (superseded peer).
    pub identity_reuse_events: AtomicU64,

    // Dispatch metrics
    pub messages_received: AtomicU64,
    pub messages_relayed: AtomicU64,
    /// Relayed messages dropped because the recipient was already gone.
    pub sends_dropped_closed: AtomicU64,
    /// Relayed messages dropped because the recipient's queue was full.
    pub sends_dropped_full: AtomicU64,
    /// Inbound frames dropped for exceeding the configured size limit.
    pub oversized_frames: AtomicU64,
}

impl RelayMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_connections(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disconnection(&self) {
        self.disconnections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_identity_reuse(&self) {
        self.identity_reuse_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message_relayed(&self) {
        self.messages_relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_send_dropped_closed(&self) {
        self.sends_dropped_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_send_dropped_full(&self) {
        self.sends_dropped_full.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_oversized_frame(&self) {
        self.oversized_frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Consistent-enough copy of all counters for reporting.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            disconnections: self.disconnections.load(Ordering::Relaxed),
            identity_reuse_events: self.identity_reuse_events.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_relayed: self.messages_relayed.load(Ordering::Relaxed),
            sends_dropped_closed: self.sends_dropped_closed.load(Ordering::Relaxed),
            sends_dropped_full: self.sends_dropped_full.load(Ordering::Relaxed),
            oversized_frames: self.oversized_frames.load(Ordering::Relaxed),
        }
    }
}

/// Serializable view of [`RelayMetrics`].
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_connections: u64,
    pub active_connections: u64,
    pub disconnections: u64,
    pub identity_reuse_events: u64,
    pub messages_received: u64,
    pub messages_relayed: u64,
    pub sends_dropped_closed: u64,
    pub sends_dropped_full: u64,
    pub oversized_frames: u64,
}
