//! The live connection registry: the authoritative mapping from client
//! identity to its outbound queue handle.
//!
//! The registry only tracks existence and provides lookup for fan-out; the
//! connection itself is owned by its WebSocket task, never by the registry.

use dashmap::DashMap;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

use crate::payload::{ClientId, Payload};

/// Number of peers a broadcast snapshot holds without heap allocation.
pub const TYPICAL_FANOUT: usize = 8;

/// Handle for enqueueing one payload toward one peer.
pub type PayloadSender = mpsc::Sender<Payload>;

/// Point-in-time copy of all registered peers except one.
/// Stack-allocated for typical fan-out sizes, heap-allocated beyond that.
pub type Snapshot = SmallVec<[(ClientId, PayloadSender); TYPICAL_FANOUT]>;

/// Registry entry for one connected peer.
#[derive(Debug, Clone)]
pub struct RegisteredClient {
    pub sender: PayloadSender,
    /// Monotonic registration epoch. A connection that was superseded by a
    /// re-registration of its identity carries a stale epoch, so its late
    /// close cannot evict the replacement's entry.
    pub epoch: u64,
}

/// Process-wide set of live connections, keyed by `address:port` identity.
///
/// All operations are safe to call concurrently from any connection task.
/// None of them fail in the domain sense; they only mutate or query
/// in-memory state.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    clients: DashMap<ClientId, RegisteredClient>,
    next_epoch: AtomicU64,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or overwrite) the entry for `identity`. Last write wins:
    /// re-registering a live identity replaces the prior entry and returns
    /// it so the caller can decide what to do with the superseded sender.
    pub fn register(
        &self,
        identity: ClientId,
        sender: PayloadSender,
    ) -> (u64, Option<RegisteredClient>) {
        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
        let superseded = self.clients.insert(identity, RegisteredClient { sender, epoch });
        (epoch, superseded)
    }

    /// Remove the entry for `identity` if it still belongs to `epoch`.
    ///
    /// Removing an absent identity, or one that has since been re-registered
    /// under a newer epoch, is a no-op. Returns whether an entry was removed,
    /// which makes double-close and out-of-order close events harmless.
    pub fn unregister(&self, identity: &ClientId, epoch: u64) -> bool {
        self.clients
            .remove_if(identity, |_, client| client.epoch == epoch)
            .is_some()
    }

    /// Copy out every registered sender except the one matching `identity`.
    ///
    /// The snapshot is taken as of the call, not a live view: it is safe to
    /// iterate while other tasks register and unregister concurrently, and it
    /// may be stale by the time sends complete. Sends to a since-removed peer
    /// fail on the peer's closed queue, not here.
    #[must_use]
    pub fn snapshot_excluding(&self, identity: &ClientId) -> Snapshot {
        self.clients
            .iter()
            .filter(|entry| entry.key() != identity)
            .map(|entry| (entry.key().clone(), entry.value().sender.clone()))
            .collect()
    }

    #[must_use]
    pub fn contains(&self, identity: &ClientId) -> bool {
        self.clients.contains_key(identity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
