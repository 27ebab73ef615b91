//! Thread safety tests for the connection registry and broadcast dispatch.
//!
//! These tests hammer the shared registry from many tasks at once and verify
//! that snapshots are never partial, double-closes are harmless, and a peer
//! disappearing mid-broadcast never corrupts state or aborts a fan-out.

use futures::future::join_all;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, Barrier};
use ws_relay_server::config::RelayConfig;
use ws_relay_server::payload::{ClientId, Payload};
use ws_relay_server::registry::ConnectionRegistry;
use ws_relay_server::relay::BroadcastRelay;

fn test_addr(index: usize) -> SocketAddr {
    format!("10.0.{}.{}:{}", index / 256, index % 256, 5000 + index)
        .parse()
        .expect("valid synthetic addr")
}

/// Concurrent registration from many tasks: every identity must end up in
/// the registry exactly once, and concurrent snapshots must never observe
/// a duplicated or half-written entry.
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_register_and_snapshot_never_sees_partial_state() {
    let registry = Arc::new(ConnectionRegistry::new());
    let task_count = 32;
    let barrier = Arc::new(Barrier::new(task_count * 2));

    let mut handles = Vec::with_capacity(task_count * 2);
    let mut receivers = Vec::new();

    // Writer tasks: each registers one unique identity.
    for i in 0..task_count {
        let registry = Arc::clone(&registry);
        let barrier = Arc::clone(&barrier);
        let (tx, rx) = mpsc::channel::<Payload>(4);
        receivers.push(rx);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            registry.register(ClientId::from(test_addr(i)), tx);
        }));
    }

    // Reader tasks: snapshot concurrently and check internal consistency.
    let observer = ClientId::from("192.168.0.1:9999");
    for _ in 0..task_count {
        let registry = Arc::clone(&registry);
        let barrier = Arc::clone(&barrier);
        let observer = observer.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            for _ in 0..50 {
                let snapshot = registry.snapshot_excluding(&observer);
                let mut ids: Vec<String> = snapshot
                    .iter()
                    .map(|(id, _)| id.as_str().to_owned())
                    .collect();
                ids.sort_unstable();
                let before = ids.len();
                ids.dedup();
                assert_eq!(before, ids.len(), "snapshot contained a duplicate identity");
                tokio::task::yield_now().await;
            }
        }));
    }

    for result in join_all(handles).await {
        result.expect("task did not panic");
    }
    assert_eq!(registry.len(), task_count);
}

/// Unregistering concurrently with registration churn must leave exactly the
/// still-registered set, with double-unregisters staying no-ops.
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_unregister_is_idempotent_under_races() {
    let registry = Arc::new(ConnectionRegistry::new());
    let client_count = 24;

    let mut epochs = Vec::with_capacity(client_count);
    let mut receivers = Vec::new();
    for i in 0..client_count {
        let (tx, rx) = mpsc::channel::<Payload>(4);
        receivers.push(rx);
        let (epoch, _) = registry.register(ClientId::from(test_addr(i)), tx);
        epochs.push(epoch);
    }

    // Two tasks race to unregister every client; each removal must happen
    // exactly once across both.
    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();
    for _ in 0..2 {
        let registry = Arc::clone(&registry);
        let barrier = Arc::clone(&barrier);
        let epochs = epochs.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let mut removed = 0usize;
            for (i, epoch) in epochs.iter().enumerate() {
                if registry.unregister(&ClientId::from(test_addr(i)), *epoch) {
                    removed += 1;
                }
            }
            removed
        }));
    }

    let removals: usize = join_all(handles)
        .await
        .into_iter()
        .map(|result| result.expect("task did not panic"))
        .sum();

    assert_eq!(removals, client_count, "each client removed exactly once");
    assert!(registry.is_empty());
}

/// Broadcasting while recipients disconnect underneath the fan-out: the
/// relay must neither panic nor stop delivering to the surviving peers.
#[tokio::test(flavor = "multi_thread")]
async fn broadcast_survives_peers_disconnecting_mid_fanout() {
    let relay = Arc::new(BroadcastRelay::new(RelayConfig::default()));
    let peer_count = 16;
    let broadcast_count = 200;

    let sender_ticket = relay.connected(test_addr(999), mpsc::channel::<Payload>(4).0);

    // Half the peers keep draining their queues, half drop their receivers
    // partway through the broadcast storm.
    let mut drain_handles = Vec::new();
    let mut tickets = Vec::new();
    for i in 0..peer_count {
        let (tx, mut rx) = mpsc::channel::<Payload>(64);
        tickets.push(relay.connected(test_addr(i), tx));
        let keep = i % 2 == 0;
        drain_handles.push(tokio::spawn(async move {
            let mut seen = 0usize;
            while let Some(_payload) = rx.recv().await {
                seen += 1;
                if !keep && seen >= broadcast_count / 4 {
                    break; // receiver dropped here, mid-storm
                }
            }
            seen
        }));
    }

    let broadcaster = Arc::clone(&relay);
    let sender_identity = sender_ticket.identity.clone();
    let broadcast_task = tokio::spawn(async move {
        for i in 0..broadcast_count {
            broadcaster.on_message(&sender_identity, Payload::text(format!("msg-{i}")));
            tokio::task::yield_now().await;
        }
    });

    broadcast_task.await.expect("broadcast task did not panic");

    // Disconnect everyone so the drain tasks finish.
    for ticket in &tickets {
        relay.disconnected(ticket);
    }
    let totals = join_all(drain_handles).await;
    for total in totals {
        total.expect("drain task did not panic");
    }

    // Survivors saw traffic; the dropped peers only produced counted drops.
    let snapshot = relay.metrics().snapshot();
    assert!(snapshot.messages_relayed > 0);
    assert_eq!(snapshot.messages_received, broadcast_count as u64);
}

/// Double-close races at the relay level: many tasks calling `disconnected`
/// for the same ticket must record exactly one disconnection.
#[tokio::test(flavor = "multi_thread")]
async fn racing_disconnects_record_one_disconnection() {
    let relay = Arc::new(BroadcastRelay::new(RelayConfig::default()));
    let (tx, _rx) = mpsc::channel::<Payload>(4);
    let ticket = relay.connected(test_addr(0), tx);

    let barrier = Arc::new(Barrier::new(8));
    let mut handles = Vec::new();
    for _ in 0..8 {
        let relay = Arc::clone(&relay);
        let ticket = ticket.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            relay.disconnected(&ticket);
        }));
    }

    for result in join_all(handles).await {
        result.expect("task did not panic");
    }

    assert!(relay.registry().is_empty());
    assert_eq!(relay.metrics().snapshot().disconnections, 1);
}
