use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::payload::Payload;
use crate::relay::BroadcastRelay;

/// Drive one accepted WebSocket connection until it closes.
///
/// The connection is split into two tasks: a send task draining the bounded
/// outbound queue into the socket, and a receive task feeding inbound frames
/// to the relay. The registry only ever holds the queue's sender handle; the
/// socket itself lives and dies with these tasks.
pub(super) async fn handle_socket(socket: WebSocket, relay: Arc<BroadcastRelay>, addr: SocketAddr) {
    let (mut sink, mut stream) = socket.split();
    let queue_depth = relay.config().send_queue_depth.max(1);
    let (tx, mut rx) = mpsc::channel::<Payload>(queue_depth);

    // Register before reading any frame, so this client both receives
    // broadcasts and can be excluded from its own.
    let ticket = relay.connected(addr, tx);
    tracing::info!(client_id = %ticket.identity, "WebSocket connection established");

    // Send task: drain queued broadcasts into the socket.
    let send_relay = relay.clone();
    let send_ticket = ticket.clone();
    let send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            let frame = match payload {
                Payload::Text(text) => Message::Text(text.as_ref().to_owned().into()),
                Payload::Binary(bytes) => Message::Binary(bytes),
            };
            if sink.send(frame).await.is_err() {
                tracing::debug!(
                    client_id = %send_ticket.identity,
                    "Failed to write frame, connection closed"
                );
                break;
            }
        }

        // Queue closed or socket gone either way; drop the registration.
        send_relay.disconnected(&send_ticket);
    });

    // Receive task: relay every inbound frame to the other clients.
    let recv_relay = relay.clone();
    let recv_ticket = ticket.clone();
    let receive_task = tokio::spawn(async move {
        let max_size = recv_relay.config().max_message_size;

        while let Some(frame) = stream.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(err) => {
                    tracing::warn!(
                        client_id = %recv_ticket.identity,
                        error = %err,
                        "WebSocket error"
                    );
                    break;
                }
            };

            match frame {
                Message::Text(text) => {
                    if text.len() > max_size {
                        recv_relay.metrics().record_oversized_frame();
                        tracing::warn!(
                            client_id = %recv_ticket.identity,
                            size = text.len(),
                            max = max_size,
                            "Inbound frame exceeds size limit, dropping"
                        );
                        continue;
                    }
                    recv_relay
                        .on_message(&recv_ticket.identity, Payload::Text(Arc::from(text.as_str())));
                }
                Message::Binary(bytes) => {
                    if bytes.len() > max_size {
                        recv_relay.metrics().record_oversized_frame();
                        tracing::warn!(
                            client_id = %recv_ticket.identity,
                            size = bytes.len(),
                            max = max_size,
                            "Inbound frame exceeds size limit, dropping"
                        );
                        continue;
                    }
                    recv_relay.on_message(&recv_ticket.identity, Payload::Binary(bytes));
                }
                Message::Close(_) => {
                    tracing::info!(client_id = %recv_ticket.identity, "WebSocket connection closed");
                    break;
                }
                Message::Ping(_) | Message::Pong(_) => {
                    // axum answers pings itself; nothing to relay.
                }
            }
        }

        recv_relay.disconnected(&recv_ticket);
    });

    // Either task ending means the connection is done.
    tokio::select! {
        _ = send_task => {
            tracing::debug!(client_id = %ticket.identity, "Send task completed");
        }
        _ = receive_task => {
            tracing::debug!(client_id = %ticket.identity, "Receive task completed");
        }
    }

    // Idempotent; ensures the registry entry is gone even if a task was
    // torn down before its own cleanup ran.
    relay.disconnected(&ticket);
}
