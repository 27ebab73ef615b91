use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::relay::BroadcastRelay;

use super::connection::handle_socket;

/// WebSocket upgrade handler; hands the accepted socket to the
/// per-connection loop with the peer's remote address.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(relay): State<Arc<BroadcastRelay>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, relay, addr))
}
