use axum::extract::State;
use axum::routing::get;
use axum::Json;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::metrics::MetricsSnapshot;
use crate::relay::BroadcastRelay;

use super::handler::websocket_handler;

/// Create the axum router: WebSocket endpoint plus the small HTTP surface.
pub fn create_router() -> axum::Router<Arc<BroadcastRelay>> {
    use tower_http::cors::CorsLayer;
    use tower_http::trace::TraceLayer;

    axum::Router::new()
        .route("/ws", get(websocket_handler))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Relay counters as JSON
async fn metrics_handler(State(relay): State<Arc<BroadcastRelay>>) -> Json<MetricsSnapshot> {
    Json(relay.metrics().snapshot())
}

/// Bind the listener and serve connections until the process is terminated.
/// There is no graceful shutdown path; closure is per-connection only.
pub async fn run_server(addr: SocketAddr, relay: Arc<BroadcastRelay>) -> anyhow::Result<()> {
    let app = create_router().with_state(relay);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "Relay started - WebSocket: /ws, Health: /health, Metrics: /metrics");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
