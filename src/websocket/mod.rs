// WebSocket layer - organized into focused submodules
//
// - handler: WebSocket upgrade handler (entry point)
// - connection: per-connection send/receive task wiring
// - routes: HTTP route setup (ws, health, metrics)

mod connection;
mod handler;
mod routes;

pub use handler::websocket_handler;
pub use routes::{create_router, run_server};
