#![cfg_attr(not(test), deny(clippy::panic))]

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use ws_relay_server::config::{
    LogFormat, LogLevel, LoggingConfig, RelayConfig, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_PORT,
    DEFAULT_SEND_QUEUE_DEPTH,
};
use ws_relay_server::logging;
use ws_relay_server::relay::BroadcastRelay;
use ws_relay_server::websocket;

/// ws-relay-server -- minimal WebSocket broadcast relay for signaling traffic
#[derive(Parser, Debug)]
#[command(name = "ws-relay-server")]
#[command(
    about = "A minimal in-memory WebSocket relay: every message is broadcast to all other connected clients"
)]
#[command(version)]
struct Cli {
    /// Bind address
    #[arg(long, short = 'a', default_value = "0.0.0.0")]
    address: IpAddr,

    /// Bind port
    #[arg(long, short = 'p', default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Maximum inbound frame size in bytes; larger frames are dropped
    #[arg(long, default_value_t = DEFAULT_MAX_MESSAGE_SIZE)]
    max_message_size: usize,

    /// Outbound queue depth per connection; overflow drops the message
    /// for that one recipient
    #[arg(long, default_value_t = DEFAULT_SEND_QUEUE_DEPTH)]
    send_queue_depth: usize,

    /// Log level (takes precedence over RUST_LOG)
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

impl Cli {
    fn into_config(self) -> RelayConfig {
        RelayConfig {
            address: self.address,
            port: self.port,
            max_message_size: self.max_message_size,
            send_queue_depth: self.send_queue_depth,
            logging: LoggingConfig {
                level: self.log_level,
                format: self.log_format,
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Cli::parse().into_config();

    logging::init(&cfg.logging);

    let addr = SocketAddr::new(cfg.address, cfg.port);
    tracing::info!(%addr, "Setting up relay server");

    let relay = Arc::new(BroadcastRelay::new(cfg));
    websocket::run_server(addr, relay).await
}
