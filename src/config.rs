//! Typed runtime configuration, assembled from the command line.
//!
//! There is no configuration file and no environment-variable surface; the
//! CLI is the whole configuration story. The only environment sensitivity is
//! the conventional `RUST_LOG` fallback inside the logging filter.

use clap::ValueEnum;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

/// Default bind address (all interfaces).
pub const DEFAULT_BIND_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default cap on inbound frame size. Larger frames are dropped, not relayed.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Default bound on each connection's outbound queue. Enqueueing past this
/// depth drops the message for that one recipient.
pub const DEFAULT_SEND_QUEUE_DEPTH: usize = 64;

/// Complete relay runtime configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub address: IpAddr,
    pub port: u16,
    /// Inbound frames larger than this many bytes are dropped with a warning.
    pub max_message_size: usize,
    /// Per-connection outbound queue depth; overflow drops the message.
    pub send_queue_depth: usize,
    pub logging: LoggingConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_BIND_ADDRESS,
            port: DEFAULT_PORT,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            send_queue_depth: DEFAULT_SEND_QUEUE_DEPTH,
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Explicit tracing level; when absent, `RUST_LOG` applies, then "info".
    pub level: Option<LogLevel>,
    /// Format for rendered logs.
    pub format: LogFormat,
}

/// Log level enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log format enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
