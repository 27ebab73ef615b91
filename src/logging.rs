use tracing_subscriber::{fmt::time::UtcTime, prelude::*};

use crate::config::{LogFormat, LoggingConfig};

/// Initialize console logging from the CLI-derived config.
/// Filter precedence: explicit level > `RUST_LOG` env var > "info".
///
/// Uses `try_init` so repeated calls (e.g. from tests) are harmless.
pub fn init(cfg: &LoggingConfig) {
    let env_filter = if let Some(level) = cfg.level {
        tracing_subscriber::EnvFilter::new(level.as_str())
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    match cfg.format {
        LogFormat::Json => {
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_timer(UtcTime::rfc_3339())
                        .with_writer(std::io::stdout),
                )
                .try_init();
        }
        LogFormat::Text => {
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(true)
                        .with_timer(UtcTime::rfc_3339())
                        .with_writer(std::io::stdout),
                )
                .try_init();
        }
    }
}
