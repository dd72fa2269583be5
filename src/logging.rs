// File-based tracing setup

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV: &str = "CRINGEIN_LOG";

/// Initialize tracing when `CRINGEIN_LOG` names a file.
///
/// The terminal UI owns stdout, so without it nothing is logged.
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_tracing() {
    let Some(log_path) = std::env::var_os(LOG_ENV) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: failed to open log file {}: {e}", log_path.to_string_lossy());
            return;
        }
    };

    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();
}
