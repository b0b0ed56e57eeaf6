// Logging setup

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use super::error::{app_error, AppResult};

/// Initialise the global tracing subscriber.
/// `RUST_LOG` wins when set; otherwise `default_level` is used.
pub fn init_logging(default_level: &str) -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| app_error(format!("failed to initialise logging: {}", e)))?;

    info!("Logging initialised");
    Ok(())
}
