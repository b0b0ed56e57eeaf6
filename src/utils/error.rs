/*!
 * Crate-wide error aliases
 *
 * Callers and persistence backends report failures through anyhow, adding
 * context with `anyhow::Context`. The coordinator's own taxonomy lives in
 * `autosave::error`.
 */

use anyhow::{anyhow, Result as AnyhowResult};
use std::any::Any;

/// Result type used by persistence callbacks, settings loading and the binary.
pub type AppResult<T> = AnyhowResult<T>;

/// Error type paired with [`AppResult`].
pub type AppError = anyhow::Error;

/// Create a plain application error from a message.
pub fn app_error(msg: impl Into<String>) -> AppError {
    anyhow!(msg.into())
}

/// Render an error with its full context chain on one line.
pub fn describe_error(err: &AppError) -> String {
    format!("{:#}", err)
}

/// Text carried by a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}
