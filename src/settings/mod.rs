/*!
 * Settings
 *
 * The `[autosave]` table maps onto `AutoSaveConfig`; `[logging]` holds the
 * default log level used when `RUST_LOG` is unset.
 */

mod reader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::autosave::AutoSaveConfig;

pub use reader::{load_settings, parse_settings};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub autosave: AutoSaveConfig,
    pub logging: LoggingSettings,
}

/// Where loaded settings came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsSource {
    File(PathBuf),
    /// The settings file does not exist
    Defaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
