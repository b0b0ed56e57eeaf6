//! Auto-save configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::{AutoSaveError, AutoSaveResult};

/// Auto-save configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSaveConfig {
    /// Whether timer-driven saves run at all
    pub enabled: bool,

    /// Forced-flush cadence while content is dirty
    #[serde(rename = "interval_ms", with = "duration_ms")]
    pub interval: Duration,

    /// Quiet period after the last edit before flushing
    #[serde(rename = "debounce_time_ms", with = "duration_ms")]
    pub debounce_time: Duration,

    /// Consecutive failures that switch auto-save off
    pub max_retries: u32,

    /// Emit user-facing notifications
    pub show_notifications: bool,

    /// Programmatic edits alone never schedule a debounce flush
    pub only_on_user_action: bool,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(30),
            debounce_time: Duration::from_secs(2),
            max_retries: 3,
            show_notifications: true,
            only_on_user_action: false,
        }
    }
}

impl AutoSaveConfig {
    pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

    pub fn validate(&self) -> AutoSaveResult<()> {
        if self.interval < Self::MIN_INTERVAL {
            return Err(AutoSaveError::InvalidConfig(format!(
                "interval must be at least {}ms",
                Self::MIN_INTERVAL.as_millis()
            )));
        }
        if self.max_retries == 0 {
            return Err(AutoSaveError::InvalidConfig(
                "max_retries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Return a copy with every field set in `patch` replaced.
    pub fn merged(&self, patch: &AutoSaveConfigPatch) -> Self {
        Self {
            enabled: patch.enabled.unwrap_or(self.enabled),
            interval: patch.interval.unwrap_or(self.interval),
            debounce_time: patch.debounce_time.unwrap_or(self.debounce_time),
            max_retries: patch.max_retries.unwrap_or(self.max_retries),
            show_notifications: patch.show_notifications.unwrap_or(self.show_notifications),
            only_on_user_action: patch
                .only_on_user_action
                .unwrap_or(self.only_on_user_action),
        }
    }
}

/// Partial update for [`AutoSaveConfig`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoSaveConfigPatch {
    pub enabled: Option<bool>,
    pub interval: Option<Duration>,
    pub debounce_time: Option<Duration>,
    pub max_retries: Option<u32>,
    pub show_notifications: Option<bool>,
    pub only_on_user_action: Option<bool>,
}

impl AutoSaveConfigPatch {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Durations as integer milliseconds
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
