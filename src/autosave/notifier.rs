//! User-facing save notifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::types::SaveTrigger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A toast-style message for whoever renders save feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SaveNotification {
    Saved {
        trigger: SaveTrigger,
        at: DateTime<Utc>,
    },
    SaveFailed {
        attempt: u32,
        remaining_retries: u32,
        message: String,
    },
    AutoSaveDisabled {
        failures: u32,
        message: String,
    },
    ManualSaveFailed {
        message: String,
    },
}

impl SaveNotification {
    pub fn level(&self) -> NotificationLevel {
        match self {
            SaveNotification::Saved { .. } => NotificationLevel::Info,
            SaveNotification::SaveFailed { .. } | SaveNotification::AutoSaveDisabled { .. } => {
                NotificationLevel::Warning
            }
            SaveNotification::ManualSaveFailed { .. } => NotificationLevel::Error,
        }
    }

    pub fn message(&self) -> String {
        match self {
            SaveNotification::Saved { trigger, at } => match trigger {
                SaveTrigger::Manual => format!("Saved at {}", at.format("%H:%M:%S")),
                _ => format!("Auto-saved at {}", at.format("%H:%M:%S")),
            },
            SaveNotification::SaveFailed {
                remaining_retries,
                message,
                ..
            } => format!(
                "Auto-save failed ({}). {} {} left",
                message,
                remaining_retries,
                if *remaining_retries == 1 { "retry" } else { "retries" }
            ),
            SaveNotification::AutoSaveDisabled { failures, message } => format!(
                "Auto-save disabled after {} failed attempts ({}). Save manually to resume",
                failures, message
            ),
            SaveNotification::ManualSaveFailed { message } => format!("Save failed: {}", message),
        }
    }
}

/// Sink for [`SaveNotification`]s. Called outside the coordinator's lock.
pub trait SaveNotifier: Send + Sync {
    fn notify(&self, notification: &SaveNotification);
}

/// Logs notifications through tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl SaveNotifier for TracingNotifier {
    fn notify(&self, notification: &SaveNotification) {
        match notification.level() {
            NotificationLevel::Info => info!("{}", notification.message()),
            NotificationLevel::Warning => warn!("{}", notification.message()),
            NotificationLevel::Error => error!("{}", notification.message()),
        }
    }
}
