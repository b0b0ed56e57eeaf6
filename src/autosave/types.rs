//! Auto-save state and trigger types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What caused a persistence attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveTrigger {
    /// The quiet period after the last edit elapsed
    Debounce,
    /// The periodic ticker fired while content was dirty
    Interval,
    /// The caller asked for a save
    Manual,
}

impl SaveTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveTrigger::Debounce => "debounce",
            SaveTrigger::Interval => "interval",
            SaveTrigger::Manual => "manual",
        }
    }

    pub fn is_automatic(&self) -> bool {
        !matches!(self, SaveTrigger::Manual)
    }
}

impl fmt::Display for SaveTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why auto-save is currently off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisabledReason {
    /// Consecutive failures reached `max_retries`
    Failures,
    /// The caller switched it off through configuration
    Config,
}

/// Save state exposed to the UI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSaveState {
    /// A persistence call is in flight
    pub is_auto_saving: bool,
    /// Time of the last successful save
    pub last_saved: Option<DateTime<Utc>>,
    /// Content changed since the last successful save
    pub is_dirty: bool,
    /// Consecutive automatic save failures
    pub failure_count: u32,
    /// Time of the last user-initiated edit
    pub last_user_action: Option<DateTime<Utc>>,
}

/// Display status derived from state and config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    Disabled,
    Saving,
    Unsaved,
    Saved,
    Idle,
}

impl SaveStatus {
    pub fn from_state(state: &AutoSaveState, enabled: bool) -> Self {
        if state.is_auto_saving {
            SaveStatus::Saving
        } else if !enabled {
            SaveStatus::Disabled
        } else if state.is_dirty {
            SaveStatus::Unsaved
        } else if state.last_saved.is_some() {
            SaveStatus::Saved
        } else {
            SaveStatus::Idle
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SaveStatus::Disabled => "Auto-save off",
            SaveStatus::Saving => "Saving...",
            SaveStatus::Unsaved => "Unsaved changes",
            SaveStatus::Saved => "All changes saved",
            SaveStatus::Idle => "No changes",
        }
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
