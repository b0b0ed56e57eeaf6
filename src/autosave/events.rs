//! Auto-save event stream

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{DisabledReason, SaveTrigger};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Coordinator lifecycle event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AutoSaveEvent {
    SaveStarted {
        timestamp: DateTime<Utc>,
        trigger: SaveTrigger,
    },
    Saved {
        timestamp: DateTime<Utc>,
        trigger: SaveTrigger,
    },
    SaveFailed {
        timestamp: DateTime<Utc>,
        trigger: SaveTrigger,
        failure_count: u32,
        message: String,
    },
    Disabled {
        timestamp: DateTime<Utc>,
        reason: DisabledReason,
    },
    Enabled {
        timestamp: DateTime<Utc>,
    },
    ConfigUpdated {
        timestamp: DateTime<Utc>,
    },
    ShutDown {
        timestamp: DateTime<Utc>,
    },
}

/// Auto-save event sender
pub struct AutoSaveEventSender {
    sender: broadcast::Sender<AutoSaveEvent>,
}

impl AutoSaveEventSender {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    // Send errors only mean nobody is listening.
    fn send(&self, event: AutoSaveEvent) {
        let _ = self.sender.send(event);
    }

    pub fn send_save_started(&self, trigger: SaveTrigger) {
        self.send(AutoSaveEvent::SaveStarted {
            timestamp: Utc::now(),
            trigger,
        });
    }

    pub fn send_saved(&self, trigger: SaveTrigger, timestamp: DateTime<Utc>) {
        self.send(AutoSaveEvent::Saved { timestamp, trigger });
    }

    pub fn send_save_failed(&self, trigger: SaveTrigger, failure_count: u32, message: String) {
        self.send(AutoSaveEvent::SaveFailed {
            timestamp: Utc::now(),
            trigger,
            failure_count,
            message,
        });
    }

    pub fn send_disabled(&self, reason: DisabledReason) {
        self.send(AutoSaveEvent::Disabled {
            timestamp: Utc::now(),
            reason,
        });
    }

    pub fn send_enabled(&self) {
        self.send(AutoSaveEvent::Enabled {
            timestamp: Utc::now(),
        });
    }

    pub fn send_config_updated(&self) {
        self.send(AutoSaveEvent::ConfigUpdated {
            timestamp: Utc::now(),
        });
    }

    pub fn send_shut_down(&self) {
        self.send(AutoSaveEvent::ShutDown {
            timestamp: Utc::now(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AutoSaveEvent> {
        self.sender.subscribe()
    }
}

impl Default for AutoSaveEventSender {
    fn default() -> Self {
        Self::new()
    }
}
