/*!
 * Shared fixtures for coordinator tests
 *
 * - `MockPersistence`: records every attempt, can be told to fail or stall
 * - `PanickingPersistence`: panics on every save
 * - `RecordingNotifier`: keeps every notification
 * - `at`: virtual-time helper for `start_paused` tests
 */

#![allow(dead_code)]

use async_trait::async_trait;
use autosave_lib::autosave::{ContentPersistence, SaveNotification, SaveNotifier};
use autosave_lib::utils::error::{app_error, AppResult};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct SaveAttempt {
    pub content: String,
    pub metadata: Value,
    /// Milliseconds since the mock was created
    pub at_ms: u64,
    pub succeeded: bool,
}

struct MockState {
    created: Instant,
    attempts: Mutex<Vec<SaveAttempt>>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

/// Cloneable handle; clones share the same recorded attempts.
#[derive(Clone)]
pub struct MockPersistence {
    state: Arc<MockState>,
}

impl MockPersistence {
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockState {
                created: Instant::now(),
                attempts: Mutex::new(Vec::new()),
                failing: AtomicBool::new(false),
                delay: Mutex::new(None),
            }),
        }
    }

    pub fn failing() -> Self {
        let mock = Self::new();
        mock.set_failing(true);
        mock
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock() = Some(delay);
    }

    pub fn attempts(&self) -> Vec<SaveAttempt> {
        self.state.attempts.lock().clone()
    }

    pub fn attempt_times(&self) -> Vec<u64> {
        self.attempts().iter().map(|a| a.at_ms).collect()
    }

    pub fn saved_contents(&self) -> Vec<String> {
        self.attempts()
            .into_iter()
            .filter(|a| a.succeeded)
            .map(|a| a.content)
            .collect()
    }
}

#[async_trait]
impl ContentPersistence<String> for MockPersistence {
    async fn save(&self, content: &String, metadata: &Value) -> AppResult<()> {
        let at_ms = self.state.created.elapsed().as_millis() as u64;
        let delay = *self.state.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let succeeded = !self.state.failing.load(Ordering::SeqCst);
        self.state.attempts.lock().push(SaveAttempt {
            content: content.clone(),
            metadata: metadata.clone(),
            at_ms,
            succeeded,
        });

        if succeeded {
            Ok(())
        } else {
            Err(app_error("backend unavailable"))
        }
    }
}

/// Backend whose every save panics; counts how often it was called.
#[derive(Clone, Default)]
pub struct PanickingPersistence {
    calls: Arc<AtomicUsize>,
}

impl PanickingPersistence {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentPersistence<String> for PanickingPersistence {
    async fn save(&self, _content: &String, _metadata: &Value) -> AppResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("storage driver crashed");
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<SaveNotification>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notifications(&self) -> Vec<SaveNotification> {
        self.notifications.lock().clone()
    }
}

impl SaveNotifier for RecordingNotifier {
    fn notify(&self, notification: &SaveNotification) {
        self.notifications.lock().push(notification.clone());
    }
}

/// Sleep until `ms` milliseconds after `start` on the paused clock.
pub async fn at(start: Instant, ms: u64) {
    tokio::time::sleep_until(start + Duration::from_millis(ms)).await;
}

pub fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
