/*!
 * Auto-save coordinator
 *
 * Owns the dirty/clean state of one piece of editable content and decides
 * when to call the persistence backend:
 * - every edit restarts the debounce timer
 * - a ticker flushes every `interval` while content stays dirty
 * - at most one persistence call is in flight
 * - `max_retries` consecutive automatic failures switch auto-save off
 */

use chrono::Utc;
use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::{AutoSaveConfig, AutoSaveConfigPatch};
use super::error::{AutoSaveError, AutoSaveResult};
use super::events::{AutoSaveEvent, AutoSaveEventSender};
use super::notifier::{SaveNotification, SaveNotifier, TracingNotifier};
use super::persistence::ContentPersistence;
use super::types::{AutoSaveState, DisabledReason, SaveStatus, SaveTrigger};
use crate::utils::error::{app_error, panic_message, AppError};

/// Receives every persistence failure, whether or not notifications are shown
pub type ErrorObserver = Arc<dyn Fn(&AutoSaveError) + Send + Sync>;

// ============================================================================
// Builder
// ============================================================================

pub struct AutoSaveCoordinatorBuilder<C> {
    persistence: Arc<dyn ContentPersistence<C>>,
    config: AutoSaveConfig,
    notifier: Arc<dyn SaveNotifier>,
    error_observer: Option<ErrorObserver>,
}

impl<C> AutoSaveCoordinatorBuilder<C>
where
    C: Clone + Send + Sync + 'static,
{
    pub fn config(mut self, config: AutoSaveConfig) -> Self {
        self.config = config;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn SaveNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn on_error<F>(mut self, observer: F) -> Self
    where
        F: Fn(&AutoSaveError) + Send + Sync + 'static,
    {
        self.error_observer = Some(Arc::new(observer));
        self
    }

    pub fn build(self) -> AutoSaveResult<AutoSaveCoordinator<C>> {
        self.config.validate()?;

        let id = Uuid::new_v4();
        info!(
            coordinator = %id,
            debounce_ms = self.config.debounce_time.as_millis() as u64,
            interval_ms = self.config.interval.as_millis() as u64,
            max_retries = self.config.max_retries,
            "Auto-save coordinator created"
        );

        let disabled_reason = (!self.config.enabled).then_some(DisabledReason::Config);
        Ok(AutoSaveCoordinator {
            shared: Arc::new(Shared {
                id,
                persistence: self.persistence,
                notifier: self.notifier,
                error_observer: self.error_observer,
                events: AutoSaveEventSender::new(),
                inner: Mutex::new(Inner {
                    config: self.config,
                    state: AutoSaveState::default(),
                    content: None,
                    metadata: Value::Null,
                    revision: 0,
                    user_change_pending: false,
                    disabled_reason,
                    debounce_timer: None,
                    interval_timer: None,
                    next_interval_generation: 0,
                    shut_down: false,
                }),
            }),
        })
    }
}

// ============================================================================
// Coordinator
// ============================================================================

/// Auto-save coordinator for one piece of content.
///
/// Timers run on the ambient Tokio runtime, so `update_content` and
/// `update_config` must be called from within one. Dropping the coordinator
/// cancels both timers; an in-flight save is left to finish.
pub struct AutoSaveCoordinator<C> {
    shared: Arc<Shared<C>>,
}

impl<C> AutoSaveCoordinator<C>
where
    C: Clone + Send + Sync + 'static,
{
    pub fn builder<P>(persistence: P) -> AutoSaveCoordinatorBuilder<C>
    where
        P: ContentPersistence<C> + 'static,
    {
        AutoSaveCoordinatorBuilder {
            persistence: Arc::new(persistence),
            config: AutoSaveConfig::default(),
            notifier: Arc::new(TracingNotifier),
            error_observer: None,
        }
    }

    pub fn new<P>(config: AutoSaveConfig, persistence: P) -> AutoSaveResult<Self>
    where
        P: ContentPersistence<C> + 'static,
    {
        Self::builder(persistence).config(config).build()
    }

    /// Record new content and (re)schedule timer-driven saves.
    pub fn update_content(&self, content: C, metadata: Value, is_user_action: bool) {
        let shared = &self.shared;
        let mut inner = shared.inner.lock();
        if inner.shut_down {
            warn!(coordinator = %shared.id, "Content update after shutdown ignored");
            return;
        }

        inner.content = Some(content);
        inner.metadata = metadata;
        inner.revision += 1;
        inner.state.is_dirty = true;
        if is_user_action {
            inner.state.last_user_action = Some(Utc::now());
            inner.user_change_pending = true;
        }

        if !inner.config.enabled {
            return;
        }

        shared.schedule_debounce(&mut inner);
        // The ticker keeps its phase across edits so staleness stays bounded.
        if inner.interval_timer.is_none() {
            shared.arm_interval(&mut inner);
        }
    }

    /// Save immediately. Returns `false` if a save is already in flight, no
    /// content was recorded yet, the coordinator is shut down, or the
    /// persistence call fails.
    pub async fn manual_save(&self) -> bool {
        let shared = &self.shared;
        let job = {
            let mut inner = shared.inner.lock();
            if inner.shut_down {
                return false;
            }
            if inner.state.is_auto_saving {
                debug!(coordinator = %shared.id, "Manual save skipped: a save is in flight");
                return false;
            }
            let Some(content) = inner.content.clone() else {
                debug!(coordinator = %shared.id, "Manual save skipped: no content recorded");
                return false;
            };
            inner.state.is_auto_saving = true;
            SaveJob {
                content,
                metadata: inner.metadata.clone(),
                revision: inner.revision,
            }
        };

        match shared.persist(job, SaveTrigger::Manual).await {
            Ok(revision) => {
                shared.finish_success(revision, SaveTrigger::Manual);
                true
            }
            Err(err) => {
                shared.finish_manual_failure(err);
                false
            }
        }
    }

    /// Merge `patch` into the current configuration.
    pub fn update_config(&self, patch: AutoSaveConfigPatch) -> AutoSaveResult<()> {
        let shared = &self.shared;
        if patch.is_empty() {
            debug!(coordinator = %shared.id, "Empty configuration patch ignored");
            return Ok(());
        }
        let mut inner = shared.inner.lock();

        let next = inner.config.merged(&patch);
        next.validate()?;

        let was_enabled = inner.config.enabled;
        let interval_changed = next.interval != inner.config.interval;
        inner.config = next;

        let mut became_enabled = false;
        let mut became_disabled = false;
        match patch.enabled {
            Some(true) => {
                inner.state.failure_count = 0;
                inner.disabled_reason = None;
                if !was_enabled {
                    became_enabled = true;
                    if inner.state.is_dirty && !inner.shut_down {
                        shared.arm_interval(&mut inner);
                    }
                }
            }
            Some(false) => {
                // Explicit intent outranks an earlier failure-driven disable.
                inner.disabled_reason = Some(DisabledReason::Config);
                inner.cancel_timers();
                became_disabled = was_enabled;
            }
            None => {}
        }

        if interval_changed
            && inner.config.enabled
            && inner.interval_timer.is_some()
            && !inner.shut_down
        {
            shared.arm_interval(&mut inner);
        }
        drop(inner);

        info!(coordinator = %shared.id, ?patch, "Auto-save configuration updated");
        shared.events.send_config_updated();
        if became_enabled {
            shared.events.send_enabled();
        }
        if became_disabled {
            shared.events.send_disabled(DisabledReason::Config);
        }
        Ok(())
    }

    /// Cancel both timers. Later edits are ignored.
    pub fn shutdown(&self) {
        self.shared.shut_down();
    }

    pub fn state(&self) -> AutoSaveState {
        self.shared.inner.lock().state.clone()
    }

    pub fn config(&self) -> AutoSaveConfig {
        self.shared.inner.lock().config.clone()
    }

    pub fn status(&self) -> SaveStatus {
        let inner = self.shared.inner.lock();
        SaveStatus::from_state(&inner.state, inner.config.enabled)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.shared.inner.lock().state.is_dirty
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.inner.lock().config.enabled
    }

    pub fn disabled_reason(&self) -> Option<DisabledReason> {
        self.shared.inner.lock().disabled_reason
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AutoSaveEvent> {
        self.shared.events.subscribe()
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }
}

impl<C> Drop for AutoSaveCoordinator<C> {
    fn drop(&mut self) {
        self.shared.shut_down();
    }
}

// ============================================================================
// Internals
// ============================================================================

struct Shared<C> {
    id: Uuid,
    persistence: Arc<dyn ContentPersistence<C>>,
    notifier: Arc<dyn SaveNotifier>,
    error_observer: Option<ErrorObserver>,
    events: AutoSaveEventSender,
    inner: Mutex<Inner<C>>,
}

struct Inner<C> {
    config: AutoSaveConfig,
    state: AutoSaveState,
    content: Option<C>,
    metadata: Value,
    /// Bumped on every edit; a save only clears `is_dirty` if unchanged.
    revision: u64,
    user_change_pending: bool,
    disabled_reason: Option<DisabledReason>,
    debounce_timer: Option<JoinHandle<()>>,
    interval_timer: Option<IntervalTimer>,
    next_interval_generation: u64,
    shut_down: bool,
}

struct IntervalTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

struct SaveJob<C> {
    content: C,
    metadata: Value,
    revision: u64,
}

impl<C> Inner<C> {
    fn cancel_debounce(&mut self) {
        if let Some(handle) = self.debounce_timer.take() {
            handle.abort();
        }
    }

    fn cancel_interval(&mut self) {
        if let Some(timer) = self.interval_timer.take() {
            timer.handle.abort();
        }
    }

    fn cancel_timers(&mut self) {
        self.cancel_debounce();
        self.cancel_interval();
    }
}

/// Clears `is_auto_saving` if a save future is dropped or panics before
/// reaching its completion handler.
struct SaveInFlight<'a, C> {
    inner: &'a Mutex<Inner<C>>,
    settled: bool,
}

impl<C> Drop for SaveInFlight<'_, C> {
    fn drop(&mut self) {
        if !self.settled {
            self.inner.lock().state.is_auto_saving = false;
            warn!("Save interrupted before completion");
        }
    }
}

impl<C> Shared<C> {
    fn shut_down(&self) {
        let mut inner = self.inner.lock();
        if inner.shut_down {
            return;
        }
        inner.shut_down = true;
        inner.cancel_timers();
        drop(inner);

        info!(coordinator = %self.id, "Auto-save coordinator shut down");
        self.events.send_shut_down();
    }
}

impl<C> Shared<C>
where
    C: Clone + Send + Sync + 'static,
{
    fn schedule_debounce(self: &Arc<Self>, inner: &mut Inner<C>) {
        inner.cancel_debounce();

        let delay = inner.config.debounce_time;
        let weak = Arc::downgrade(self);
        inner.debounce_timer = Some(tokio::spawn(async move {
            sleep(delay).await;
            spawn_flush(&weak, SaveTrigger::Debounce);
        }));
    }

    fn arm_interval(self: &Arc<Self>, inner: &mut Inner<C>) {
        inner.cancel_interval();
        inner.next_interval_generation += 1;

        let generation = inner.next_interval_generation;
        let period = inner.config.interval;
        let weak = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                if !shared.interval_tick_due(generation) {
                    break;
                }
                spawn_flush(&weak, SaveTrigger::Interval);
            }
        });
        inner.interval_timer = Some(IntervalTimer { generation, handle });
        debug!(coordinator = %self.id, generation, "Interval ticker armed");
    }

    /// Whether the ticker `generation` should flush now. A ticker that finds
    /// nothing to do releases its slot so the next edit re-arms it.
    fn interval_tick_due(&self, generation: u64) -> bool {
        let mut inner = self.inner.lock();
        let current = inner
            .interval_timer
            .as_ref()
            .is_some_and(|timer| timer.generation == generation);
        if !current {
            return false;
        }
        if inner.shut_down || !inner.config.enabled || !inner.state.is_dirty {
            inner.interval_timer = None;
            debug!(coordinator = %self.id, generation, "Interval ticker idle, stopping");
            return false;
        }
        true
    }

    async fn flush(self: Arc<Self>, trigger: SaveTrigger) {
        let Some(job) = self.begin_auto_save(trigger) else {
            return;
        };

        match self.persist(job, trigger).await {
            Ok(revision) => self.finish_success(revision, trigger),
            Err(err) => self.finish_auto_failure(trigger, err),
        }
    }

    fn begin_auto_save(&self, trigger: SaveTrigger) -> Option<SaveJob<C>> {
        let mut inner = self.inner.lock();

        let skip_reason = if inner.shut_down {
            Some("shut down")
        } else if !inner.config.enabled {
            Some("disabled")
        } else if !inner.state.is_dirty {
            Some("nothing to save")
        } else if inner.state.is_auto_saving {
            Some("a save is in flight")
        } else if trigger == SaveTrigger::Debounce
            && inner.config.only_on_user_action
            && !inner.user_change_pending
        {
            Some("no user-initiated change pending")
        } else {
            None
        };
        if let Some(reason) = skip_reason {
            debug!(coordinator = %self.id, %trigger, "Flush skipped: {}", reason);
            return None;
        }

        let content = inner.content.clone()?;
        inner.state.is_auto_saving = true;
        Some(SaveJob {
            content,
            metadata: inner.metadata.clone(),
            revision: inner.revision,
        })
    }

    /// Run the persistence call for a job whose `is_auto_saving` flag is set.
    /// Returns the revision that was saved. A panicking backend is reported
    /// as a failed save.
    async fn persist(&self, job: SaveJob<C>, trigger: SaveTrigger) -> Result<u64, AppError> {
        self.events.send_save_started(trigger);
        debug!(coordinator = %self.id, %trigger, revision = job.revision, "Saving");

        let mut in_flight = SaveInFlight {
            inner: &self.inner,
            settled: false,
        };
        let result = AssertUnwindSafe(self.persistence.save(&job.content, &job.metadata))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(app_error(format!(
                    "persistence panicked: {}",
                    panic_message(&*payload)
                )))
            });
        // Completion handlers clear `is_auto_saving` themselves.
        in_flight.settled = true;

        result.map(|()| job.revision)
    }

    fn finish_success(self: &Arc<Self>, revision: u64, trigger: SaveTrigger) {
        let mut inner = self.inner.lock();
        let saved_at = Utc::now();

        inner.state.is_auto_saving = false;
        if inner.revision == revision {
            inner.state.is_dirty = false;
            inner.user_change_pending = false;
        }
        inner.state.last_saved = Some(saved_at);
        inner.state.failure_count = 0;

        let mut reenabled = false;
        if !trigger.is_automatic()
            && inner.disabled_reason == Some(DisabledReason::Failures)
            && !inner.shut_down
        {
            inner.config.enabled = true;
            inner.disabled_reason = None;
            reenabled = true;
            if inner.state.is_dirty {
                self.arm_interval(&mut inner);
            }
        }
        let still_dirty = inner.state.is_dirty;
        let show_notifications = inner.config.show_notifications;
        drop(inner);

        info!(coordinator = %self.id, %trigger, still_dirty, "Content saved");
        self.events.send_saved(trigger, saved_at);
        if reenabled {
            info!(coordinator = %self.id, "Auto-save re-enabled after successful manual save");
            self.events.send_enabled();
        }
        if show_notifications {
            self.notifier.notify(&SaveNotification::Saved {
                trigger,
                at: saved_at,
            });
        }
    }

    fn finish_auto_failure(&self, trigger: SaveTrigger, err: AppError) {
        let error = AutoSaveError::persistence(trigger, &err);
        let message = error.message().to_string();
        let mut inner = self.inner.lock();

        inner.state.is_auto_saving = false;
        inner.state.failure_count = inner.state.failure_count.saturating_add(1);
        let failures = inner.state.failure_count;
        let max_retries = inner.config.max_retries;

        // Only an enabled coordinator can be disabled by failures; an explicit
        // disable made while the save was in flight keeps its reason.
        let disabled_now = inner.config.enabled && failures >= max_retries;
        if disabled_now {
            inner.config.enabled = false;
            inner.disabled_reason = Some(DisabledReason::Failures);
            inner.cancel_timers();
        }
        let show_notifications = inner.config.show_notifications;
        drop(inner);

        warn!(
            coordinator = %self.id,
            %trigger,
            failures,
            max_retries,
            "Auto-save failed: {}",
            message
        );
        self.events
            .send_save_failed(trigger, failures, message.clone());
        if disabled_now {
            warn!(coordinator = %self.id, "Auto-save disabled after {} consecutive failures", failures);
            self.events.send_disabled(DisabledReason::Failures);
        }

        if show_notifications {
            let notification = if disabled_now {
                SaveNotification::AutoSaveDisabled { failures, message }
            } else {
                SaveNotification::SaveFailed {
                    attempt: failures,
                    remaining_retries: max_retries.saturating_sub(failures),
                    message,
                }
            };
            self.notifier.notify(&notification);
        }
        self.observe_error(&error);
    }

    fn finish_manual_failure(&self, err: AppError) {
        let error = AutoSaveError::persistence(SaveTrigger::Manual, &err);
        let message = error.message().to_string();
        let mut inner = self.inner.lock();
        inner.state.is_auto_saving = false;
        let failures = inner.state.failure_count;
        let show_notifications = inner.config.show_notifications;
        drop(inner);

        warn!(coordinator = %self.id, "Manual save failed: {}", message);
        self.events
            .send_save_failed(SaveTrigger::Manual, failures, message.clone());
        if show_notifications {
            self.notifier
                .notify(&SaveNotification::ManualSaveFailed { message });
        }
        self.observe_error(&error);
    }

    fn observe_error(&self, error: &AutoSaveError) {
        if let Some(observer) = &self.error_observer {
            observer(error);
        }
    }
}

/// Start a flush as its own task so cancelling the timer that fired it never
/// cancels the persistence call.
fn spawn_flush<C>(weak: &Weak<Shared<C>>, trigger: SaveTrigger)
where
    C: Clone + Send + Sync + 'static,
{
    if let Some(shared) = weak.upgrade() {
        tokio::spawn(shared.flush(trigger));
    }
}
