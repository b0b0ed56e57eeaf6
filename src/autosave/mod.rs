//! Auto-save module
//!
//! Coordinates saving one piece of editable content:
//! - debounced saves after edits settle
//! - periodic saves bounding how stale persisted content can get
//! - failure counting that switches auto-save off after `max_retries`
//! - manual saves that bring it back

pub mod config;
mod coordinator;
pub mod error;
pub mod events;
pub mod notifier;
pub mod persistence;
pub mod types;

pub use config::{AutoSaveConfig, AutoSaveConfigPatch};
pub use coordinator::{AutoSaveCoordinator, AutoSaveCoordinatorBuilder, ErrorObserver};
pub use error::{AutoSaveError, AutoSaveResult};
pub use events::{AutoSaveEvent, AutoSaveEventSender};
pub use notifier::{NotificationLevel, SaveNotification, SaveNotifier, TracingNotifier};
pub use persistence::{persist_fn, ContentPersistence, FilePersistence, FnPersistence};
pub use types::{AutoSaveState, DisabledReason, SaveStatus, SaveTrigger};
