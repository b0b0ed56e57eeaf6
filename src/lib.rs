//! Auto-save coordination for editable content
//!
//! Main pieces:
//! - `autosave`: the coordinator, its configuration and persistence backends
//! - `settings`: TOML settings file for the command-line driver
//! - `utils`: error aliases and logging setup

pub mod autosave; // auto-save coordinator
pub mod settings; // settings file
pub mod utils; // errors and logging

pub use autosave::{
    AutoSaveConfig, AutoSaveConfigPatch, AutoSaveCoordinator, AutoSaveError, AutoSaveState,
    ContentPersistence, SaveTrigger,
};
