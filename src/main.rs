//! Command-line driver for the auto-save coordinator
//!
//! Every line read from stdin is appended to the document as a user edit.
//! Lines starting with `:` are commands: `:save`, `:status`, `:enable`,
//! `:disable`, `:quit`.

use anyhow::Context;
use autosave_lib::autosave::{
    AutoSaveConfigPatch, AutoSaveCoordinator, AutoSaveEvent, FilePersistence,
};
use autosave_lib::settings::{load_settings, AppSettings, SettingsSource};
use autosave_lib::utils::{init_logging, AppResult};
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

#[derive(Debug, Parser)]
#[command(name = "autosave", version, about = "Edit a document from stdin with auto-save")]
struct Cli {
    /// File the document is saved to
    output: PathBuf,

    /// TOML settings file
    #[arg(long, default_value = "autosave.toml")]
    config: PathBuf,

    /// Quiet period after the last edit, in milliseconds
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Forced-save cadence while there are unsaved edits, in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Consecutive failures before auto-save switches off
    #[arg(long)]
    max_retries: Option<u32>,

    /// Only user edits schedule a debounced save
    #[arg(long)]
    only_on_user_action: bool,

    /// Suppress save notifications
    #[arg(long)]
    quiet: bool,

    /// Log level used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn apply_overrides(&self, settings: &mut AppSettings) {
        let config = &mut settings.autosave;
        if let Some(ms) = self.debounce_ms {
            config.debounce_time = Duration::from_millis(ms);
        }
        if let Some(ms) = self.interval_ms {
            config.interval = Duration::from_millis(ms);
        }
        if let Some(retries) = self.max_retries {
            config.max_retries = retries;
        }
        if self.only_on_user_action {
            config.only_on_user_action = true;
        }
        if self.quiet {
            config.show_notifications = false;
        }
        if let Some(level) = &self.log_level {
            settings.logging.level = level.clone();
        }
    }
}

enum Command {
    Save,
    Status,
    Enable,
    Disable,
    Quit,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let name = line.strip_prefix(':')?.trim();
        Some(match name {
            "save" | "w" => Command::Save,
            "status" => Command::Status,
            "enable" => Command::Enable,
            "disable" => Command::Disable,
            "quit" | "q" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        })
    }
}

/// Wait until the in-flight save reports success or failure.
async fn wait_for_save(
    coordinator: &AutoSaveCoordinator<String>,
    events: &mut broadcast::Receiver<AutoSaveEvent>,
) {
    loop {
        match events.recv().await {
            Ok(AutoSaveEvent::Saved { .. }) | Ok(AutoSaveEvent::SaveFailed { .. }) => return,
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                debug!("Skipped {} auto-save events while waiting", skipped);
                if !coordinator.state().is_auto_saving {
                    return;
                }
            }
            Err(RecvError::Closed) => return,
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let (mut settings, source) = load_settings(&cli.config).await?;
    cli.apply_overrides(&mut settings);
    init_logging(&settings.logging.level)?;
    match source {
        SettingsSource::File(path) => info!("Settings loaded from {}", path.display()),
        SettingsSource::Defaults => info!(
            "Settings file {} not found, using defaults",
            cli.config.display()
        ),
    }

    let mut document = match tokio::fs::read_to_string(&cli.output).await {
        Ok(existing) => existing,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("cannot read {}", cli.output.display()))
        }
    };

    let persistence = FilePersistence::new(&cli.output);
    let coordinator: AutoSaveCoordinator<String> = AutoSaveCoordinator::builder(persistence)
        .config(settings.autosave.clone())
        .on_error(|err| debug!("Save error observed: {}", err))
        .build()
        .context("invalid auto-save configuration")?;

    let mut events = coordinator.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let AutoSaveEvent::Disabled { reason, .. } = event {
                eprintln!("auto-save disabled ({:?}); type :save to retry", reason);
            }
        }
    });

    info!("Editing {}", cli.output.display());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("cannot read stdin")? {
        match Command::parse(&line) {
            None => {
                document.push_str(&line);
                document.push('\n');
                coordinator.update_content(
                    document.clone(),
                    json!({ "bytes": document.len() }),
                    true,
                );
            }
            Some(Command::Save) => {
                if !coordinator.manual_save().await {
                    eprintln!("save failed");
                }
            }
            Some(Command::Status) => {
                let state = coordinator.state();
                eprintln!(
                    "{} (failures: {}, last saved: {})",
                    coordinator.status(),
                    state.failure_count,
                    state
                        .last_saved
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "never".to_string())
                );
            }
            Some(Command::Enable) => {
                coordinator.update_config(AutoSaveConfigPatch::enabled(true))?
            }
            Some(Command::Disable) => {
                coordinator.update_config(AutoSaveConfigPatch::enabled(false))?
            }
            Some(Command::Quit) => break,
            Some(Command::Unknown(name)) => warn!("Unknown command :{}", name),
        }
    }

    // Subscribe before checking so the completion event cannot be missed.
    let mut settled = coordinator.subscribe();
    if coordinator.state().is_auto_saving {
        wait_for_save(&coordinator, &mut settled).await;
    }
    if coordinator.has_unsaved_changes() && !coordinator.manual_save().await {
        warn!("Exiting with unsaved changes");
    }
    coordinator.shutdown();
    Ok(())
}
