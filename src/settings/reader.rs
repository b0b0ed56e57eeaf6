/*!
 * Settings reader
 *
 * Reads and parses the TOML settings file.
 */

use anyhow::Context;
use std::path::Path;
use tokio::fs;

use super::{AppSettings, SettingsSource};
use crate::utils::error::AppResult;

/// Load settings from `path`. A missing file yields defaults.
///
/// Runs before logging is set up, so it reports where the settings came
/// from instead of logging it.
pub async fn load_settings(path: &Path) -> AppResult<(AppSettings, SettingsSource)> {
    if !path.exists() {
        return Ok((AppSettings::default(), SettingsSource::Defaults));
    }

    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read settings file {}", path.display()))?;

    let settings = parse_settings(&content)
        .with_context(|| format!("invalid settings file {}", path.display()))?;
    Ok((settings, SettingsSource::File(path.to_path_buf())))
}

/// Parse and validate settings TOML.
pub fn parse_settings(content: &str) -> AppResult<AppSettings> {
    let settings: AppSettings = toml::from_str(content).context("TOML parse failed")?;
    settings.autosave.validate()?;
    Ok(settings)
}
