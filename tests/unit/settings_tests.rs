/*!
 * Settings file loading tests
 */

use autosave_lib::settings::{load_settings, AppSettings, SettingsSource};
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn test_missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let (settings, source) = load_settings(&dir.path().join("absent.toml"))
        .await
        .unwrap();
    assert_eq!(settings, AppSettings::default());
    assert_eq!(source, SettingsSource::Defaults);
}

#[tokio::test]
async fn test_loads_autosave_table() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("autosave.toml");
    tokio::fs::write(
        &path,
        "[autosave]\nenabled = false\ninterval_ms = 15000\nshow_notifications = false\n",
    )
    .await
    .unwrap();

    let (settings, source) = load_settings(&path).await.unwrap();
    assert_eq!(source, SettingsSource::File(path.clone()));
    assert!(!settings.autosave.enabled);
    assert_eq!(settings.autosave.interval, Duration::from_secs(15));
    assert!(!settings.autosave.show_notifications);
    assert_eq!(settings.logging.level, "info");
}

#[tokio::test]
async fn test_malformed_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    tokio::fs::write(&path, "[autosave\nmax_retries = ").await.unwrap();

    let err = load_settings(&path).await.unwrap_err();
    assert!(format!("{:#}", err).contains("broken.toml"));
}
