//! Settings file paths and disk writes.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// `<config_dir>/strata-term`
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("strata-term")
}

/// Default location of the user's settings file.
pub fn default_settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Default location of the application state file.
pub fn default_state_path() -> PathBuf {
    config_dir().join("state.json")
}

/// Write `contents` to `path` through a sibling temp file and a rename, so
/// readers never observe a half-written file.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let temp_path = temp_path_for(path);
    fs::write(&temp_path, contents)
        .with_context(|| format!("Failed to write {:?}", temp_path))?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to move {:?} into place", temp_path))?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// `settings.json.2026-01-31T09-15-00.backup` next to `path`.
pub fn backup_path_for(path: &Path, timestamp: chrono::DateTime<chrono::Local>) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.backup", timestamp.format("%Y-%m-%dT%H-%M-%S")));
    path.with_file_name(name)
}

/// Copy an existing file aside before it is overwritten.
///
/// Returns the backup path, or `None` when there was nothing to back up.
pub fn backup_existing(path: &Path) -> Result<Option<PathBuf>> {
    if !path.is_file() {
        return Ok(None);
    }
    let backup = backup_path_for(path, chrono::Local::now());
    fs::copy(path, &backup).with_context(|| format!("Failed to back up {:?}", path))?;
    log::info!("Backed up settings to {:?}", backup);
    Ok(Some(backup))
}

/// Back up the current file, then atomically replace it with `json`.
pub fn write_settings_file(path: &Path, json: &serde_json::Value) -> Result<()> {
    let text = serde_json::to_string_pretty(json)?;
    backup_existing(path)?;
    write_atomic(path, &text)?;
    log::info!("Wrote settings to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_parents_and_leaves_no_temp() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("settings.json");
        write_atomic(&path, "{}").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_backup_name() {
        let ts = chrono::Local
            .with_ymd_and_hms(2026, 1, 31, 9, 15, 0)
            .unwrap();
        let backup = backup_path_for(Path::new("/cfg/settings.json"), ts);
        assert_eq!(
            backup,
            PathBuf::from("/cfg/settings.json.2026-01-31T09-15-00.backup")
        );
    }

    #[test]
    fn test_write_settings_file_backs_up_previous() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "{\"old\": true}").unwrap();

        write_settings_file(&path, &serde_json::json!({ "new": true })).unwrap();

        let backups: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".backup"))
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(backups[0].path()).unwrap(), "{\"old\": true}");
        assert!(fs::read_to_string(&path).unwrap().contains("\"new\": true"));
    }

    #[test]
    fn test_no_backup_for_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(backup_existing(&temp_dir.path().join("none.json")).unwrap().is_none());
    }
}
