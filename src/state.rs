//! Persisted application state.
//!
//! `state.json` sits next to `settings.json` and remembers which generated
//! profiles the loader has already shown once. A profile that is generated
//! again after the user deleted it from their settings file is recognized
//! through this set and stays hidden.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::settings::persistence::write_atomic;
use strata_config::guid::format_guid;
use strata_config::parse_guid;

/// On-disk shape of `state.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StateFile {
    generated_profiles: Vec<String>,
}

/// Application state shared by every load of one settings file.
#[derive(Debug)]
pub struct ApplicationState {
    /// `None` for in-memory state that is never written.
    path: Option<PathBuf>,
    generated_profiles: Mutex<HashSet<Uuid>>,
}

impl ApplicationState {
    /// Load state from `path`. A missing or unreadable file yields empty state.
    pub fn load(path: &Path) -> Self {
        let generated_profiles = match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<StateFile>(&text) {
                Ok(file) => file
                    .generated_profiles
                    .iter()
                    .filter_map(|s| parse_guid(s))
                    .collect(),
                Err(e) => {
                    log::warn!("Ignoring malformed state file {:?}: {}", path, e);
                    HashSet::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => {
                log::warn!("Failed to read state file {:?}: {}", path, e);
                HashSet::new()
            }
        };

        Self {
            path: Some(path.to_path_buf()),
            generated_profiles: Mutex::new(generated_profiles),
        }
    }

    /// State that lives only as long as this value.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            generated_profiles: Mutex::new(HashSet::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// GUIDs of every profile a generator or fragment has produced before.
    pub fn generated_profiles(&self) -> HashSet<Uuid> {
        self.generated_profiles.lock().clone()
    }

    /// Replace the remembered set and persist it.
    ///
    /// Write failures are logged; the in-memory value is updated regardless.
    pub fn set_generated_profiles(&self, guids: HashSet<Uuid>) {
        *self.generated_profiles.lock() = guids;
        if let Err(e) = self.save() {
            log::warn!("Failed to write application state: {:#}", e);
        }
    }

    /// Forget every remembered GUID.
    pub fn clear(&self) {
        self.set_generated_profiles(HashSet::new());
    }

    fn save(&self) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut generated_profiles: Vec<String> = self
            .generated_profiles
            .lock()
            .iter()
            .map(format_guid)
            .collect();
        generated_profiles.sort();

        let json = serde_json::to_string_pretty(&StateFile { generated_profiles })?;
        write_atomic(path, &json)
    }
}
