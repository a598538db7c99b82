//! Settings file watcher for automatic reload.
//!
//! Watches settings.json for changes and emits reload events. Editors often
//! write a file several times per save, so events closer together than the
//! debounce delay collapse into one.

use anyhow::{Context, Result};
use notify::{Config as NotifyConfig, Event, PollWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::{Duration, Instant};

/// Event indicating the settings file changed and should be reloaded.
#[derive(Debug, Clone)]
pub struct SettingsReloadEvent {
    /// Path to the settings file that changed.
    pub path: PathBuf,
}

/// Watches one settings file and queues reload events.
pub struct SettingsWatcher {
    /// Kept alive to keep watching.
    _watcher: Box<dyn Watcher + Send>,
    event_receiver: Receiver<SettingsReloadEvent>,
}

impl std::fmt::Debug for SettingsWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsWatcher").finish_non_exhaustive()
    }
}

/// Shared state for one watched file, cloned into each backend's handler.
#[derive(Clone)]
struct EventFilter {
    filename: OsString,
    path: PathBuf,
    debounce_delay: Duration,
    tx: Sender<SettingsReloadEvent>,
    last_event_time: Arc<Mutex<Option<Instant>>>,
}

impl EventFilter {
    fn handle(&self, result: std::result::Result<Event, notify::Error>) {
        let Ok(event) = result else {
            return;
        };

        // Create covers editors that save via rename.
        if !matches!(
            event.kind,
            notify::EventKind::Modify(_) | notify::EventKind::Create(_)
        ) {
            return;
        }

        if !event
            .paths
            .iter()
            .any(|p| p.file_name().is_some_and(|f| f == self.filename))
        {
            return;
        }

        if !self.passes_debounce(Instant::now()) {
            log::trace!("Debouncing settings reload event");
            return;
        }

        log::info!("Settings file changed: {}", self.path.display());
        let event = SettingsReloadEvent {
            path: self.path.clone(),
        };
        if let Err(e) = self.tx.send(event) {
            log::error!("Failed to send settings reload event: {}", e);
        }
    }

    fn passes_debounce(&self, now: Instant) -> bool {
        let mut last = self.last_event_time.lock();
        match *last {
            Some(previous) if now.duration_since(previous) < self.debounce_delay => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

impl SettingsWatcher {
    /// Start watching `settings_path`.
    ///
    /// Uses the platform's native watcher and falls back to polling every
    /// 500 ms when the native backend cannot start (containers, network file
    /// systems).
    ///
    /// # Errors
    /// Returns an error if the file does not exist or neither backend can
    /// watch its directory.
    pub fn new(settings_path: &Path, debounce_delay_ms: u64) -> Result<Self> {
        if !settings_path.exists() {
            anyhow::bail!("Settings file not found: {}", settings_path.display());
        }

        let canonical = settings_path
            .canonicalize()
            .unwrap_or_else(|_| settings_path.to_path_buf());
        let filename = canonical
            .file_name()
            .context("Settings path has no filename")?
            .to_os_string();
        let parent_dir = canonical
            .parent()
            .context("Settings path has no parent directory")?
            .to_path_buf();

        let (tx, rx) = channel::<SettingsReloadEvent>();
        let filter = EventFilter {
            filename,
            path: canonical.clone(),
            debounce_delay: Duration::from_millis(debounce_delay_ms),
            tx,
            last_event_time: Arc::new(Mutex::new(None)),
        };

        let mut watcher = Self::create_watcher(filter)?;
        watcher
            .watch(&parent_dir, RecursiveMode::NonRecursive)
            .with_context(|| {
                format!(
                    "Failed to watch settings directory: {}",
                    parent_dir.display()
                )
            })?;

        log::info!("Settings hot reload: watching {}", canonical.display());

        Ok(Self {
            _watcher: watcher,
            event_receiver: rx,
        })
    }

    fn create_watcher(filter: EventFilter) -> Result<Box<dyn Watcher + Send>> {
        let native = filter.clone();
        match notify::recommended_watcher(move |res: notify::Result<Event>| native.handle(res)) {
            Ok(w) => {
                log::debug!("Settings watcher: using native backend");
                Ok(Box::new(w))
            }
            Err(e) => {
                log::warn!(
                    "Settings watcher: native backend unavailable ({}); falling back to PollWatcher",
                    e
                );
                let poll_watcher = PollWatcher::new(
                    move |res: notify::Result<Event>| filter.handle(res),
                    NotifyConfig::default().with_poll_interval(Duration::from_millis(500)),
                )
                .context("Failed to create fallback PollWatcher")?;
                Ok(Box::new(poll_watcher))
            }
        }
    }

    /// Next pending reload event, without blocking.
    pub fn try_recv(&self) -> Option<SettingsReloadEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Drain pending events, returning true if there was at least one.
    pub fn take_pending(&self) -> bool {
        let mut any = false;
        while self.try_recv().is_some() {
            any = true;
        }
        any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_settings(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("settings.json");
        fs::write(&path, body).expect("Failed to write settings");
        path
    }

    #[test]
    fn test_watcher_creation_with_existing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_settings(&temp_dir, "{}");
        assert!(SettingsWatcher::new(&path, 100).is_ok());
    }

    #[test]
    fn test_watcher_creation_with_nonexistent_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("missing").join("settings.json");
        assert!(SettingsWatcher::new(&path, 100).is_err());
    }

    #[test]
    fn test_no_initial_events() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_settings(&temp_dir, "{}");
        let watcher = SettingsWatcher::new(&path, 100).expect("Failed to create watcher");
        assert!(watcher.try_recv().is_none());
        assert!(!watcher.take_pending());
    }

    #[test]
    fn test_file_change_detection() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_settings(&temp_dir, "{}");
        let watcher = SettingsWatcher::new(&path, 50).expect("Failed to create watcher");

        std::thread::sleep(Duration::from_millis(100));
        fs::write(&path, "{ \"initialRows\": 40 }").expect("Failed to write settings");
        std::thread::sleep(Duration::from_millis(700));

        // Delivery is platform-dependent; only check the event shape.
        if let Some(event) = watcher.try_recv() {
            assert!(event.path.ends_with("settings.json"));
        }
    }

    #[test]
    fn test_debounce_collapses_rapid_events() {
        let (tx, _rx) = channel();
        let filter = EventFilter {
            filename: OsString::from("settings.json"),
            path: PathBuf::from("settings.json"),
            debounce_delay: Duration::from_millis(200),
            tx,
            last_event_time: Arc::new(Mutex::new(None)),
        };
        let start = Instant::now();
        assert!(filter.passes_debounce(start));
        assert!(!filter.passes_debounce(start + Duration::from_millis(50)));
        assert!(filter.passes_debounce(start + Duration::from_millis(300)));
    }

    #[test]
    fn test_debug_impl() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = write_settings(&temp_dir, "{}");
        let watcher = SettingsWatcher::new(&path, 100).expect("Failed to create watcher");
        assert!(format!("{:?}", watcher).contains("SettingsWatcher"));
    }
}
