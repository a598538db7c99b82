//! The settings a running terminal reads from.
//!
//! [`LiveSettings`] publishes one immutable [`Settings`] snapshot at a time.
//! Readers take a snapshot with [`LiveSettings::current`] and never block.
//! Reloads are serialized by a single in-flight guard: a reload requested
//! while another is running returns [`ReloadOutcome::Busy`] instead of
//! queuing behind it.

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::Arc;

use strata_config::SettingsWatcher;

use crate::fragments::{DirectoryFragmentCatalog, FragmentCatalog};
use crate::generators::{ProfileGenerator, default_generators};
use crate::settings::{LoadOptions, Settings};

/// Debounce used by [`LiveSettings::watch`].
pub const DEFAULT_WATCH_DEBOUNCE_MS: u64 = 100;

/// Result of a reload request.
#[derive(Debug, Clone)]
pub enum ReloadOutcome {
    /// New settings were published.
    Reloaded(Arc<Settings>),
    /// The file could not be loaded; the previous settings stay live.
    Failed(String),
    /// Another reload was already running.
    Busy,
}

pub struct LiveSettings {
    current: ArcSwap<Settings>,
    load_guard: Mutex<()>,
    options: LoadOptions,
    generators: Vec<Box<dyn ProfileGenerator>>,
    catalog: Box<dyn FragmentCatalog>,
}

impl std::fmt::Debug for LiveSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSettings")
            .field("options", &self.options)
            .field("generators", &self.generators.len())
            .finish_non_exhaustive()
    }
}

impl LiveSettings {
    /// Load with the builtin generators and on-disk fragments.
    pub fn load(options: LoadOptions) -> Self {
        let generators = if options.run_generators {
            default_generators()
        } else {
            Vec::new()
        };
        let catalog = Box::new(DirectoryFragmentCatalog::new(options.fragment_roots.clone()));
        Self::with_sources(options, generators, catalog)
    }

    /// Load with explicit generators and fragment catalog, used again on
    /// every reload.
    pub fn with_sources(
        options: LoadOptions,
        generators: Vec<Box<dyn ProfileGenerator>>,
        catalog: Box<dyn FragmentCatalog>,
    ) -> Self {
        let initial = Settings::load_with(&options, &generators, catalog.as_ref());
        Self {
            current: ArcSwap::from_pointee(initial),
            load_guard: Mutex::new(()),
            options,
            generators,
            catalog,
        }
    }

    /// Snapshot of the published settings.
    pub fn current(&self) -> Arc<Settings> {
        self.current.load_full()
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load the settings again and publish them if the load succeeded.
    pub fn reload(&self) -> ReloadOutcome {
        let Some(_guard) = self.load_guard.try_lock() else {
            debug_log!("LIVE", "Settings reload already in progress");
            return ReloadOutcome::Busy;
        };

        let settings = Settings::load_with(&self.options, &self.generators, self.catalog.as_ref());
        if let Some(error) = settings.load_error() {
            log::warn!("Keeping previous settings: {}", error);
            return ReloadOutcome::Failed(error.to_string());
        }

        let settings = Arc::new(settings);
        self.current.store(Arc::clone(&settings));
        debug_info!("LIVE", "Settings reloaded");
        ReloadOutcome::Reloaded(settings)
    }

    /// [`reload`](Self::reload) on a tokio blocking worker.
    pub async fn reload_async(self: &Arc<Self>) -> anyhow::Result<ReloadOutcome> {
        let this = Arc::clone(self);
        let outcome = tokio::task::spawn_blocking(move || this.reload()).await?;
        Ok(outcome)
    }

    /// Watch the settings file for edits.
    pub fn watch(&self) -> anyhow::Result<SettingsWatcher> {
        SettingsWatcher::new(&self.options.settings_path, DEFAULT_WATCH_DEBOUNCE_MS)
    }

    /// Reload if `watcher` saw a change since the last call.
    pub fn reload_if_changed(&self, watcher: &SettingsWatcher) -> Option<ReloadOutcome> {
        watcher.take_pending().then(|| self.reload())
    }
}
