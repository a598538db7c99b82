// Library exports for testing and potential library use
//
// # Mutex Usage Policy
//
// Sync-only shared state uses `parking_lot::Mutex`: the in-flight load guard
// in `live`, the generated-profile set in `state` and the debug log file.
// Settings snapshots are published through `arc_swap::ArcSwap`, so readers
// never take a lock.

/// Application version (root crate version, for use by sub-crates).
/// Sub-crates should receive this via parameter rather than using
/// `env!("CARGO_PKG_VERSION")` which resolves to the sub-crate's version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[macro_use]
pub mod debug;

pub mod cli;
pub mod fragments;
pub mod generators;
pub mod live;
pub mod settings;
pub mod state;
pub mod strings;

pub use fragments::{DirectoryFragmentCatalog, FragmentCatalog, StaticFragmentCatalog};
pub use generators::{ProfileGenerator, ShellProfileGenerator, SshHostProfileGenerator};
pub use live::{LiveSettings, ReloadOutcome};
pub use settings::{LoadOptions, Settings, SettingsLoader};
pub use state::ApplicationState;
