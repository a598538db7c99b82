//! Settings model for the strata-term terminal emulator.
//!
//! This crate holds the records that make up a layered settings graph and the
//! arena they live in:
//!
//! - [`InheritanceGraph`]: handle-addressed arena with ordered multi-parent
//!   inheritance, lazy field resolution and sharing-preserving deep copy
//! - [`Profile`] and [`AppearanceConfig`]: per-session settings records
//! - [`GlobalSettings`]: app-wide settings, color schemes and the [`ActionMap`]
//! - [`SettingsLoadWarning`] / [`SettingsError`]: recoverable and fatal
//!   load outcomes
//! - Settings file watching (feature `watcher`)
//!
//! Loading, merging and validating whole settings files happens in the
//! `strata-term` crate; this crate has no file-system knowledge beyond the
//! watcher.

pub mod actions;
pub mod color_scheme;
pub mod defaults;
pub mod error;
pub mod global_settings;
pub mod guid;
pub mod inheritance;
pub mod profile;
pub mod warnings;
#[cfg(feature = "watcher")]
pub mod watcher;

pub use actions::{
    ActionAndArgs, ActionArgs, ActionMap, Command, IterateOn, NewTerminalArgs, ShortcutAction,
};
pub use color_scheme::{Color, ColorScheme};
pub use error::{DeserializationReport, SettingsError};
pub use global_settings::{
    AppTheme, GlobalSettings, LaunchMode, ResolvedGlobals, TabSwitcherMode, TabWidthMode,
    WindowingBehavior,
};
pub use guid::{derive_profile_guid, parse_guid};
pub use inheritance::{Handle, Inheritable, InheritanceGraph, Resolved};
pub use profile::{
    AntialiasingMode, AppearanceConfig, AppearanceSource, AppearanceView, BellStyle,
    CloseOnExitMode, CursorShape, FontConfig, FontWeight, Origin, Profile, ResolvedProfile,
    StretchMode,
};
pub use warnings::SettingsLoadWarning;
#[cfg(feature = "watcher")]
pub use watcher::{SettingsReloadEvent, SettingsWatcher};
