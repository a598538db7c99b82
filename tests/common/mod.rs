//! Shared integration test helpers for strata-term.
//!
//! Include this module at the top of each test file that needs it:
//!
//! ```ignore
//! mod common;
//! use common::{TestContext, FixedGenerator};
//! ```
//!
//! The `#[allow(dead_code)]` attribute suppresses warnings when only a subset
//! of helpers are used per file.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use strata_config::Profile;
use strata_term::fragments::{FragmentCatalog, StaticFragmentCatalog};
use strata_term::generators::ProfileGenerator;
use strata_term::settings::{LoadOptions, Settings};

/// Namespace used by [`FixedGenerator`].
pub const TEST_SHELLS: &str = "Test.Shells";

/// Generator that always produces the same profiles, one per name, each
/// running `/bin/<name>`.
pub struct FixedGenerator {
    pub namespace: &'static str,
    pub names: Vec<&'static str>,
}

impl FixedGenerator {
    pub fn shells(names: &[&'static str]) -> Self {
        Self {
            namespace: TEST_SHELLS,
            names: names.to_vec(),
        }
    }

    pub fn boxed(names: &[&'static str]) -> Vec<Box<dyn ProfileGenerator>> {
        vec![Box::new(Self::shells(names))]
    }
}

impl ProfileGenerator for FixedGenerator {
    fn namespace(&self) -> &str {
        self.namespace
    }

    fn generate_profiles(&self, profiles: &mut Vec<Profile>) -> anyhow::Result<()> {
        for name in &self.names {
            let mut profile = Profile::new(*name);
            profile.commandline = Some(format!("/bin/{name}"));
            profiles.push(profile);
        }
        Ok(())
    }

    fn preferred_default_profile_name(&self) -> Option<String> {
        self.names.first().map(|name| name.to_string())
    }
}

/// A temporary directory holding `settings.json` and `state.json`.
///
/// The directory is removed when the context is dropped.
pub struct TestContext {
    /// Kept alive for the lifetime of the context.
    pub dir: TempDir,
    pub settings_path: PathBuf,
}

impl TestContext {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let settings_path = dir.path().join("settings.json");
        Self { dir, settings_path }
    }

    /// A context whose settings file already holds `json`.
    pub fn with_settings(json: &str) -> Self {
        let ctx = Self::new();
        ctx.write_settings(json);
        ctx
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_settings(&self, json: &str) {
        fs::write(&self.settings_path, json).expect("Failed to write settings file");
    }

    pub fn read_settings(&self) -> serde_json::Value {
        let text = fs::read_to_string(&self.settings_path).expect("Failed to read settings file");
        serde_json::from_str(&text).expect("settings file is valid JSON")
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.path().join("state.json")
    }

    /// Options for this context's files, with no generators or fragments.
    pub fn options(&self) -> LoadOptions {
        LoadOptions::for_settings_file(&self.settings_path).without_generators()
    }

    /// Load with no generators and no fragments.
    pub fn load(&self) -> Settings {
        Settings::load_with(&self.options(), &[], &StaticFragmentCatalog::new())
    }

    /// Load with explicit generators and fragments.
    pub fn load_with(
        &self,
        generators: &[Box<dyn ProfileGenerator>],
        catalog: &dyn FragmentCatalog,
    ) -> Settings {
        Settings::load_with(&self.options(), generators, catalog)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Names of the visible profiles, in list order.
pub fn active_names(settings: &Settings) -> Vec<String> {
    settings.active_profiles().map(|p| p.name()).collect()
}
