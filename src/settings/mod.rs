//! The loaded settings graph.
//!
//! [`Settings`] owns the finalized profile and global-settings graphs produced
//! by a [`SettingsLoader`] run, validates them once, and then serves lookups
//! and the few edits the settings UI needs (new, duplicate, remove, scheme
//! rename). [`Settings::copy`] produces an independent draft for editing.

pub mod document;
pub mod loader;
pub mod persistence;
pub mod validation;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde_json::{Map, Value};
use uuid::Uuid;

use strata_config::guid::format_guid;
use strata_config::{
    ActionMap, ColorScheme, Command, GlobalSettings, Handle, InheritanceGraph, NewTerminalArgs,
    Origin, Profile, ResolvedGlobals, ResolvedProfile, SettingsError, SettingsLoadWarning,
    parse_guid,
};
use strata_keybindings::parse_key_chord;

use crate::fragments::{DirectoryFragmentCatalog, FragmentCatalog};
use crate::generators::{ProfileGenerator, default_generators};
use crate::state::ApplicationState;
use crate::strings;

pub use loader::{ParsedSettings, SettingsLoader};

/// Built-in defaults, the lowest layer of every load.
pub const INBOX_JSON: &str = include_str!("../../assets/defaults.json");

/// Template used as the user's file on first run.
pub const USER_DEFAULTS_JSON: &str = include_str!("../../assets/user-defaults.json");

/// GUID of the builtin "System Shell" profile shipped in [`INBOX_JSON`].
pub const BUILTIN_SHELL_GUID: Uuid = Uuid::from_u128(0x3449d4c4_9409_5e79_81e5_2744433fc3f0);

const HELP_URL: &str = "docs/settings.md";
const SCHEMA_URL: &str = "docs/settings.schema.json";

/// Where a full load reads from and writes to.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub settings_path: PathBuf,
    /// `None` keeps application state in memory only.
    pub state_path: Option<PathBuf>,
    pub fragment_roots: Vec<PathBuf>,
    pub run_generators: bool,
    /// Write the settings file back on first run.
    pub write_back: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            settings_path: persistence::default_settings_path(),
            state_path: Some(persistence::default_state_path()),
            fragment_roots: DirectoryFragmentCatalog::default_roots(),
            run_generators: true,
            write_back: true,
        }
    }
}

impl LoadOptions {
    /// Options for a settings file outside the default location. State is
    /// kept next to it; no fragment roots are searched.
    pub fn for_settings_file(path: impl Into<PathBuf>) -> Self {
        let settings_path = path.into();
        let state_path = settings_path.with_file_name("state.json");
        Self {
            settings_path,
            state_path: Some(state_path),
            fragment_roots: Vec::new(),
            run_generators: true,
            write_back: true,
        }
    }

    pub fn with_fragment_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.fragment_roots = roots;
        self
    }

    pub fn without_generators(mut self) -> Self {
        self.run_generators = false;
        self
    }
}

/// Finalized, validated settings.
#[derive(Debug)]
pub struct Settings {
    profiles: InheritanceGraph<Profile>,
    globals_graph: InheritanceGraph<GlobalSettings>,
    globals: Handle<GlobalSettings>,
    base_layer_profile: Handle<Profile>,
    all_profiles: Vec<Handle<Profile>>,
    active_profiles: Vec<Handle<Profile>>,
    warnings: Vec<SettingsLoadWarning>,
    load_error: Option<String>,
    deserialization_message: Option<String>,
}

impl Default for Settings {
    /// Settings with no profiles, the fallback when a load fails.
    fn default() -> Self {
        let mut profiles = InheritanceGraph::new();
        let base_layer_profile =
            profiles.insert(Profile::default().with_origin(Origin::ProfilesDefaults));
        let mut globals_graph = InheritanceGraph::new();
        let globals = globals_graph.insert(GlobalSettings::default());
        Self {
            profiles,
            globals_graph,
            globals,
            base_layer_profile,
            all_profiles: Vec::new(),
            active_profiles: Vec::new(),
            warnings: Vec::new(),
            load_error: None,
            deserialization_message: None,
        }
    }
}

impl Settings {
    /// Load with the builtin generators and on-disk fragments.
    ///
    /// Never fails: a fatal error yields empty settings carrying
    /// [`load_error`](Self::load_error).
    pub fn load_all(options: &LoadOptions) -> Self {
        let generators = if options.run_generators {
            default_generators()
        } else {
            Vec::new()
        };
        let catalog = DirectoryFragmentCatalog::new(options.fragment_roots.clone());
        Self::load_with(options, &generators, &catalog)
    }

    /// Load with explicit generators and fragment catalog.
    pub fn load_with(
        options: &LoadOptions,
        generators: &[Box<dyn ProfileGenerator>],
        catalog: &dyn FragmentCatalog,
    ) -> Self {
        let started = Instant::now();
        match Self::try_load(options, generators, catalog) {
            Ok(settings) => {
                log::info!(
                    "Loaded {} profiles from {:?} in {:?} ({} warnings)",
                    settings.all_profiles.len(),
                    options.settings_path,
                    started.elapsed(),
                    settings.warnings.len()
                );
                settings
            }
            Err(e) => {
                debug_error!("LOADER", "Failed to load settings from {:?}: {}", options.settings_path, e);
                Self::from_load_error(&e)
            }
        }
    }

    fn try_load(
        options: &LoadOptions,
        generators: &[Box<dyn ProfileGenerator>],
        catalog: &dyn FragmentCatalog,
    ) -> Result<Self, SettingsError> {
        let user_text = read_settings_file(&options.settings_path)?;
        let first_time_setup = user_text.trim().is_empty();
        let user_json = if first_time_setup {
            log::info!("No settings at {:?}; starting from defaults", options.settings_path);
            USER_DEFAULTS_JSON
        } else {
            &user_text
        };

        let mut loader = SettingsLoader::new(user_json, INBOX_JSON)?;
        loader.generate_profiles(generators);
        if first_time_setup {
            let preferred = generators
                .iter()
                .filter(|g| !loader.ignored_namespaces().contains(g.namespace()))
                .find_map(|g| g.preferred_default_profile_name());
            loader.fill_blanks_in_defaults_json(preferred.as_deref());
        }
        loader.merge_inbox_into_user_profiles();
        loader.merge_fragments_into_user_profiles(catalog);

        let state = match &options.state_path {
            Some(path) => ApplicationState::load(path),
            None => ApplicationState::in_memory(),
        };
        loader.disable_deleted_profiles(&state);
        loader.finalize_layering();

        let mut settings = Self::from_loader(loader)?;

        if first_time_setup && options.write_back {
            if let Err(e) = settings.write_settings_to_disk(&options.settings_path) {
                log::warn!("Failed to write initial settings: {:#}", e);
                settings
                    .warnings
                    .push(SettingsLoadWarning::FailedToWriteToSettings);
            }
        }

        Ok(settings)
    }

    /// The built-in defaults alone.
    pub fn load_defaults() -> Result<Self, SettingsError> {
        Self::from_json("", INBOX_JSON)
    }

    /// Parse, merge inbox profiles into the user's, finalize and validate.
    /// No generators, fragments or persisted state take part.
    pub fn from_json(user_json: &str, inbox_json: &str) -> Result<Self, SettingsError> {
        Self::from_loader(SettingsLoader::from_json(user_json, inbox_json)?)
    }

    /// Freeze a finished loader into settings and validate them.
    pub fn from_loader(loader: SettingsLoader) -> Result<Self, SettingsError> {
        let all_profiles = loader.user_settings.profiles;
        if all_profiles.is_empty() {
            return Err(SettingsError::NoProfiles);
        }

        let profiles = loader.profiles;
        let active_profiles: Vec<_> = all_profiles
            .iter()
            .copied()
            .filter(|&h| !profiles.view(h).hidden())
            .collect();
        if active_profiles.is_empty() {
            return Err(SettingsError::AllProfilesHidden);
        }

        let mut settings = Self {
            profiles,
            globals_graph: loader.globals,
            globals: loader.user_settings.globals,
            base_layer_profile: loader.user_settings.base_layer_profile,
            all_profiles,
            active_profiles,
            warnings: loader.warnings,
            load_error: None,
            deserialization_message: None,
        };
        settings.resolve_default_profile();
        settings.validate_settings();
        Ok(settings)
    }

    fn from_load_error(error: &SettingsError) -> Self {
        Self {
            load_error: Some(error.to_string()),
            deserialization_message: error.deserialization_report().map(ToString::to_string),
            ..Self::default()
        }
    }

    /// Independent deep copy. Records shared in this graph stay shared in
    /// the copy.
    pub fn copy(&self) -> Self {
        let mut profiles = InheritanceGraph::new();
        let mut visited = HashMap::new();
        let base_layer_profile =
            self.profiles
                .copy_interned(self.base_layer_profile, &mut profiles, &mut visited);
        let all_profiles: Vec<_> = self
            .all_profiles
            .iter()
            .map(|&h| self.profiles.copy_interned(h, &mut profiles, &mut visited))
            .collect();
        let active_profiles = self
            .active_profiles
            .iter()
            .filter_map(|h| visited.get(h).copied())
            .collect();

        let mut globals_graph = InheritanceGraph::new();
        let globals = self
            .globals_graph
            .copy_interned(self.globals, &mut globals_graph, &mut HashMap::new());

        Self {
            profiles,
            globals_graph,
            globals,
            base_layer_profile,
            all_profiles,
            active_profiles,
            warnings: self.warnings.clone(),
            load_error: self.load_error.clone(),
            deserialization_message: self.deserialization_message.clone(),
        }
    }

    pub fn warnings(&self) -> &[SettingsLoadWarning] {
        &self.warnings
    }

    /// The fatal error that emptied these settings, if any.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Location report for a malformed settings file.
    pub fn deserialization_message(&self) -> Option<&str> {
        self.deserialization_message.as_deref()
    }

    pub fn global_settings(&self) -> ResolvedGlobals<'_> {
        self.globals_graph.view(self.globals)
    }

    /// The user's `profiles.defaults` layer.
    pub fn profile_defaults(&self) -> ResolvedProfile<'_> {
        self.profiles.view(self.base_layer_profile)
    }

    pub fn action_map(&self) -> &ActionMap {
        &self.globals_graph.get(self.globals).action_map
    }

    /// Command bound to a chord written like `ctrl+shift+t`.
    pub fn command_for_keys(&self, keys: &str) -> Option<&Command> {
        let chord = parse_key_chord(keys).ok()?;
        self.action_map().command_for_chord(&chord)
    }

    pub fn color_schemes(&self) -> impl Iterator<Item = &ColorScheme> {
        self.globals_graph.get(self.globals).color_schemes.values()
    }

    pub fn all_profiles(&self) -> impl Iterator<Item = ResolvedProfile<'_>> {
        self.all_profiles.iter().map(|&h| self.profiles.view(h))
    }

    /// Profiles that are not hidden.
    pub fn active_profiles(&self) -> impl Iterator<Item = ResolvedProfile<'_>> {
        self.active_profiles.iter().map(|&h| self.profiles.view(h))
    }

    pub fn find_profile(&self, guid: Uuid) -> Option<ResolvedProfile<'_>> {
        self.all_profiles().find(|p| p.guid() == guid)
    }

    /// GUID of the profile `name` refers to.
    ///
    /// A 38-character braced string is read as a GUID and must belong to a
    /// profile; anything else is matched against profile names.
    pub fn profile_guid_by_name(&self, name: &str) -> Option<Uuid> {
        if name.len() == 38 && name.starts_with('{') {
            return parse_guid(name).filter(|guid| self.find_profile(*guid).is_some());
        }
        self.all_profiles()
            .find(|p| p.name() == name)
            .map(|p| p.guid())
    }

    pub fn profile_by_name(&self, name: &str) -> Option<ResolvedProfile<'_>> {
        self.profile_guid_by_name(name)
            .and_then(|guid| self.find_profile(guid))
    }

    /// Position `index` in the visible profile list.
    pub fn profile_by_index(&self, index: usize) -> Option<ResolvedProfile<'_>> {
        self.active_profiles
            .get(index)
            .map(|&h| self.profiles.view(h))
    }

    pub fn default_profile(&self) -> Option<ResolvedProfile<'_>> {
        self.global_settings()
            .default_profile()
            .and_then(|guid| self.find_profile(guid))
    }

    /// Profile a new-terminal action should open: the named profile, else
    /// the indexed one, else the default.
    pub fn profile_for_args(&self, args: Option<&NewTerminalArgs>) -> Option<ResolvedProfile<'_>> {
        if let Some(args) = args {
            if let Some(profile) = args.profile.as_deref().and_then(|p| self.profile_by_name(p)) {
                return Some(profile);
            }
            if let Some(profile) = args.index.and_then(|i| self.profile_by_index(i)) {
                return Some(profile);
            }
        }
        self.default_profile()
    }

    /// Scheme used by the focused appearance of profile `guid`.
    pub fn color_scheme_for_profile(&self, guid: Uuid) -> Option<&ColorScheme> {
        let name = self.find_profile(guid)?.default_appearance().color_scheme();
        self.globals_graph.get(self.globals).color_scheme(&name)
    }

    fn first_active_guid(&self) -> Option<Uuid> {
        self.active_profiles().next().map(|p| p.guid())
    }

    fn profile_name_exists(&self, name: &str) -> bool {
        self.all_profiles().any(|p| p.name() == name)
    }

    fn append_profile(&mut self, profile: Profile) -> Handle<Profile> {
        let handle = self.profiles.insert_child(profile, self.base_layer_profile);
        self.all_profiles.push(handle);
        if !self.profiles.view(handle).hidden() {
            self.active_profiles.push(handle);
        }
        handle
    }

    /// Add an empty profile named `Profile N` with a random GUID.
    pub fn create_new_profile(&mut self) -> ResolvedProfile<'_> {
        let count = self.all_profiles.len() + 1;
        let name = (0..)
            .map(|i| format!("{} {}", strings::NEW_PROFILE_PREFIX, count + i))
            .find(|name| !self.profile_name_exists(name))
            .unwrap_or_default();

        let profile = Profile::new(name).with_guid(Uuid::new_v4());
        let handle = self.append_profile(profile);
        self.profiles.view(handle)
    }

    /// Add a copy of profile `guid` named `<name> (Copy)`.
    ///
    /// Values the source only inherits from `profiles.defaults` are left to
    /// inheritance rather than written into the copy.
    pub fn duplicate_profile(&mut self, guid: Uuid) -> Option<ResolvedProfile<'_>> {
        let source = self.find_profile(guid)?;
        let source_name = source.name();
        let hidden = source.hidden();
        let mut duplicate = Profile::copy_settings_from(source);

        let mut name = format!("{} ({})", source_name, strings::COPY_SUFFIX);
        let mut candidate = 0;
        while self.profile_name_exists(&name) && candidate <= self.all_profiles.len() {
            name = format!("{} ({} {})", source_name, strings::COPY_SUFFIX, candidate + 2);
            candidate += 1;
        }

        duplicate.name = Some(name);
        duplicate.guid = Some(Uuid::new_v4());
        duplicate.hidden = Some(hidden);
        duplicate.origin = Origin::User;

        let handle = self.append_profile(duplicate);
        Some(self.profiles.view(handle))
    }

    /// Drop profile `guid` from the lists. Returns false if it was not there.
    pub fn remove_profile(&mut self, guid: Uuid) -> bool {
        let Some(position) = self
            .all_profiles
            .iter()
            .position(|&h| self.profiles.view(h).guid() == guid)
        else {
            return false;
        };
        let handle = self.all_profiles.remove(position);
        self.active_profiles.retain(|&h| h != handle);

        if self.global_settings().default_profile() == Some(guid) {
            let fallback = self.first_active_guid();
            self.globals_graph
                .get_mut(self.globals)
                .resolved_default_profile = fallback;
        }
        true
    }

    /// Point every `colorScheme` written as `old` at `new`, in
    /// `profiles.defaults` and every profile, focused and unfocused.
    pub fn update_color_scheme_references(&mut self, old: &str, new: &str) {
        let mut changed = 0;
        for handle in std::iter::once(self.base_layer_profile).chain(self.all_profiles.iter().copied())
        {
            if self.profiles.get_mut(handle).replace_color_scheme(old, new) {
                changed += 1;
            }
        }
        log::debug!("Renamed scheme {:?} to {:?} on {} records", old, new, changed);
    }

    /// Rename scheme `old` and every reference to it.
    pub fn rename_color_scheme(&mut self, old: &str, new: &str) -> bool {
        let globals = self.globals_graph.get_mut(self.globals);
        let Some(mut scheme) = globals.color_schemes.remove(old) else {
            return false;
        };
        scheme.name = new.to_string();
        scheme.origin = Origin::User;
        globals.add_color_scheme(scheme);
        self.update_color_scheme_references(old, new);
        true
    }

    /// The user-layer values as a settings document.
    ///
    /// Only what the user's file and its synthesized profiles hold is
    /// written; inherited values stay implicit. Deleted profiles and
    /// built-in schemes are left out.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        let mut json = Map::new();
        json.insert("$help".to_string(), Value::from(HELP_URL));
        json.insert("$schema".to_string(), Value::from(SCHEMA_URL));

        if let Value::Object(globals) = serde_json::to_value(self.globals_graph.get(self.globals))? {
            json.extend(globals);
        }

        let list = self
            .all_profiles
            .iter()
            .map(|&h| self.profiles.get(h))
            .filter(|p| !p.deleted)
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<_>>>()?;
        let mut profiles = Map::new();
        profiles.insert(
            "defaults".to_string(),
            serde_json::to_value(self.profiles.get(self.base_layer_profile))?,
        );
        profiles.insert("list".to_string(), Value::Array(list));
        json.insert("profiles".to_string(), Value::Object(profiles));

        let schemes = self
            .color_schemes()
            .filter(|s| s.origin == Origin::User)
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<_>>>()?;
        json.insert("schemes".to_string(), Value::Array(schemes));
        json.insert("actions".to_string(), self.action_map().to_json());

        Ok(Value::Object(json))
    }

    /// Write [`to_json`](Self::to_json) to `path`, keeping a backup of the
    /// previous file.
    pub fn write_settings_to_disk(&self, path: &Path) -> anyhow::Result<()> {
        let json = self.to_json()?;
        persistence::write_settings_file(path, &json)?;
        log::info!("Wrote settings to {:?}", path);
        Ok(())
    }

    /// The effective values of one profile, for display.
    pub fn resolved_profile_json(&self, guid: Uuid) -> Option<Value> {
        let profile = self.find_profile(guid)?;
        let appearance = profile.default_appearance();
        let mut json = Map::new();
        json.insert("guid".to_string(), Value::from(format_guid(&profile.guid())));
        json.insert("name".to_string(), Value::from(profile.name()));
        json.insert("source".to_string(), profile.source().map(Value::from).unwrap_or(Value::Null));
        json.insert("hidden".to_string(), Value::from(profile.hidden()));
        json.insert("commandline".to_string(), Value::from(profile.commandline()));
        json.insert("startingDirectory".to_string(), Value::from(profile.starting_directory()));
        json.insert("historySize".to_string(), Value::from(profile.history_size()));
        json.insert("colorScheme".to_string(), Value::from(appearance.color_scheme()));
        json.insert("fontFace".to_string(), Value::from(profile.font_face()));
        json.insert("fontSize".to_string(), Value::from(profile.font_size()));
        json.insert("opacity".to_string(), Value::from(profile.opacity()));
        json.insert("origin".to_string(), Value::from(profile.origin().as_str()));
        Some(Value::Object(json))
    }
}

/// The user's settings text; a missing file reads as empty.
fn read_settings_file(path: &Path) -> Result<String, SettingsError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(SettingsError::Io(e)),
    }
}
