//! The settings load pipeline.
//!
//! A [`SettingsLoader`] parses the built-in defaults and the user's file into
//! one shared pair of inheritance graphs, then runs the merge stages in a
//! fixed order:
//!
//! 1. [`generate_profiles`](SettingsLoader::generate_profiles)
//! 2. [`fill_blanks_in_defaults_json`](SettingsLoader::fill_blanks_in_defaults_json) (first run only)
//! 3. [`merge_inbox_into_user_profiles`](SettingsLoader::merge_inbox_into_user_profiles)
//! 4. [`merge_fragments_into_user_profiles`](SettingsLoader::merge_fragments_into_user_profiles)
//! 5. [`disable_deleted_profiles`](SettingsLoader::disable_deleted_profiles)
//! 6. [`finalize_layering`](SettingsLoader::finalize_layering)
//!
//! Running them out of order breaks precedence between sources.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use strata_config::guid::format_guid;
use strata_config::{
    GlobalSettings, Handle, InheritanceGraph, Origin, Profile, SettingsError, SettingsLoadWarning,
};

use super::BUILTIN_SHELL_GUID;
use super::document::{SettingsDocument, parse_document};
use crate::fragments::FragmentCatalog;
use crate::generators::ProfileGenerator;
use crate::state::ApplicationState;
use crate::strings;

/// One source's records, as handles into the loader's graphs.
#[derive(Debug, Clone)]
pub struct ParsedSettings {
    pub globals: Handle<GlobalSettings>,
    pub base_layer_profile: Handle<Profile>,
    pub profiles: Vec<Handle<Profile>>,
    /// Merge key space: generated and fragment profiles find their user
    /// counterpart through this index.
    pub profiles_by_guid: HashMap<Uuid, Handle<Profile>>,
}

impl ParsedSettings {
    fn insert(
        document: SettingsDocument,
        profiles: &mut InheritanceGraph<Profile>,
        globals: &mut InheritanceGraph<GlobalSettings>,
        warnings: &mut Vec<SettingsLoadWarning>,
    ) -> Self {
        let mut parsed = Self {
            globals: globals.insert(document.globals),
            base_layer_profile: profiles.insert(document.base_layer),
            profiles: Vec::with_capacity(document.profiles.len()),
            profiles_by_guid: HashMap::with_capacity(document.profiles.len()),
        };
        for profile in document.profiles {
            parsed.append_profile(profile, profiles, warnings);
        }
        parsed
    }

    /// Add `profile` unless this source already has its GUID, in which case
    /// it is dropped with a [`SettingsLoadWarning::DuplicateProfile`].
    fn append_profile(
        &mut self,
        mut profile: Profile,
        graph: &mut InheritanceGraph<Profile>,
        warnings: &mut Vec<SettingsLoadWarning>,
    ) -> Option<Handle<Profile>> {
        let guid = profile.ensure_guid();
        if self.profiles_by_guid.contains_key(&guid) {
            log::warn!("Dropping duplicate profile {}", format_guid(&guid));
            warnings.push(SettingsLoadWarning::DuplicateProfile);
            return None;
        }
        let handle = graph.insert(profile);
        self.profiles_by_guid.insert(guid, handle);
        self.profiles.push(handle);
        Some(handle)
    }

    fn push_user_child(&mut self, guid: Uuid, handle: Handle<Profile>) {
        self.profiles_by_guid.insert(guid, handle);
        self.profiles.push(handle);
    }
}

/// Accumulated state of one load.
#[derive(Debug)]
pub struct SettingsLoader {
    pub profiles: InheritanceGraph<Profile>,
    pub globals: InheritanceGraph<GlobalSettings>,
    pub inbox_settings: ParsedSettings,
    pub user_settings: ParsedSettings,
    pub warnings: Vec<SettingsLoadWarning>,
    ignored_namespaces: HashSet<String>,
    /// Number of profiles the user's file itself listed. Profiles past this
    /// index were synthesized for generated or fragment profiles.
    user_profile_count: usize,
}

impl SettingsLoader {
    /// Parse both documents.
    ///
    /// Errors in either document are fatal for the load.
    pub fn new(user_json: &str, inbox_json: &str) -> Result<Self, SettingsError> {
        let mut profiles = InheritanceGraph::new();
        let mut globals = InheritanceGraph::new();
        let mut warnings = Vec::new();

        let inbox = parse_document(inbox_json, Origin::InBox, None)?;
        let inbox_settings = ParsedSettings::insert(inbox, &mut profiles, &mut globals, &mut warnings);

        let user = parse_document(user_json, Origin::User, None)?;
        let user_settings = ParsedSettings::insert(user, &mut profiles, &mut globals, &mut warnings);

        let ignored_namespaces: HashSet<String> = globals
            .get(user_settings.globals)
            .disabled_sources()
            .iter()
            .cloned()
            .collect();
        let user_profile_count = user_settings.profiles.len();

        log::debug!(
            "Parsed {} inbox and {} user profiles",
            inbox_settings.profiles.len(),
            user_profile_count
        );

        Ok(Self {
            profiles,
            globals,
            inbox_settings,
            user_settings,
            warnings,
            ignored_namespaces,
            user_profile_count,
        })
    }

    /// Parse, merge the inbox profiles and finalize, without generators,
    /// fragments or persisted state.
    pub fn from_json(user_json: &str, inbox_json: &str) -> Result<Self, SettingsError> {
        let mut loader = Self::new(user_json, inbox_json)?;
        loader.merge_inbox_into_user_profiles();
        loader.finalize_layering();
        Ok(loader)
    }

    /// Namespaces listed in the user's `disabledProfileSources`.
    pub fn ignored_namespaces(&self) -> &HashSet<String> {
        &self.ignored_namespaces
    }

    pub fn user_profile_count(&self) -> usize {
        self.user_profile_count
    }

    /// Run every enabled generator and add its output to the inbox profiles.
    ///
    /// A failing generator contributes nothing; the load continues.
    pub fn generate_profiles(&mut self, generators: &[Box<dyn ProfileGenerator>]) {
        for generator in generators {
            let namespace = generator.namespace();
            if self.ignored_namespaces.contains(namespace) {
                log::debug!("Profile source {} is disabled", namespace);
                continue;
            }

            let mut generated = Vec::new();
            if let Err(e) = generator.generate_profiles(&mut generated) {
                log::warn!("Profile generator {} failed: {:#}", namespace, e);
                continue;
            }
            debug_log!("LOADER", "{} generated {} profiles", namespace, generated.len());

            for mut profile in generated {
                profile.origin = Origin::Generated;
                if profile.source.is_none() {
                    profile.source = Some(namespace.to_string());
                }
                profile.ensure_guid();
                let handle = self.profiles.insert(profile);
                self.inbox_settings.profiles.push(handle);
            }
        }
    }

    /// First-run adjustments to the user template: choose the default
    /// profile and name the builtin shell profile.
    ///
    /// The default is the inbox or generated profile named
    /// `preferred_default_profile`, else the builtin shell profile.
    pub fn fill_blanks_in_defaults_json(&mut self, preferred_default_profile: Option<&str>) {
        let guid = preferred_default_profile
            .and_then(|name| {
                self.inbox_settings
                    .profiles
                    .iter()
                    .map(|&h| self.profiles.view(h))
                    .find(|p| p.name() == name)
                    .map(|p| p.guid())
            })
            .unwrap_or(BUILTIN_SHELL_GUID);
        debug_log!("LOADER", "First run: default profile {}", format_guid(&guid));
        self.globals.get_mut(self.user_settings.globals).default_profile = Some(format_guid(&guid));

        if let Some(&builtin) = self.user_settings.profiles_by_guid.get(&BUILTIN_SHELL_GUID) {
            self.profiles.get_mut(builtin).name =
                Some(strings::BUILTIN_SHELL_PROFILE_NAME.to_string());
        }
    }

    /// Give every inbox and generated profile a user counterpart.
    ///
    /// A user profile with the same GUID gains the inbox profile as its
    /// lowest-priority parent. Otherwise a new user profile inheriting from
    /// the inbox profile is appended.
    pub fn merge_inbox_into_user_profiles(&mut self) {
        for inbox in self.inbox_settings.profiles.clone() {
            let guid = self.profiles.view(inbox).guid();
            match self.user_settings.profiles_by_guid.get(&guid) {
                Some(&user) => {
                    self.profiles.insert_parent(user, inbox, None);
                }
                None => {
                    let child = Profile::reproduce(self.profiles.view(inbox));
                    let child = self.profiles.insert_child(child, inbox);
                    self.user_settings.push_user_child(guid, child);
                }
            }
        }
    }

    /// Layer every fragment document from `catalog` onto the user profiles.
    ///
    /// A document that fails to parse is skipped as a whole.
    pub fn merge_fragments_into_user_profiles(&mut self, catalog: &dyn FragmentCatalog) {
        let sources = match catalog.sources() {
            Ok(sources) => sources,
            Err(e) => {
                log::warn!("Fragment catalog unavailable: {:#}", e);
                return;
            }
        };

        for source in sources {
            if self.ignored_namespaces.contains(&source.namespace) {
                log::debug!("Fragment source {} is disabled", source.namespace);
                continue;
            }
            for document in &source.documents {
                if let Err(e) = self.layer_fragment(&source.namespace, &document.text) {
                    log::warn!("Skipping fragment {}: {}", document.origin, e);
                }
            }
        }
    }

    fn layer_fragment(&mut self, namespace: &str, text: &str) -> Result<(), SettingsError> {
        let document = parse_document(text, Origin::Fragment, Some(namespace))?;

        for mut profile in document.profiles {
            profile.source = Some(namespace.to_string());

            if let Some(target) = profile.updates {
                match self.user_settings.profiles_by_guid.get(&target) {
                    Some(&user) => {
                        let patch = self.profiles.insert(profile);
                        self.profiles.insert_parent(user, patch, Some(0));
                    }
                    None => log::debug!(
                        "Fragment from {} updates unknown profile {}",
                        namespace,
                        format_guid(&target)
                    ),
                }
                continue;
            }

            // A new profile never layers onto an existing one; a GUID the
            // user settings already hold is a duplicate.
            profile.ensure_guid();
            let fragment = self.profiles.insert(profile);
            let child = Profile::reproduce(self.profiles.view(fragment));
            if let Some(child) =
                self.user_settings
                    .append_profile(child, &mut self.profiles, &mut self.warnings)
            {
                self.profiles.insert_parent(child, fragment, None);
            }
        }

        let user_globals = self.globals.get_mut(self.user_settings.globals);
        for scheme in document.globals.color_schemes.into_values() {
            user_globals.add_color_scheme(scheme);
        }
        Ok(())
    }

    /// Hide synthesized profiles the user removed from their file.
    ///
    /// A synthesized profile whose GUID `state` already remembers was shown
    /// once and then deleted by the user; it is marked deleted and hidden.
    /// New GUIDs are remembered for next time.
    pub fn disable_deleted_profiles(&mut self, state: &ApplicationState) {
        let mut generated = state.generated_profiles();
        let mut new_profiles = false;

        for &handle in &self.user_settings.profiles[self.user_profile_count..] {
            let guid = self.profiles.view(handle).guid();
            if generated.insert(guid) {
                new_profiles = true;
            } else {
                debug_log!("LOADER", "Profile {} was deleted by the user", format_guid(&guid));
                let profile = self.profiles.get_mut(handle);
                profile.deleted = true;
                profile.hidden = Some(true);
            }
        }

        if new_profiles {
            state.set_generated_profiles(generated);
        }
    }

    /// Connect the layers: inbox globals under user globals, inbox
    /// `profiles.defaults` under the user's, and the user's
    /// `profiles.defaults` as the first parent of every user profile.
    pub fn finalize_layering(&mut self) {
        let inbox = &self.inbox_settings;
        let user = &self.user_settings;

        self.globals.insert_parent(user.globals, inbox.globals, None);
        self.globals.finalize_inheritance(user.globals);

        self.profiles
            .insert_parent(user.base_layer_profile, inbox.base_layer_profile, None);
        self.profiles.finalize_inheritance(user.base_layer_profile);

        for &profile in &user.profiles {
            self.profiles
                .insert_parent(profile, user.base_layer_profile, Some(0));
            self.profiles.finalize_inheritance(profile);
        }
    }
}
