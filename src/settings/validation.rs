//! Post-load consistency passes.
//!
//! Every pass repairs the graph in place and records at most one warning of
//! its kind, no matter how many records it had to fix.

use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;

use strata_config::{
    ActionArgs, AppearanceSource, Command, GlobalSettings, Handle, InheritanceGraph, IterateOn,
    Profile, SettingsLoadWarning,
};

use super::Settings;

/// `${VAR}` or `%VAR%`.
static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|%([A-Za-z_][A-Za-z0-9_]*)%")
        .expect("media path env-var regex is a compile-time constant and must be valid")
});

/// Background image value that asks for the desktop wallpaper.
pub const DESKTOP_WALLPAPER: &str = "desktopWallpaper";

/// Replace `${VAR}` and `%VAR%` with environment values. Unset variables
/// are left as written.
pub fn expand_environment_variables(input: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(input, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            std::env::var(name).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// True if `value` names a loadable resource: an absolute path or a URI,
/// after environment expansion.
pub fn is_valid_media_path(value: &str) -> bool {
    let expanded = expand_environment_variables(value);
    Path::new(&expanded).is_absolute() || url::Url::parse(&expanded).is_ok()
}

fn is_valid_background_image(value: &str) -> bool {
    value == DESKTOP_WALLPAPER || is_valid_media_path(value)
}

/// Icons of one or two characters are glyphs, not paths.
fn is_valid_icon(value: &str) -> bool {
    value.chars().count() <= 2 || is_valid_media_path(value)
}

/// Outcome of probing one appearance for a bad value: `None` if the value is
/// fine, otherwise the record that provides it (`None` inside if no record
/// sets it and the bad value is a built-in default).
type Probe<S> = Option<Option<S>>;

fn probe_color_scheme(
    profiles: &InheritanceGraph<Profile>,
    globals: &GlobalSettings,
    profile: Handle<Profile>,
    unfocused: bool,
) -> Probe<AppearanceSource> {
    let view = profiles.view(profile);
    let appearance = if unfocused {
        view.unfocused_appearance()?
    } else {
        view.default_appearance()
    };
    if globals.color_scheme(&appearance.color_scheme()).is_some() {
        return None;
    }
    Some(appearance.override_source(|a| a.color_scheme.is_some()))
}

fn probe_background_image(
    profiles: &InheritanceGraph<Profile>,
    profile: Handle<Profile>,
    unfocused: bool,
) -> Probe<AppearanceSource> {
    let view = profiles.view(profile);
    let appearance = if unfocused {
        view.unfocused_appearance()?
    } else {
        view.default_appearance()
    };
    let image = appearance.background_image()?;
    if is_valid_background_image(&image) {
        return None;
    }
    Some(appearance.override_source(|a| a.background_image.is_some()))
}

fn probe_icon(profiles: &InheritanceGraph<Profile>, profile: Handle<Profile>) -> Probe<Handle<Profile>> {
    let view = profiles.view(profile);
    let icon = view.icon()?;
    if is_valid_icon(&icon) {
        return None;
    }
    Some(view.override_source(|p| p.icon.is_some()))
}

/// Clear values until `probe` reports none left. Returns true if anything
/// was invalid.
fn repair<S: Copy>(
    profiles: &mut InheritanceGraph<Profile>,
    probe: impl Fn(&InheritanceGraph<Profile>) -> Probe<S>,
    clear: impl Fn(&mut InheritanceGraph<Profile>, S),
) -> bool {
    let mut found_invalid = false;
    while let Some(source) = probe(profiles) {
        found_invalid = true;
        match source {
            Some(source) => clear(profiles, source),
            None => break,
        }
    }
    found_invalid
}

fn command_has_unknown_scheme(command: &Command, globals: &GlobalSettings) -> bool {
    if command.iterate_on == Some(IterateOn::Schemes) {
        return false;
    }
    if let Some(ActionArgs::SetColorScheme { scheme_name }) =
        command.action.as_ref().map(|a| &a.args)
        && globals.color_scheme(scheme_name).is_none()
    {
        return true;
    }
    command
        .subcommands
        .iter()
        .any(|sub| command_has_unknown_scheme(sub, globals))
}

impl Settings {
    /// Resolve `defaultProfile` to a GUID.
    ///
    /// A value that names no visible profile is replaced by the first
    /// visible profile, with a warning. No value at all picks the first
    /// visible profile silently.
    pub(super) fn resolve_default_profile(&mut self) {
        let unparsed = self.global_settings().unparsed_default_profile();
        let found = unparsed
            .as_deref()
            .and_then(|value| self.profile_guid_by_name(value))
            .filter(|guid| self.active_profiles().any(|p| p.guid() == *guid));

        let guid = match (&unparsed, found) {
            (_, Some(guid)) => Some(guid),
            (Some(value), None) => {
                log::warn!("Default profile {:?} not found; using the first profile", value);
                self.warnings.push(SettingsLoadWarning::MissingDefaultProfile);
                self.first_active_guid()
            }
            (None, None) => self.first_active_guid(),
        };
        self.globals_graph
            .get_mut(self.globals)
            .resolved_default_profile = guid;
    }

    pub(super) fn validate_settings(&mut self) {
        self.validate_all_schemes_exist();
        self.validate_media_resources();
        self.validate_keybindings();
        self.validate_color_schemes_in_commands();
    }

    fn validate_all_schemes_exist(&mut self) {
        let globals = self.globals_graph.get(self.globals);
        let mut found_invalid = false;

        for &profile in &self.all_profiles {
            for unfocused in [false, true] {
                found_invalid |= repair(
                    &mut self.profiles,
                    |graph| probe_color_scheme(graph, globals, profile, unfocused),
                    |graph, source| {
                        if let Some(layer) =
                            graph.get_mut(source.profile).appearance_layer_mut(source.unfocused)
                        {
                            layer.color_scheme = None;
                        }
                    },
                );
            }
        }

        if found_invalid {
            log::warn!("Cleared references to unknown color schemes");
            self.warnings.push(SettingsLoadWarning::UnknownColorScheme);
        }
    }

    fn validate_media_resources(&mut self) {
        let mut invalid_background = false;
        let mut invalid_icon = false;

        for &profile in &self.all_profiles {
            for unfocused in [false, true] {
                invalid_background |= repair(
                    &mut self.profiles,
                    |graph| probe_background_image(graph, profile, unfocused),
                    |graph, source| {
                        if let Some(layer) =
                            graph.get_mut(source.profile).appearance_layer_mut(source.unfocused)
                        {
                            layer.background_image = None;
                        }
                    },
                );
            }
            invalid_icon |= repair(
                &mut self.profiles,
                |graph| probe_icon(graph, profile),
                |graph, source| graph.get_mut(source).icon = None,
            );
        }

        if invalid_background {
            self.warnings.push(SettingsLoadWarning::InvalidBackgroundImage);
        }
        if invalid_icon {
            self.warnings.push(SettingsLoadWarning::InvalidIcon);
        }
    }

    fn validate_keybindings(&mut self) {
        let keybinding_warnings = &self.globals_graph.get(self.globals).keybinding_warnings;
        if keybinding_warnings.is_empty() {
            return;
        }
        log::warn!("{} key binding problems", keybinding_warnings.len());
        self.warnings
            .push(SettingsLoadWarning::AtLeastOneKeybindingWarning);
        self.warnings.extend(keybinding_warnings.iter().copied());
    }

    fn validate_color_schemes_in_commands(&mut self) {
        let globals = self.globals_graph.get(self.globals);
        if globals
            .action_map
            .all_commands()
            .into_iter()
            .any(|command| command_has_unknown_scheme(command, globals))
        {
            self.warnings
                .push(SettingsLoadWarning::InvalidColorSchemeInCmd);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_paths() {
        assert!(is_valid_media_path("/usr/share/backgrounds/a.png"));
        assert!(is_valid_media_path("file:///tmp/a.png"));
        assert!(is_valid_media_path("https://example.com/a.png"));
        assert!(!is_valid_media_path("relative/a.png"));
        assert!(is_valid_background_image(DESKTOP_WALLPAPER));
        assert!(is_valid_icon("🐚"));
        assert!(is_valid_icon("ab"));
        assert!(!is_valid_icon("abc"));
    }

    #[test]
    fn test_env_expansion() {
        let home = std::env::var("HOME").unwrap_or_default();
        assert_eq!(expand_environment_variables("${HOME}/x"), format!("{home}/x"));
        assert_eq!(
            expand_environment_variables("%STRATA_TEST_SURELY_UNSET%/x"),
            "%STRATA_TEST_SURELY_UNSET%/x"
        );
    }

    fn load(user: &str) -> Settings {
        Settings::from_json(user, super::super::INBOX_JSON).unwrap()
    }

    #[test]
    fn test_unknown_scheme_cleared_with_one_warning() {
        let settings = load(
            r#"{ "profiles": [
                { "name": "A", "colorScheme": "Nope" },
                { "name": "B", "colorScheme": "Also Nope", "unfocusedAppearance": { "colorScheme": "Nope" } }
            ] }"#,
        );
        let count = settings
            .warnings()
            .iter()
            .filter(|w| **w == SettingsLoadWarning::UnknownColorScheme)
            .count();
        assert_eq!(count, 1);
        let b = settings.profile_by_name("B").unwrap();
        assert_eq!(b.default_appearance().color_scheme(), "Campbell");
        assert_eq!(
            b.unfocused_appearance().unwrap().color_scheme(),
            "Campbell"
        );
    }

    #[test]
    fn test_invalid_media_cleared() {
        let settings = load(
            r#"{ "profiles": [
                { "name": "A", "backgroundImage": "not a path", "icon": "also not a path" },
                { "name": "B", "backgroundImage": "desktopWallpaper", "icon": ">" }
            ] }"#,
        );
        assert!(settings.warnings().contains(&SettingsLoadWarning::InvalidBackgroundImage));
        assert!(settings.warnings().contains(&SettingsLoadWarning::InvalidIcon));
        let a = settings.profile_by_name("A").unwrap();
        assert_eq!(a.default_appearance().background_image(), None);
        assert_eq!(a.icon(), None);
        let b = settings.profile_by_name("B").unwrap();
        assert_eq!(b.icon().as_deref(), Some(">"));
        assert_eq!(
            b.default_appearance().background_image().as_deref(),
            Some(DESKTOP_WALLPAPER)
        );
    }

    #[test]
    fn test_missing_default_profile_falls_back() {
        let settings = load(r#"{ "defaultProfile": "Nowhere", "profiles": [ { "name": "A" } ] }"#);
        assert!(settings.warnings().contains(&SettingsLoadWarning::MissingDefaultProfile));
        assert_eq!(settings.default_profile().unwrap().name(), "A");
    }

    #[test]
    fn test_command_scheme_references() {
        let settings = load(
            r#"{ "actions": [
                { "name": "Schemes", "iterateOn": "schemes", "commands": [
                    { "command": { "action": "setColorScheme", "colorScheme": "${scheme.name}" } }
                ] },
                { "name": "Mine", "commands": [
                    { "command": { "action": "setColorScheme", "colorScheme": "Missing" } }
                ] }
            ] }"#,
        );
        assert_eq!(
            settings
                .warnings()
                .iter()
                .filter(|w| **w == SettingsLoadWarning::InvalidColorSchemeInCmd)
                .count(),
            1
        );
    }

    #[test]
    fn test_keybinding_warnings_surface_behind_marker() {
        let settings = load(r#"{ "actions": [ { "command": "copy", "keys": ["ctrl+c", "ctrl+x"] } ] }"#);
        let warnings = settings.warnings();
        let marker = warnings
            .iter()
            .position(|w| *w == SettingsLoadWarning::AtLeastOneKeybindingWarning)
            .expect("marker present");
        assert_eq!(warnings[marker + 1], SettingsLoadWarning::TooManyKeysForChord);
    }
}
