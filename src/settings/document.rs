//! Parsing one settings document.
//!
//! Every source (the built-in defaults, the user's file, each fragment) has
//! the same shape: global keys at the top level, `schemes`, `actions` (or
//! legacy `keybindings`), and `profiles` as either a plain array or an object
//! with `defaults` and `list`.

use serde::de::value::MapAccessDeserializer;
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

use strata_config::{ColorScheme, GlobalSettings, Origin, Profile, SettingsError};

/// A parsed document, before any of it joins an inheritance graph.
#[derive(Debug, Default)]
pub struct SettingsDocument {
    /// Top-level keys, with this document's schemes and actions.
    pub globals: GlobalSettings,
    /// `profiles.defaults`, without a GUID.
    pub base_layer: Profile,
    /// Usable `profiles.list` entries in file order, each with a GUID
    /// unless it is a fragment patch identified only by `updates`.
    pub profiles: Vec<Profile>,
}

/// Parse `text` as a document from `origin`.
///
/// Empty text is an empty document. Fragment documents pass their namespace
/// as `source`; it scopes the GUIDs derived for their unnamed-GUID profiles.
pub fn parse_document(
    text: &str,
    origin: Origin,
    source: Option<&str>,
) -> Result<SettingsDocument, SettingsError> {
    let text = if text.trim().is_empty() { "{}" } else { text };

    let mut globals: GlobalSettings =
        serde_json::from_str(text).map_err(|e| SettingsError::from_json_error(e, text))?;
    globals.fold_legacy_keys();
    let raw: RawDocument =
        serde_json::from_str(text).map_err(|e| SettingsError::from_json_error(e, text))?;

    if let Some(schemes) = raw.schemes.as_ref().and_then(Value::as_array) {
        for scheme in schemes {
            if let Some(scheme) = ColorScheme::from_json(scheme, origin) {
                globals.add_color_scheme(scheme);
            }
        }
    }
    for actions in [&raw.keybindings, &raw.actions].into_iter().flatten() {
        globals.layer_actions(actions);
    }

    let mut base_layer = raw.profiles.defaults.unwrap_or_default();
    base_layer.guid = None;
    base_layer.origin = Origin::ProfilesDefaults;

    let allow_updates = origin == Origin::Fragment;
    let mut profiles = Vec::with_capacity(raw.profiles.list.len());
    for entry in raw.profiles.list {
        let ProfileEntry::Profile(profile) = entry else {
            continue;
        };
        let mut profile = *profile;
        if !profile.is_valid_entry(allow_updates) {
            continue;
        }
        profile.origin = origin;
        if let Some(source) = source
            && profile.source.is_none()
        {
            profile.source = Some(source.to_string());
        }
        if profile.name.is_some() || profile.guid.is_some() {
            profile.ensure_guid();
        }
        profiles.push(profile);
    }

    Ok(SettingsDocument {
        globals,
        base_layer,
        profiles,
    })
}

/// The non-global parts of a document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDocument {
    profiles: ProfilesSection,
    schemes: Option<Value>,
    keybindings: Option<Value>,
    actions: Option<Value>,
}

#[derive(Debug, Default)]
struct ProfilesSection {
    defaults: Option<Profile>,
    list: Vec<ProfileEntry>,
}

impl<'de> Deserialize<'de> for ProfilesSection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ProfilesVisitor;

        impl<'de> Visitor<'de> for ProfilesVisitor {
            type Value = ProfilesSection;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a profile list or an object with \"defaults\" and \"list\"")
            }

            fn visit_unit<E: de::Error>(self) -> Result<ProfilesSection, E> {
                Ok(ProfilesSection::default())
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ProfilesSection, A::Error> {
                let mut list = Vec::new();
                while let Some(entry) = seq.next_element::<ProfileEntry>()? {
                    list.push(entry);
                }
                Ok(ProfilesSection {
                    defaults: None,
                    list,
                })
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ProfilesSection, A::Error> {
                let mut section = ProfilesSection::default();
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "defaults" => section.defaults = map.next_value::<Option<Profile>>()?,
                        "list" => {
                            section.list = map
                                .next_value::<Option<Vec<ProfileEntry>>>()?
                                .unwrap_or_default();
                        }
                        _ => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                Ok(section)
            }
        }

        deserializer.deserialize_any(ProfilesVisitor)
    }
}

/// One element of a profile list. Anything but an object is skipped.
#[derive(Debug)]
enum ProfileEntry {
    Profile(Box<Profile>),
    Invalid,
}

impl<'de> Deserialize<'de> for ProfileEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = ProfileEntry;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a profile object")
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<ProfileEntry, A::Error> {
                Profile::deserialize(MapAccessDeserializer::new(map))
                    .map(|p| ProfileEntry::Profile(Box::new(p)))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ProfileEntry, A::Error> {
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(ProfileEntry::Invalid)
            }

            fn visit_bool<E: de::Error>(self, _: bool) -> Result<ProfileEntry, E> {
                Ok(ProfileEntry::Invalid)
            }

            fn visit_i64<E: de::Error>(self, _: i64) -> Result<ProfileEntry, E> {
                Ok(ProfileEntry::Invalid)
            }

            fn visit_u64<E: de::Error>(self, _: u64) -> Result<ProfileEntry, E> {
                Ok(ProfileEntry::Invalid)
            }

            fn visit_f64<E: de::Error>(self, _: f64) -> Result<ProfileEntry, E> {
                Ok(ProfileEntry::Invalid)
            }

            fn visit_str<E: de::Error>(self, _: &str) -> Result<ProfileEntry, E> {
                Ok(ProfileEntry::Invalid)
            }

            fn visit_unit<E: de::Error>(self) -> Result<ProfileEntry, E> {
                Ok(ProfileEntry::Invalid)
            }
        }

        deserializer.deserialize_any(EntryVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_config::derive_profile_guid;

    #[test]
    fn test_empty_text_is_empty_document() {
        let doc = parse_document("  \n", Origin::User, None).unwrap();
        assert!(doc.profiles.is_empty());
        assert_eq!(doc.base_layer.origin, Origin::ProfilesDefaults);
    }

    #[test]
    fn test_profiles_array_form() {
        let doc = parse_document(
            r#"{ "profiles": [ { "name": "A" }, 42, "x", { "commandline": "nameless" } ] }"#,
            Origin::User,
            None,
        )
        .unwrap();
        assert_eq!(doc.profiles.len(), 1);
        assert_eq!(doc.profiles[0].guid, Some(derive_profile_guid("A", None)));
        assert_eq!(doc.profiles[0].origin, Origin::User);
    }

    #[test]
    fn test_defaults_guid_is_cleared() {
        let doc = parse_document(
            r#"{ "profiles": { "defaults": { "guid": "{00000000-0000-0000-0000-000000000001}", "historySize": 10 }, "list": [] } }"#,
            Origin::User,
            None,
        )
        .unwrap();
        assert_eq!(doc.base_layer.guid, None);
        assert_eq!(doc.base_layer.history_size, Some(10));
    }

    #[test]
    fn test_schemes_and_actions_land_in_globals() {
        let doc = parse_document(
            r##"{
                "schemes": [ { "name": "Mine", "background": "#000000" }, { "background": "#111111" } ],
                "keybindings": [ { "command": "paste", "keys": "ctrl+v" } ],
                "actions": [ { "command": "copy", "keys": ["ctrl+c", "ctrl+insert"] } ]
            }"##,
            Origin::User,
            None,
        )
        .unwrap();
        assert_eq!(doc.globals.color_schemes.len(), 1);
        assert_eq!(doc.globals.color_scheme("Mine").unwrap().origin, Origin::User);
        assert_eq!(doc.globals.action_map.own_commands().len(), 2);
        assert_eq!(doc.globals.keybinding_warnings.len(), 1);
    }

    #[test]
    fn test_fragment_entries_accept_updates_and_scope_guids() {
        let doc = parse_document(
            r#"{ "profiles": [
                { "updates": "{3449d4c4-9409-5e79-81e5-2744433fc3f0}", "historySize": 1 },
                { "name": "Fragment Shell" }
            ] }"#,
            Origin::Fragment,
            Some("Acme.Tools"),
        )
        .unwrap();
        assert_eq!(doc.profiles.len(), 2);
        assert_eq!(doc.profiles[0].guid, None);
        assert_eq!(
            doc.profiles[1].guid,
            Some(derive_profile_guid("Fragment Shell", Some("Acme.Tools")))
        );
        assert_eq!(doc.profiles[1].source.as_deref(), Some("Acme.Tools"));
    }

    #[test]
    fn test_updates_ignored_outside_fragments() {
        let doc = parse_document(
            r#"{ "profiles": [ { "updates": "{3449d4c4-9409-5e79-81e5-2744433fc3f0}" } ] }"#,
            Origin::User,
            None,
        )
        .unwrap();
        assert!(doc.profiles.is_empty());
    }

    #[test]
    fn test_syntax_error_is_fatal() {
        let err = parse_document("{ \"profiles\": [", Origin::User, None).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidJson { .. }));
    }

    #[test]
    fn test_type_mismatch_reports_key() {
        let text = "{\n  \"profiles\": [\n    { \"name\": \"A\", \"historySize\": \"lots\" }\n  ]\n}";
        let err = parse_document(text, Origin::User, None).unwrap_err();
        let report = err.deserialization_report().expect("typed report");
        assert_eq!(report.line, 3);
    }

    #[test]
    fn test_non_object_root_is_rejected() {
        let err = parse_document("[1, 2]", Origin::User, None).unwrap_err();
        assert!(err.deserialization_report().is_some());
    }
}
