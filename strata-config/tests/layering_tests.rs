//! Integration tests for the strata-config record model.
//!
//! These build small settings graphs by hand (the way the loader does) and
//! check resolution, finalization and copying through the public API only.

use std::collections::HashMap;

use strata_config::{
    ColorScheme, GlobalSettings, InheritanceGraph, Origin, Profile, SettingsLoadWarning,
    derive_profile_guid,
};

fn profile_json(json: serde_json::Value) -> Profile {
    serde_json::from_value(json).expect("valid profile json")
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[test]
fn user_value_beats_fragment_beats_generator() {
    let mut graph = InheritanceGraph::new();
    let base = graph.insert(Profile::default().with_origin(Origin::ProfilesDefaults));
    let generated = graph.insert(
        profile_json(serde_json::json!({
            "name": "Ubuntu", "commandline": "wsl -d Ubuntu",
            "startingDirectory": "/home", "tabTitle": "gen"
        }))
        .with_origin(Origin::Generated),
    );
    let fragment = graph.insert(
        profile_json(serde_json::json!({ "startingDirectory": "/srv", "tabTitle": "frag" }))
            .with_origin(Origin::Fragment),
    );
    let user = graph.insert(profile_json(serde_json::json!({ "name": "Ubuntu", "tabTitle": "mine" })));

    graph.insert_parent(user, generated, None);
    graph.insert_parent(user, fragment, Some(0));
    graph.insert_parent(user, base, Some(0));

    let view = graph.view(user);
    assert_eq!(view.tab_title().as_deref(), Some("mine"));
    assert_eq!(view.starting_directory(), "/srv");
    assert_eq!(view.commandline(), "wsl -d Ubuntu");
}

#[test]
fn guid_falls_back_to_name_derivation() {
    let mut graph = InheritanceGraph::new();
    let handle = graph.insert(Profile::new("PowerShell"));
    assert_eq!(
        graph.view(handle).guid(),
        derive_profile_guid("PowerShell", None)
    );
}

#[test]
fn copy_of_profiles_shares_one_base_layer() {
    let mut graph = InheritanceGraph::new();
    let base = graph.insert(Profile::default().with_origin(Origin::ProfilesDefaults));
    let handles: Vec<_> = ["One", "Two", "Three"]
        .into_iter()
        .map(|name| graph.insert_child(Profile::new(name), base))
        .collect();

    let mut copy = InheritanceGraph::new();
    let mut visited = HashMap::new();
    let copied: Vec<_> = handles
        .iter()
        .map(|h| graph.copy_interned(*h, &mut copy, &mut visited))
        .collect();

    assert_eq!(copy.len(), 4);
    let bases: Vec<_> = copied.iter().map(|h| copy.parents(*h)[0]).collect();
    assert!(bases.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(copy.get(bases[0]).origin, Origin::ProfilesDefaults);
}

// ---------------------------------------------------------------------------
// Global settings
// ---------------------------------------------------------------------------

#[test]
fn user_globals_finalize_against_inbox() {
    let mut graph = InheritanceGraph::new();

    let mut inbox: GlobalSettings =
        serde_json::from_str(r#"{ "initialCols": 80, "copyOnSelect": true }"#).unwrap();
    inbox.add_color_scheme(ColorScheme::campbell());
    inbox.layer_actions(&serde_json::json!([
        { "command": "copy", "keys": "ctrl+shift+c" },
        { "command": "paste", "keys": ["ctrl+shift+v", "shift+insert"] }
    ]));
    let inbox = graph.insert(inbox);

    let mut user: GlobalSettings = serde_json::from_str(r#"{ "initialCols": 132 }"#).unwrap();
    user.layer_actions(&serde_json::json!([{ "command": null, "keys": "ctrl+shift+c" }]));
    let user = graph.insert_child(user, inbox);
    graph.finalize_inheritance(user);

    let view = graph.view(user);
    assert_eq!(view.initial_cols(), 132);
    assert!(view.copy_on_select());

    let record = view.record();
    assert!(record.color_scheme("Campbell").is_some());
    assert_eq!(
        record.keybinding_warnings,
        vec![SettingsLoadWarning::TooManyKeysForChord]
    );
    let chord = strata_keybindings::parse_key_chord("ctrl+shift+c").unwrap();
    assert!(record.action_map.command_for_chord(&chord).is_none());
}
