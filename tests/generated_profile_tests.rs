//! Generated profiles across loads: first-run defaults, deletion and state.

mod common;

use common::{FixedGenerator, TEST_SHELLS, TestContext, active_names};
use strata_config::{SettingsLoadWarning, derive_profile_guid, parse_guid};
use strata_term::fragments::StaticFragmentCatalog;
use strata_term::state::ApplicationState;

/// Drop the list entry named `name` from the settings file.
fn remove_from_file(ctx: &TestContext, name: &str) {
    let mut json = ctx.read_settings();
    json["profiles"]["list"]
        .as_array_mut()
        .unwrap()
        .retain(|p| p["name"] != name);
    ctx.write_settings(&serde_json::to_string_pretty(&json).unwrap());
}

#[test]
fn test_first_run_prefers_generated_default() {
    let ctx = TestContext::new();
    let generators = FixedGenerator::boxed(&["bash", "zsh"]);
    let settings = ctx.load_with(&generators, &StaticFragmentCatalog::new());

    let bash = derive_profile_guid("bash", Some(TEST_SHELLS));
    assert!(settings.warnings().is_empty(), "{:?}", settings.warnings());
    assert_eq!(settings.default_profile().unwrap().guid(), bash);
    assert_eq!(active_names(&settings), ["System Shell", "bash", "zsh"]);

    let json = ctx.read_settings();
    assert_eq!(parse_guid(json["defaultProfile"].as_str().unwrap()), Some(bash));
    let listed: Vec<_> = json["profiles"]["list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(listed, ["System Shell", "bash", "zsh"]);

    let state = ApplicationState::load(&ctx.state_path());
    assert!(state.generated_profiles().contains(&bash));
}

#[test]
fn test_deleted_generated_profile_stays_hidden() {
    let ctx = TestContext::new();
    let generators = FixedGenerator::boxed(&["bash", "zsh"]);
    let catalog = StaticFragmentCatalog::new();
    ctx.load_with(&generators, &catalog);

    remove_from_file(&ctx, "bash");
    let settings = ctx.load_with(&generators, &catalog);

    let bash = settings
        .find_profile(derive_profile_guid("bash", Some(TEST_SHELLS)))
        .unwrap();
    assert!(bash.deleted());
    assert!(bash.hidden());
    assert_eq!(active_names(&settings), ["System Shell", "zsh"]);

    // The default pointed at bash, which is no longer visible.
    assert_eq!(settings.warnings(), [SettingsLoadWarning::MissingDefaultProfile]);
    assert_eq!(settings.default_profile().unwrap().name(), "System Shell");

    // Deleted profiles are never written back.
    let json = settings.to_json().unwrap();
    assert!(
        json["profiles"]["list"]
            .as_array()
            .unwrap()
            .iter()
            .all(|p| p["name"] != "bash")
    );
}

#[test]
fn test_remembered_profile_without_generator_stays_gone() {
    let ctx = TestContext::new();
    let catalog = StaticFragmentCatalog::new();
    ctx.load_with(&FixedGenerator::boxed(&["bash", "zsh"]), &catalog);
    remove_from_file(&ctx, "bash");

    let settings = ctx.load_with(&FixedGenerator::boxed(&["zsh"]), &catalog);

    assert!(
        settings
            .find_profile(derive_profile_guid("bash", Some(TEST_SHELLS)))
            .is_none()
    );
    assert_eq!(active_names(&settings), ["System Shell", "zsh"]);
}

#[test]
fn test_cleared_state_brings_deleted_profile_back() {
    let ctx = TestContext::new();
    let generators = FixedGenerator::boxed(&["bash", "zsh"]);
    let catalog = StaticFragmentCatalog::new();
    ctx.load_with(&generators, &catalog);
    remove_from_file(&ctx, "bash");

    ApplicationState::load(&ctx.state_path()).clear();
    let settings = ctx.load_with(&generators, &catalog);

    let bash = derive_profile_guid("bash", Some(TEST_SHELLS));
    assert!(!settings.find_profile(bash).unwrap().deleted());
    assert_eq!(active_names(&settings), ["System Shell", "zsh", "bash"]);
    assert!(settings.warnings().is_empty(), "{:?}", settings.warnings());
    assert!(
        ApplicationState::load(&ctx.state_path())
            .generated_profiles()
            .contains(&bash)
    );
}

#[test]
fn test_user_entry_layers_over_generated_profile() {
    let ctx = TestContext::with_settings(
        r#"{ "profiles": [ { "name": "zsh", "source": "Test.Shells", "historySize": 5 } ] }"#,
    );
    let settings = ctx.load_with(&FixedGenerator::boxed(&["bash", "zsh"]), &StaticFragmentCatalog::new());

    let zsh = settings.profile_by_name("zsh").unwrap();
    assert_eq!(zsh.commandline(), "/bin/zsh");
    assert_eq!(zsh.history_size(), 5);
    assert_eq!(active_names(&settings), ["zsh", "System Shell", "bash"]);
}
