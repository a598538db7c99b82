//! App-wide settings.
//!
//! [`GlobalSettings`] is parsed from the top level of a settings document.
//! Scalar keys inherit through the same parent-list mechanism as profiles;
//! the action map, keybinding warnings and color schemes are merged from
//! parents once, by [`Inheritable::finalize_from_parent`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::actions::ActionMap;
use crate::color_scheme::ColorScheme;
use crate::defaults;
use crate::inheritance::{Inheritable, Resolved};
use crate::warnings::SettingsLoadWarning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaunchMode {
    Default,
    Maximized,
    Fullscreen,
    Focus,
    MaximizedFocus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppTheme {
    System,
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TabWidthMode {
    Equal,
    TitleLength,
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabSwitcherMode {
    #[serde(rename = "mru")]
    MostRecentlyUsed,
    #[serde(rename = "inOrder")]
    InOrder,
    #[serde(rename = "disabled")]
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowingBehavior {
    UseNew,
    UseExisting,
    UseAnyExisting,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalSettings {
    /// Name or GUID string of the profile opened by default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub always_show_tabs: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm_close_all_tabs: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_rows: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_cols: Option<u32>,

    /// `"x,y"`; either side may be empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_position: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_on_launch: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_terminal_title_in_titlebar: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_tabs_in_titlebar: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_delimiters: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy_on_select: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy_formatting: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_paste_warning: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_line_paste_warning: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_mode: Option<LaunchMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<AppTheme>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_width_mode: Option<TabWidthMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_acrylic_in_tab_row: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub snap_to_grid_on_resize: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_features: Option<bool>,

    #[serde(
        rename = "experimental.rendering.forceFullRepaint",
        skip_serializing_if = "Option::is_none"
    )]
    pub force_full_repaint_rendering: Option<bool>,

    #[serde(
        rename = "experimental.rendering.software",
        skip_serializing_if = "Option::is_none"
    )]
    pub software_rendering: Option<bool>,

    #[serde(
        rename = "experimental.input.forceVT",
        skip_serializing_if = "Option::is_none"
    )]
    pub force_vt_input: Option<bool>,

    #[serde(
        rename = "experimental.detectURLs",
        skip_serializing_if = "Option::is_none"
    )]
    pub detect_urls: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_on_user_login: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub always_on_top: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_switcher_mode: Option<TabSwitcherMode>,

    /// Legacy boolean form of `tabSwitcherMode`. Folded into
    /// `tab_switcher_mode` on parse, never written.
    #[serde(skip_serializing)]
    pub use_tab_switcher: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_animations: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub startup_actions: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_follow_mouse: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub windowing_behavior: Option<WindowingBehavior>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_block_selection: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimize_to_tray: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub always_show_tray_icon: Option<bool>,

    /// Generator and fragment namespaces whose profiles are not loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_profile_sources: Option<Vec<String>>,

    /// GUID `defaultProfile` resolved to after validation.
    #[serde(skip)]
    pub resolved_default_profile: Option<Uuid>,

    #[serde(skip)]
    pub action_map: ActionMap,

    #[serde(skip)]
    pub keybinding_warnings: Vec<SettingsLoadWarning>,

    #[serde(skip)]
    pub color_schemes: BTreeMap<String, ColorScheme>,
}

impl Inheritable for GlobalSettings {
    fn finalize_from_parent(&mut self, parent: &Self) {
        self.action_map.insert_parent(parent.action_map.clone());
        self.keybinding_warnings
            .extend(parent.keybinding_warnings.iter().copied());
        for (name, scheme) in &parent.color_schemes {
            self.color_schemes
                .entry(name.clone())
                .or_insert_with(|| scheme.clone());
        }
    }
}

impl GlobalSettings {
    /// Add an actions array to this layer's action map.
    pub fn layer_actions(&mut self, actions: &serde_json::Value) {
        let warnings = self.action_map.layer_json(actions);
        self.keybinding_warnings.extend(warnings);
    }

    /// Insert or replace a scheme by name.
    pub fn add_color_scheme(&mut self, scheme: ColorScheme) {
        self.color_schemes.insert(scheme.name.clone(), scheme);
    }

    pub fn color_scheme(&self, name: &str) -> Option<&ColorScheme> {
        self.color_schemes.get(name)
    }

    /// Move legacy keys into their current form.
    ///
    /// `useTabSwitcher` only applies when `tabSwitcherMode` is absent from
    /// the same record.
    pub fn fold_legacy_keys(&mut self) {
        if let Some(enabled) = self.use_tab_switcher.take()
            && self.tab_switcher_mode.is_none()
        {
            self.tab_switcher_mode = Some(if enabled {
                TabSwitcherMode::MostRecentlyUsed
            } else {
                TabSwitcherMode::Disabled
            });
        }
    }

    /// Sources named in this record's own `disabledProfileSources`.
    pub fn disabled_sources(&self) -> &[String] {
        self.disabled_profile_sources.as_deref().unwrap_or_default()
    }
}

/// Global settings read through their inheritance chain.
pub type ResolvedGlobals<'a> = Resolved<'a, GlobalSettings>;

macro_rules! global_getters {
    ($( $name:ident -> $ty:ty = |$g:ident| $read:expr, $default:path; )*) => {
        impl ResolvedGlobals<'_> {
            $(
                pub fn $name(&self) -> $ty {
                    self.resolve(|$g: &GlobalSettings| $read).unwrap_or_else($default)
                }
            )*
        }
    };
}

global_getters! {
    always_show_tabs -> bool = |g| g.always_show_tabs, defaults::bool_true;
    confirm_close_all_tabs -> bool = |g| g.confirm_close_all_tabs, defaults::bool_true;
    initial_rows -> u32 = |g| g.initial_rows, defaults::initial_rows;
    initial_cols -> u32 = |g| g.initial_cols, defaults::initial_cols;
    initial_position -> String = |g| g.initial_position.clone(), defaults::initial_position;
    center_on_launch -> bool = |g| g.center_on_launch, bool::default;
    show_terminal_title_in_titlebar -> bool = |g| g.show_terminal_title_in_titlebar, defaults::bool_true;
    show_tabs_in_titlebar -> bool = |g| g.show_tabs_in_titlebar, defaults::bool_true;
    word_delimiters -> String = |g| g.word_delimiters.clone(), defaults::word_delimiters;
    copy_on_select -> bool = |g| g.copy_on_select, bool::default;
    copy_formatting -> bool = |g| g.copy_formatting, bool::default;
    large_paste_warning -> bool = |g| g.large_paste_warning, defaults::bool_true;
    multi_line_paste_warning -> bool = |g| g.multi_line_paste_warning, defaults::bool_true;
    launch_mode -> LaunchMode = |g| g.launch_mode, defaults::launch_mode;
    theme -> AppTheme = |g| g.theme, defaults::theme;
    tab_width_mode -> TabWidthMode = |g| g.tab_width_mode, defaults::tab_width_mode;
    use_acrylic_in_tab_row -> bool = |g| g.use_acrylic_in_tab_row, bool::default;
    snap_to_grid_on_resize -> bool = |g| g.snap_to_grid_on_resize, defaults::bool_true;
    debug_features -> bool = |g| g.debug_features, bool::default;
    force_full_repaint_rendering -> bool = |g| g.force_full_repaint_rendering, bool::default;
    software_rendering -> bool = |g| g.software_rendering, bool::default;
    force_vt_input -> bool = |g| g.force_vt_input, bool::default;
    detect_urls -> bool = |g| g.detect_urls, defaults::bool_true;
    start_on_user_login -> bool = |g| g.start_on_user_login, bool::default;
    always_on_top -> bool = |g| g.always_on_top, bool::default;
    disable_animations -> bool = |g| g.disable_animations, bool::default;
    focus_follow_mouse -> bool = |g| g.focus_follow_mouse, bool::default;
    windowing_behavior -> WindowingBehavior = |g| g.windowing_behavior, defaults::windowing_behavior;
    tab_switcher_mode -> TabSwitcherMode = |g| g.tab_switcher_mode, defaults::tab_switcher_mode;
    trim_block_selection -> bool = |g| g.trim_block_selection, bool::default;
    minimize_to_tray -> bool = |g| g.minimize_to_tray, bool::default;
    always_show_tray_icon -> bool = |g| g.always_show_tray_icon, bool::default;
    disabled_profile_sources -> Vec<String> = |g| g.disabled_profile_sources.clone(), Vec::new;
}

impl ResolvedGlobals<'_> {
    /// The unparsed `defaultProfile` value.
    pub fn unparsed_default_profile(&self) -> Option<String> {
        self.resolve(|g| g.default_profile.clone())
    }

    /// GUID of the default profile, available once settings are validated.
    pub fn default_profile(&self) -> Option<Uuid> {
        self.resolve(|g| g.resolved_default_profile)
    }

    pub fn startup_actions(&self) -> Option<String> {
        self.resolve(|g| g.startup_actions.clone())
    }

    pub fn language(&self) -> Option<String> {
        self.resolve(|g| g.language.clone())
    }
}
