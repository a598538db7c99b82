//! Default values for settings fields.
//!
//! A resolved getter falls back to these when neither a record nor any of its
//! ancestors sets the field.

use crate::color_scheme::ColorScheme;
use crate::global_settings::{AppTheme, LaunchMode, TabSwitcherMode, TabWidthMode, WindowingBehavior};
use crate::profile::{AntialiasingMode, BellStyle, CloseOnExitMode, CursorShape, FontWeight, StretchMode};

pub fn bool_true() -> bool {
    true
}

// ── Profile ────────────────────────────────────────────────────────────────

pub fn profile_name() -> String {
    "Default".to_string()
}

pub fn commandline() -> String {
    std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string())
}

pub fn starting_directory() -> String {
    "~".to_string()
}

pub fn history_size() -> u32 {
    9001
}

pub fn close_on_exit() -> CloseOnExitMode {
    CloseOnExitMode::Graceful
}

pub fn bell_style() -> BellStyle {
    BellStyle::Audible
}

pub fn padding() -> String {
    "8, 8, 8, 8".to_string()
}

/// Window opacity as a percentage.
pub fn opacity() -> u8 {
    100
}

pub fn antialiasing_mode() -> AntialiasingMode {
    AntialiasingMode::Grayscale
}

// ── Font ───────────────────────────────────────────────────────────────────

pub fn font_face() -> String {
    "JetBrains Mono".to_string()
}

pub fn font_size() -> f32 {
    12.0
}

pub fn font_weight() -> FontWeight {
    FontWeight::NORMAL
}

// ── Appearance ─────────────────────────────────────────────────────────────

pub fn color_scheme() -> String {
    ColorScheme::DEFAULT_NAME.to_string()
}

pub fn cursor_shape() -> CursorShape {
    CursorShape::Bar
}

/// Cursor height in percent, used by the vintage cursor shape.
pub fn cursor_height() -> u8 {
    25
}

pub fn background_image_opacity() -> f32 {
    1.0
}

pub fn background_image_stretch_mode() -> StretchMode {
    StretchMode::UniformToFill
}

// ── Global settings ────────────────────────────────────────────────────────

pub fn initial_rows() -> u32 {
    30
}

pub fn initial_cols() -> u32 {
    120
}

pub fn initial_position() -> String {
    ",".to_string()
}

pub fn word_delimiters() -> String {
    " /\\()\"'-.,:;<>~!@#$%^&*|+=[]{}~?\u{2502}".to_string()
}

pub fn launch_mode() -> LaunchMode {
    LaunchMode::Default
}

pub fn theme() -> AppTheme {
    AppTheme::System
}

pub fn tab_width_mode() -> TabWidthMode {
    TabWidthMode::Equal
}

pub fn tab_switcher_mode() -> TabSwitcherMode {
    TabSwitcherMode::MostRecentlyUsed
}

pub fn windowing_behavior() -> WindowingBehavior {
    WindowingBehavior::UseNew
}
