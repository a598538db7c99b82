//! Key chord handling for strata-term.
//!
//! Settings files bind actions to human-readable key chords such as
//! `ctrl+shift+t` or `alt+f4`. This crate parses those strings into
//! [`KeyChord`] values, formats them back in canonical form, and provides the
//! serde glue so chords can live directly inside settings records.
//!
//! Features:
//! - Case-insensitive modifier and key names with common aliases
//! - Named keys (function keys, navigation keys, arrows, numpad)
//! - Canonical round-trip formatting (`Ctrl+Shift+T` → `ctrl+shift+t`)

pub mod parser;

pub use parser::{KeyChord, Modifiers, NamedKey, ParseError, ParsedKey, parse_key_chord};
