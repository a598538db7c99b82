//! Key chord parser.
//!
//! Parses human-readable chord strings like "ctrl+shift+t" into [`KeyChord`]
//! structs and formats them back in the canonical lowercase form used when
//! settings are written to disk.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Error type for key chord parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ParseError(String);

/// Set of active modifiers for a key chord.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub win: bool,
}

impl Modifiers {
    /// Returns true if no modifier is held
    pub fn is_empty(&self) -> bool {
        !(self.ctrl || self.alt || self.shift || self.win)
    }
}

/// Keys that are addressed by name rather than by the character they produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    F(u8),
    Enter,
    Escape,
    Space,
    Tab,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    Plus,
    Minus,
    Numpad(u8),
    NumpadPlus,
    NumpadMinus,
    NumpadMultiply,
    NumpadDivide,
    NumpadDecimal,
    ContextMenu,
}

impl NamedKey {
    fn canonical_name(&self) -> String {
        match self {
            NamedKey::F(n) => format!("f{n}"),
            NamedKey::Enter => "enter".to_string(),
            NamedKey::Escape => "esc".to_string(),
            NamedKey::Space => "space".to_string(),
            NamedKey::Tab => "tab".to_string(),
            NamedKey::Backspace => "backspace".to_string(),
            NamedKey::Delete => "delete".to_string(),
            NamedKey::Insert => "insert".to_string(),
            NamedKey::Home => "home".to_string(),
            NamedKey::End => "end".to_string(),
            NamedKey::PageUp => "pgup".to_string(),
            NamedKey::PageDown => "pgdn".to_string(),
            NamedKey::Up => "up".to_string(),
            NamedKey::Down => "down".to_string(),
            NamedKey::Left => "left".to_string(),
            NamedKey::Right => "right".to_string(),
            NamedKey::Plus => "plus".to_string(),
            NamedKey::Minus => "minus".to_string(),
            NamedKey::Numpad(n) => format!("numpad_{n}"),
            NamedKey::NumpadPlus => "numpad_plus".to_string(),
            NamedKey::NumpadMinus => "numpad_minus".to_string(),
            NamedKey::NumpadMultiply => "numpad_multiply".to_string(),
            NamedKey::NumpadDivide => "numpad_divide".to_string(),
            NamedKey::NumpadDecimal => "numpad_period".to_string(),
            NamedKey::ContextMenu => "menu".to_string(),
        }
    }
}

/// The non-modifier part of a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParsedKey {
    /// A single printable character, stored lowercase (e.g. 't', '1', ',')
    Character(char),
    /// A named key (e.g. F1, Enter, Escape)
    Named(NamedKey),
}

/// A parsed key chord (modifiers + key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub modifiers: Modifiers,
    pub key: ParsedKey,
}

impl KeyChord {
    pub fn new(modifiers: Modifiers, key: ParsedKey) -> Self {
        Self { modifiers, key }
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::with_capacity(5);

        if self.modifiers.win {
            parts.push("win".to_string());
        }
        if self.modifiers.ctrl {
            parts.push("ctrl".to_string());
        }
        if self.modifiers.alt {
            parts.push("alt".to_string());
        }
        if self.modifiers.shift {
            parts.push("shift".to_string());
        }

        match &self.key {
            ParsedKey::Character(c) => parts.push(c.to_string()),
            ParsedKey::Named(n) => parts.push(n.canonical_name()),
        }

        write!(f, "{}", parts.join("+"))
    }
}

impl FromStr for KeyChord {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_key_chord(s)
    }
}

impl Serialize for KeyChord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeyChord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_key_chord(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse a key chord string into a KeyChord.
///
/// Supported format: "modifier+modifier+key"
///
/// Modifiers:
/// - `ctrl`, `control`
/// - `alt`, `option`
/// - `shift`
/// - `win`, `super`, `meta`, `cmd`
///
/// Keys:
/// - Single characters: `a`, `T`, `1`, `,`
/// - Named keys: `f1`-`f24`, `enter`, `esc`, `space`, `tab`, `pgup`, `numpad_0`, etc.
///
/// A literal `+` key is written as `plus` (e.g. `ctrl+plus`).
pub fn parse_key_chord(s: &str) -> Result<KeyChord, ParseError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ParseError("Empty key chord".to_string()));
    }

    let parts: Vec<&str> = trimmed.split('+').map(str::trim).collect();

    let mut modifiers = Modifiers::default();
    let mut key_part = None;

    for (i, part) in parts.iter().enumerate() {
        let is_last = i == parts.len() - 1;

        if part.is_empty() {
            return Err(ParseError(format!("Empty segment in key chord '{trimmed}'")));
        }

        let is_modifier = match part.to_lowercase().as_str() {
            "ctrl" | "control" => {
                modifiers.ctrl = true;
                true
            }
            "alt" | "option" => {
                modifiers.alt = true;
                true
            }
            "shift" => {
                modifiers.shift = true;
                true
            }
            "win" | "super" | "meta" | "cmd" => {
                modifiers.win = true;
                true
            }
            _ => false,
        };

        if !is_modifier {
            if key_part.is_some() {
                return Err(ParseError(format!(
                    "Multiple keys specified: already have key, found '{part}'"
                )));
            }
            key_part = Some(*part);
        } else if is_last {
            return Err(ParseError(
                "Key chord ends with modifier, no key specified".to_string(),
            ));
        }
    }

    let key_str = key_part.ok_or_else(|| ParseError("No key specified".to_string()))?;
    let key = parse_key(key_str)?;

    Ok(KeyChord { modifiers, key })
}

/// Parse a key string into a ParsedKey.
fn parse_key(s: &str) -> Result<ParsedKey, ParseError> {
    if let Some(named) = parse_named_key(s) {
        return Ok(ParsedKey::Named(named));
    }

    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(ParsedKey::Character(c.to_ascii_lowercase()));
    }

    Err(ParseError(format!("Unknown key: '{s}'")))
}

/// Parse a named key (case-insensitive).
fn parse_named_key(s: &str) -> Option<NamedKey> {
    let lower = s.to_lowercase();

    if let Some(n) = lower.strip_prefix('f')
        && let Ok(n) = n.parse::<u8>()
        && (1..=24).contains(&n)
    {
        return Some(NamedKey::F(n));
    }

    if let Some(n) = lower.strip_prefix("numpad_").or_else(|| lower.strip_prefix("numpad"))
        && let Ok(n) = n.parse::<u8>()
        && n <= 9
    {
        return Some(NamedKey::Numpad(n));
    }

    match lower.as_str() {
        "enter" | "return" => Some(NamedKey::Enter),
        "escape" | "esc" => Some(NamedKey::Escape),
        "space" => Some(NamedKey::Space),
        "tab" => Some(NamedKey::Tab),
        "backspace" => Some(NamedKey::Backspace),
        "delete" | "del" => Some(NamedKey::Delete),
        "insert" | "ins" => Some(NamedKey::Insert),
        "home" => Some(NamedKey::Home),
        "end" => Some(NamedKey::End),
        "pageup" | "pgup" => Some(NamedKey::PageUp),
        "pagedown" | "pgdn" => Some(NamedKey::PageDown),
        "up" | "arrowup" => Some(NamedKey::Up),
        "down" | "arrowdown" => Some(NamedKey::Down),
        "left" | "arrowleft" => Some(NamedKey::Left),
        "right" | "arrowright" => Some(NamedKey::Right),
        "plus" => Some(NamedKey::Plus),
        "minus" => Some(NamedKey::Minus),
        "numpad_plus" | "numpad_add" => Some(NamedKey::NumpadPlus),
        "numpad_minus" | "numpad_subtract" => Some(NamedKey::NumpadMinus),
        "numpad_multiply" => Some(NamedKey::NumpadMultiply),
        "numpad_divide" => Some(NamedKey::NumpadDivide),
        "numpad_period" | "numpad_decimal" => Some(NamedKey::NumpadDecimal),
        "menu" | "app" => Some(NamedKey::ContextMenu),
        _ => None,
    }
}
