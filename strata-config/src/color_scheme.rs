//! Color scheme definitions for the `schemes` array.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::profile::Origin;

/// A color in RGB format, written as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_rgb(rgb: u32) -> Self {
        Self::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    pub fn as_array(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = String;

    /// Accepts `#RGB` and `#RRGGBB`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| format!("color '{s}' must start with '#'"))?;
        let value =
            u32::from_str_radix(hex, 16).map_err(|_| format!("color '{s}' is not hexadecimal"))?;
        match hex.len() {
            6 => Ok(Self::from_rgb(value)),
            3 => {
                let expand = |nibble: u32| ((nibble & 0xF) * 0x11) as u8;
                Ok(Self::new(expand(value >> 8), expand(value >> 4), expand(value)))
            }
            _ => Err(format!("color '{s}' must be #RGB or #RRGGBB")),
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Terminal color scheme: 16 ANSI colors plus foreground/background/cursor.
///
/// Colors missing from a scheme object fall back to the builtin Campbell
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorScheme {
    pub name: String,
    pub foreground: Color,
    pub background: Color,
    pub cursor_color: Color,
    pub selection_background: Color,

    // ANSI colors (0-15)
    pub black: Color,
    pub red: Color,
    pub green: Color,
    pub yellow: Color,
    pub blue: Color,
    pub purple: Color,
    pub cyan: Color,
    pub white: Color,
    pub bright_black: Color,
    pub bright_red: Color,
    pub bright_green: Color,
    pub bright_yellow: Color,
    pub bright_blue: Color,
    pub bright_purple: Color,
    pub bright_cyan: Color,
    pub bright_white: Color,

    /// Which settings layer defined the scheme. Only user schemes are written back.
    #[serde(skip)]
    pub origin: Origin,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            name: String::new(),
            ..Self::campbell()
        }
    }
}

impl ColorScheme {
    /// Name of the scheme used when a profile names none or an unknown one.
    pub const DEFAULT_NAME: &'static str = "Campbell";

    /// The builtin Campbell scheme.
    pub fn campbell() -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            foreground: Color::from_rgb(0xCCCCCC),
            background: Color::from_rgb(0x0C0C0C),
            cursor_color: Color::from_rgb(0xFFFFFF),
            selection_background: Color::from_rgb(0xFFFFFF),
            black: Color::from_rgb(0x0C0C0C),
            red: Color::from_rgb(0xC50F1F),
            green: Color::from_rgb(0x13A10E),
            yellow: Color::from_rgb(0xC19C00),
            blue: Color::from_rgb(0x0037DA),
            purple: Color::from_rgb(0x881798),
            cyan: Color::from_rgb(0x3A96DD),
            white: Color::from_rgb(0xCCCCCC),
            bright_black: Color::from_rgb(0x767676),
            bright_red: Color::from_rgb(0xE74856),
            bright_green: Color::from_rgb(0x16C60C),
            bright_yellow: Color::from_rgb(0xF9F1A5),
            bright_blue: Color::from_rgb(0x3B78FF),
            bright_purple: Color::from_rgb(0xB4009E),
            bright_cyan: Color::from_rgb(0x61D6D6),
            bright_white: Color::from_rgb(0xF2F2F2),
            origin: Origin::InBox,
        }
    }

    /// Get ANSI color by index (0-15)
    pub fn ansi_color(&self, index: u8) -> Color {
        match index {
            0 => self.black,
            1 => self.red,
            2 => self.green,
            3 => self.yellow,
            4 => self.blue,
            5 => self.purple,
            6 => self.cyan,
            7 => self.white,
            8 => self.bright_black,
            9 => self.bright_red,
            10 => self.bright_green,
            11 => self.bright_yellow,
            12 => self.bright_blue,
            13 => self.bright_purple,
            14 => self.bright_cyan,
            15 => self.bright_white,
            _ => self.foreground,
        }
    }

    /// Parse one entry of a `schemes` array.
    ///
    /// Returns `None` for entries that are not objects, have no name, or
    /// contain malformed colors.
    pub fn from_json(value: &serde_json::Value, origin: Origin) -> Option<Self> {
        match serde_json::from_value::<ColorScheme>(value.clone()) {
            Ok(scheme) if !scheme.name.is_empty() => Some(Self { origin, ..scheme }),
            Ok(_) => {
                log::warn!("Ignoring color scheme without a name");
                None
            }
            Err(e) => {
                log::warn!("Ignoring malformed color scheme: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parsing() {
        assert_eq!("#0C0C0C".parse::<Color>(), Ok(Color::new(12, 12, 12)));
        assert_eq!("#fff".parse::<Color>(), Ok(Color::new(255, 255, 255)));
        assert!("0C0C0C".parse::<Color>().is_err());
        assert!("#12345".parse::<Color>().is_err());
        assert!("#GGGGGG".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_display() {
        assert_eq!(Color::from_rgb(0xC50F1F).to_string(), "#C50F1F");
    }

    #[test]
    fn test_partial_scheme_fills_from_campbell() {
        let json = serde_json::json!({ "name": "Mine", "background": "#101010" });
        let scheme = ColorScheme::from_json(&json, Origin::User).unwrap();
        assert_eq!(scheme.name, "Mine");
        assert_eq!(scheme.background, Color::from_rgb(0x101010));
        assert_eq!(scheme.red, ColorScheme::campbell().red);
        assert_eq!(scheme.origin, Origin::User);
    }

    #[test]
    fn test_invalid_schemes_are_rejected() {
        assert!(ColorScheme::from_json(&serde_json::json!({ "background": "#000000" }), Origin::User).is_none());
        assert!(ColorScheme::from_json(&serde_json::json!("Campbell"), Origin::User).is_none());
        assert!(
            ColorScheme::from_json(&serde_json::json!({ "name": "x", "red": "red" }), Origin::User)
                .is_none()
        );
    }

    #[test]
    fn test_ansi_color() {
        let scheme = ColorScheme::campbell();
        assert_eq!(scheme.ansi_color(1), scheme.red);
        assert_eq!(scheme.ansi_color(15), scheme.bright_white);
        assert_eq!(scheme.ansi_color(16), scheme.foreground);
    }
}
