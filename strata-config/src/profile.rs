//! Profile records.
//!
//! A [`Profile`] is one terminal configuration unit. Every settings field is
//! optional: `None` means "inherit from my parents". Typed, inherited values
//! are read through [`ResolvedProfile`], which walks the profile's parent list
//! in the [`InheritanceGraph`](crate::InheritanceGraph) it lives in.

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

use crate::color_scheme::Color;
use crate::defaults;
use crate::guid::derive_profile_guid;
use crate::inheritance::{Handle, Inheritable, Resolved};

/// Where a profile record came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Origin {
    /// Built-in defaults JSON.
    InBox,
    /// The user's settings file, or synthesized on the user's behalf.
    #[default]
    User,
    /// A fragment extension document.
    Fragment,
    /// A `profiles.defaults` base layer.
    ProfilesDefaults,
    /// A dynamic profile generator.
    Generated,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InBox => "inbox",
            Self::User => "user",
            Self::Fragment => "fragment",
            Self::ProfilesDefaults => "profilesDefaults",
            Self::Generated => "generated",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to the tab when its process exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOnExitMode {
    /// Close only when the process exits successfully.
    Graceful,
    Always,
    Never,
}

impl CloseOnExitMode {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Graceful => "graceful",
            Self::Always => "always",
            Self::Never => "never",
        }
    }
}

impl Serialize for CloseOnExitMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CloseOnExitMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CloseOnExitVisitor;

        impl Visitor<'_> for CloseOnExitVisitor {
            type Value = CloseOnExitMode;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("\"graceful\", \"always\", \"never\" or a boolean")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(if v {
                    CloseOnExitMode::Graceful
                } else {
                    CloseOnExitMode::Never
                })
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                match v {
                    "graceful" => Ok(CloseOnExitMode::Graceful),
                    "always" => Ok(CloseOnExitMode::Always),
                    "never" => Ok(CloseOnExitMode::Never),
                    other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
                }
            }
        }

        deserializer.deserialize_any(CloseOnExitVisitor)
    }
}

/// How the bell is signalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BellStyle {
    None,
    Audible,
    Visual,
    All,
}

impl BellStyle {
    fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Audible => "audible",
            Self::Visual => "visual",
            Self::All => "all",
        }
    }

    fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Self::None, x) | (x, Self::None) => x,
            (a, b) if a == b => a,
            _ => Self::All,
        }
    }
}

impl Serialize for BellStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BellStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BellStyleVisitor;

        impl<'de> Visitor<'de> for BellStyleVisitor {
            type Value = BellStyle;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a bell style name, a list of bell style names or a boolean")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(if v { BellStyle::All } else { BellStyle::None })
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                match v {
                    "none" => Ok(BellStyle::None),
                    "audible" => Ok(BellStyle::Audible),
                    "visual" => Ok(BellStyle::Visual),
                    "all" => Ok(BellStyle::All),
                    other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
                }
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut style = BellStyle::None;
                while let Some(name) = seq.next_element::<String>()? {
                    style = style.combine(BellStyleVisitor.visit_str::<A::Error>(&name)?);
                }
                Ok(style)
            }
        }

        deserializer.deserialize_any(BellStyleVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CursorShape {
    Bar,
    Vintage,
    Underscore,
    DoubleUnderscore,
    FilledBox,
    EmptyBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AntialiasingMode {
    Grayscale,
    Cleartype,
    Aliased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StretchMode {
    None,
    Fill,
    Uniform,
    UniformToFill,
}

/// Font weight on the 1-999 OpenType scale, written by name when it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const THIN: Self = Self(100);
    pub const NORMAL: Self = Self(400);
    pub const BOLD: Self = Self(700);

    const NAMES: [(&'static str, u16); 11] = [
        ("thin", 100),
        ("extra-light", 200),
        ("light", 300),
        ("semi-light", 350),
        ("normal", 400),
        ("medium", 500),
        ("semi-bold", 600),
        ("bold", 700),
        ("extra-bold", 800),
        ("black", 900),
        ("extra-black", 950),
    ];

    fn name(&self) -> Option<&'static str> {
        Self::NAMES
            .iter()
            .find(|(_, weight)| *weight == self.0)
            .map(|(name, _)| *name)
    }
}

impl Serialize for FontWeight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.name() {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_u16(self.0),
        }
    }
}

impl<'de> Deserialize<'de> for FontWeight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FontWeightVisitor;

        impl Visitor<'_> for FontWeightVisitor {
            type Value = FontWeight;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a font weight name or a number between 1 and 999")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                if (1..=999).contains(&v) {
                    Ok(FontWeight(v as u16))
                } else {
                    Err(E::invalid_value(de::Unexpected::Unsigned(v), &self))
                }
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                match u64::try_from(v) {
                    Ok(v) => self.visit_u64(v),
                    Err(_) => Err(E::invalid_value(de::Unexpected::Signed(v), &self)),
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                FontWeight::NAMES
                    .iter()
                    .find(|(name, _)| *name == v)
                    .map(|(_, weight)| FontWeight(*weight))
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(FontWeightVisitor)
    }
}

/// The `font` object. Each key inherits on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<FontWeight>,
}

/// Appearance keys shared by a profile and its `unfocusedAppearance` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppearanceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection_background: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor_shape: Option<CursorShape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor_height: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image_opacity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image_stretch_mode: Option<StretchMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retro_terminal_effect: Option<bool>,
}

/// One terminal configuration unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    #[serde(
        with = "crate::guid::braced_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub guid: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Namespace of the generator or fragment that produced the profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,

    /// Fragment-only: GUID of an existing profile this record patches.
    #[serde(
        with = "crate::guid::braced_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updates: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub commandline: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_directory: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_color: Option<Color>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppress_application_title: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_on_exit: Option<CloseOnExitMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_size: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub snap_on_input: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_gr_aliasing: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bell_style: Option<BellStyle>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_acrylic: Option<bool>,

    /// Window opacity percentage (0-100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub antialiasing_mode: Option<AntialiasingMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<FontConfig>,

    /// Appearance used while the terminal has focus.
    #[serde(flatten)]
    pub appearance: AppearanceConfig,

    /// Appearance overrides used while the terminal is unfocused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unfocused_appearance: Option<AppearanceConfig>,

    #[serde(skip)]
    pub origin: Origin,

    /// Set for generated profiles the user removed from their file.
    #[serde(skip)]
    pub deleted: bool,
}

impl Inheritable for Profile {}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_guid(mut self, guid: Uuid) -> Self {
        self.guid = Some(guid);
        self
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// An entry in a `profiles` list is usable if it identifies a profile.
    ///
    /// Fragment patches identify their target through `updates` instead.
    pub fn is_valid_entry(&self, allow_updates: bool) -> bool {
        self.name.is_some() || self.guid.is_some() || (allow_updates && self.updates.is_some())
    }

    /// Fill in a name-derived GUID when none was written.
    pub fn ensure_guid(&mut self) -> Uuid {
        if let Some(guid) = self.guid {
            return guid;
        }
        let guid = derive_profile_guid(
            self.name.as_deref().unwrap_or_default(),
            self.source.as_deref(),
        );
        self.guid = Some(guid);
        guid
    }

    /// The mutable appearance layer for focused (`false`) or unfocused
    /// (`true`) state, if the record has one.
    pub fn appearance_layer_mut(&mut self, unfocused: bool) -> Option<&mut AppearanceConfig> {
        if unfocused {
            self.unfocused_appearance.as_mut()
        } else {
            Some(&mut self.appearance)
        }
    }

    /// Rename every scheme reference on this record.
    pub fn replace_color_scheme(&mut self, old: &str, new: &str) -> bool {
        let mut changed = false;
        for appearance in
            std::iter::once(&mut self.appearance).chain(self.unfocused_appearance.as_mut())
        {
            if appearance.color_scheme.as_deref() == Some(old) {
                appearance.color_scheme = Some(new.to_string());
                changed = true;
            }
        }
        changed
    }

    /// A user record standing in for `source`: identity copied, every other
    /// field left to inheritance.
    pub fn reproduce(source: ResolvedProfile<'_>) -> Self {
        Self {
            guid: Some(source.guid()),
            name: Some(source.name()),
            source: source.source(),
            hidden: Some(source.hidden()),
            origin: Origin::User,
            ..Self::default()
        }
    }

    /// A record holding every value of `source` that does not come purely
    /// from a `profiles.defaults` layer.
    pub fn copy_settings_from(source: ResolvedProfile<'_>) -> Self {
        let mut copy = Self::default();

        macro_rules! copy_unless_defaults {
            ($( $($path:ident).+ ),* $(,)?) => {
                $(
                    if let Some(from) = source.override_source(|p| p.$($path).+.is_some()) {
                        let from = source.graph().get(from);
                        if from.origin != Origin::ProfilesDefaults {
                            copy.$($path).+ = from.$($path).+.clone();
                        }
                    }
                )*
            };
        }

        copy_unless_defaults!(
            icon,
            commandline,
            starting_directory,
            tab_title,
            tab_color,
            suppress_application_title,
            close_on_exit,
            history_size,
            snap_on_input,
            alt_gr_aliasing,
            bell_style,
            padding,
            use_acrylic,
            opacity,
            antialiasing_mode,
            appearance.color_scheme,
            appearance.foreground,
            appearance.background,
            appearance.selection_background,
            appearance.cursor_color,
            appearance.cursor_shape,
            appearance.cursor_height,
            appearance.background_image,
            appearance.background_image_opacity,
            appearance.background_image_stretch_mode,
            appearance.retro_terminal_effect,
        );

        let font_value = |read: fn(&FontConfig) -> bool| {
            source
                .override_source(|p| p.font.as_ref().is_some_and(read))
                .map(|h| source.graph().get(h))
                .filter(|p| p.origin != Origin::ProfilesDefaults)
                .and_then(|p| p.font.clone())
        };
        let font = FontConfig {
            face: font_value(|f| f.face.is_some()).and_then(|f| f.face),
            size: font_value(|f| f.size.is_some()).and_then(|f| f.size),
            weight: font_value(|f| f.weight.is_some()).and_then(|f| f.weight),
        };
        if font != FontConfig::default() {
            copy.font = Some(font);
        }

        // Unfocused keys are copied one at a time, each from its own layer.
        let unfocused_value = |read: fn(&AppearanceConfig) -> bool| {
            source
                .override_source(|p| p.unfocused_appearance.as_ref().is_some_and(read))
                .map(|h| source.graph().get(h))
                .filter(|p| p.origin != Origin::ProfilesDefaults)
                .and_then(|p| p.unfocused_appearance.clone())
        };
        let mut unfocused = AppearanceConfig::default();
        macro_rules! copy_unfocused {
            ($( $key:ident ),* $(,)?) => {
                $(
                    unfocused.$key =
                        unfocused_value(|a| a.$key.is_some()).and_then(|a| a.$key);
                )*
            };
        }
        copy_unfocused!(
            color_scheme,
            foreground,
            background,
            selection_background,
            cursor_color,
            cursor_shape,
            cursor_height,
            background_image,
            background_image_opacity,
            background_image_stretch_mode,
            retro_terminal_effect,
        );
        if unfocused != AppearanceConfig::default() {
            copy.unfocused_appearance = Some(unfocused);
        }

        copy
    }
}

/// A profile read through its inheritance chain.
pub type ResolvedProfile<'a> = Resolved<'a, Profile>;

macro_rules! profile_getters {
    ($( $(#[$meta:meta])* $name:ident -> $ty:ty = |$p:ident| $read:expr, $default:path; )*) => {
        impl ResolvedProfile<'_> {
            $(
                $(#[$meta])*
                pub fn $name(&self) -> $ty {
                    self.resolve(|$p: &Profile| $read).unwrap_or_else($default)
                }
            )*
        }
    };
}

profile_getters! {
    name -> String = |p| p.name.clone(), defaults::profile_name;
    hidden -> bool = |p| p.hidden, bool::default;
    commandline -> String = |p| p.commandline.clone(), defaults::commandline;
    starting_directory -> String = |p| p.starting_directory.clone(), defaults::starting_directory;
    suppress_application_title -> bool = |p| p.suppress_application_title, bool::default;
    close_on_exit -> CloseOnExitMode = |p| p.close_on_exit, defaults::close_on_exit;
    /// Scrollback lines kept for the session.
    history_size -> u32 = |p| p.history_size, defaults::history_size;
    snap_on_input -> bool = |p| p.snap_on_input, defaults::bool_true;
    alt_gr_aliasing -> bool = |p| p.alt_gr_aliasing, defaults::bool_true;
    bell_style -> BellStyle = |p| p.bell_style, defaults::bell_style;
    padding -> String = |p| p.padding.clone(), defaults::padding;
    use_acrylic -> bool = |p| p.use_acrylic, bool::default;
    opacity -> u8 = |p| p.opacity, defaults::opacity;
    antialiasing_mode -> AntialiasingMode = |p| p.antialiasing_mode, defaults::antialiasing_mode;
    font_face -> String = |p| p.font.as_ref().and_then(|f| f.face.clone()), defaults::font_face;
    font_size -> f32 = |p| p.font.as_ref().and_then(|f| f.size), defaults::font_size;
    font_weight -> FontWeight = |p| p.font.as_ref().and_then(|f| f.weight), defaults::font_weight;
}

impl<'a> ResolvedProfile<'a> {
    /// The profile's identity: its own or inherited GUID, else one derived
    /// from the resolved name and source.
    pub fn guid(&self) -> Uuid {
        self.resolve(|p| p.guid).unwrap_or_else(|| {
            derive_profile_guid(&self.name(), self.source().as_deref())
        })
    }

    pub fn source(&self) -> Option<String> {
        self.resolve(|p| p.source.clone())
    }

    pub fn icon(&self) -> Option<String> {
        self.resolve(|p| p.icon.clone())
    }

    pub fn tab_title(&self) -> Option<String> {
        self.resolve(|p| p.tab_title.clone())
    }

    pub fn tab_color(&self) -> Option<Color> {
        self.resolve(|p| p.tab_color)
    }

    pub fn origin(&self) -> Origin {
        self.record().origin
    }

    pub fn deleted(&self) -> bool {
        self.record().deleted
    }

    /// Appearance used while focused.
    pub fn default_appearance(&self) -> AppearanceView<'a> {
        AppearanceView {
            profile: *self,
            unfocused: false,
        }
    }

    /// Appearance used while unfocused, if any record in the chain defines
    /// `unfocusedAppearance`. Keys it leaves unset fall back to the focused
    /// appearance.
    pub fn unfocused_appearance(&self) -> Option<AppearanceView<'a>> {
        self.override_source(|p| p.unfocused_appearance.is_some())
            .map(|_| AppearanceView {
                profile: *self,
                unfocused: true,
            })
    }
}

/// Record holding the value an [`AppearanceView`] resolves for some key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppearanceSource {
    pub profile: Handle<Profile>,
    /// The value sits in `unfocusedAppearance` rather than the focused layer.
    pub unfocused: bool,
}

/// Resolved appearance of a profile in focused or unfocused state.
#[derive(Debug, Clone, Copy)]
pub struct AppearanceView<'a> {
    profile: ResolvedProfile<'a>,
    unfocused: bool,
}

impl<'a> AppearanceView<'a> {
    pub fn is_unfocused(&self) -> bool {
        self.unfocused
    }

    pub fn profile(&self) -> ResolvedProfile<'a> {
        self.profile
    }

    fn read<R>(&self, read: impl Fn(&AppearanceConfig) -> Option<R>) -> Option<R> {
        if self.unfocused
            && let Some(value) = self
                .profile
                .resolve(|p| p.unfocused_appearance.as_ref().and_then(&read))
        {
            return Some(value);
        }
        self.profile.resolve(|p| read(&p.appearance))
    }

    /// Which record provides the value `has_value` looks for.
    pub fn override_source(
        &self,
        has_value: impl Fn(&AppearanceConfig) -> bool,
    ) -> Option<AppearanceSource> {
        if self.unfocused
            && let Some(profile) = self.profile.override_source(|p| {
                p.unfocused_appearance.as_ref().is_some_and(&has_value)
            })
        {
            return Some(AppearanceSource {
                profile,
                unfocused: true,
            });
        }
        self.profile
            .override_source(|p| has_value(&p.appearance))
            .map(|profile| AppearanceSource {
                profile,
                unfocused: false,
            })
    }

    pub fn foreground(&self) -> Option<Color> {
        self.read(|a| a.foreground)
    }

    pub fn background(&self) -> Option<Color> {
        self.read(|a| a.background)
    }

    pub fn selection_background(&self) -> Option<Color> {
        self.read(|a| a.selection_background)
    }

    pub fn cursor_color(&self) -> Option<Color> {
        self.read(|a| a.cursor_color)
    }

    pub fn background_image(&self) -> Option<String> {
        self.read(|a| a.background_image.clone())
    }
}

macro_rules! appearance_getters {
    ($( $name:ident -> $ty:ty = |$a:ident| $read:expr, $default:path; )*) => {
        impl AppearanceView<'_> {
            $(
                pub fn $name(&self) -> $ty {
                    self.read(|$a: &AppearanceConfig| $read).unwrap_or_else($default)
                }
            )*
        }
    };
}

appearance_getters! {
    color_scheme -> String = |a| a.color_scheme.clone(), defaults::color_scheme;
    cursor_shape -> CursorShape = |a| a.cursor_shape, defaults::cursor_shape;
    cursor_height -> u8 = |a| a.cursor_height, defaults::cursor_height;
    background_image_opacity -> f32 = |a| a.background_image_opacity, defaults::background_image_opacity;
    background_image_stretch_mode -> StretchMode = |a| a.background_image_stretch_mode, defaults::background_image_stretch_mode;
    retro_terminal_effect -> bool = |a| a.retro_terminal_effect, bool::default;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inheritance::InheritanceGraph;

    fn parse(json: &str) -> Profile {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_deserialize_camel_case_and_appearance() {
        let profile = parse(
            r##"{
                "name": "Bash",
                "guid": "{61C54BBD-C2C6-5271-96E7-009A87FF44BF}",
                "historySize": 5000,
                "colorScheme": "One Half Dark",
                "cursorShape": "filledBox",
                "font": { "face": "Fira Code", "weight": "bold" },
                "unfocusedAppearance": { "background": "#202020" }
            }"##,
        );
        assert_eq!(profile.name.as_deref(), Some("Bash"));
        assert_eq!(profile.history_size, Some(5000));
        assert_eq!(profile.appearance.color_scheme.as_deref(), Some("One Half Dark"));
        assert_eq!(profile.appearance.cursor_shape, Some(CursorShape::FilledBox));
        assert_eq!(profile.font.as_ref().and_then(|f| f.weight), Some(FontWeight::BOLD));
        assert_eq!(
            profile.unfocused_appearance.as_ref().and_then(|a| a.background),
            Some(Color::from_rgb(0x202020))
        );
        assert_eq!(profile.origin, Origin::User);
    }

    #[test]
    fn test_close_on_exit_accepts_bool() {
        assert_eq!(
            parse(r#"{"closeOnExit": true}"#).close_on_exit,
            Some(CloseOnExitMode::Graceful)
        );
        assert_eq!(
            parse(r#"{"closeOnExit": false}"#).close_on_exit,
            Some(CloseOnExitMode::Never)
        );
        assert_eq!(
            parse(r#"{"closeOnExit": "always"}"#).close_on_exit,
            Some(CloseOnExitMode::Always)
        );
        assert!(serde_json::from_str::<Profile>(r#"{"closeOnExit": "sometimes"}"#).is_err());
    }

    #[test]
    fn test_bell_style_forms() {
        assert_eq!(parse(r#"{"bellStyle": "visual"}"#).bell_style, Some(BellStyle::Visual));
        assert_eq!(parse(r#"{"bellStyle": false}"#).bell_style, Some(BellStyle::None));
        assert_eq!(
            parse(r#"{"bellStyle": ["audible", "visual"]}"#).bell_style,
            Some(BellStyle::All)
        );
    }

    #[test]
    fn test_font_weight_numbers_and_names() {
        let weight: FontWeight = serde_json::from_str("450").unwrap();
        assert_eq!(weight, FontWeight(450));
        assert_eq!(serde_json::to_string(&weight).unwrap(), "450");
        assert_eq!(serde_json::to_string(&FontWeight(600)).unwrap(), "\"semi-bold\"");
        assert!(serde_json::from_str::<FontWeight>("0").is_err());
        assert!(serde_json::from_str::<FontWeight>("\"heavy\"").is_err());
    }

    #[test]
    fn test_serialize_skips_unset_and_runtime_fields() {
        let mut profile = Profile::new("Zsh").with_origin(Origin::Generated);
        profile.deleted = true;
        profile.appearance.color_scheme = Some("Campbell".to_string());
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "name": "Zsh", "colorScheme": "Campbell" })
        );
    }

    #[test]
    fn test_ensure_guid_is_name_derived() {
        let mut a = Profile::new("Fish");
        let mut b = Profile::new("Fish");
        assert_eq!(a.ensure_guid(), b.ensure_guid());

        let mut scoped = Profile::new("Fish");
        scoped.source = Some("Strata.ShellProfiles".to_string());
        assert_ne!(scoped.ensure_guid(), a.ensure_guid());
    }

    #[test]
    fn test_resolved_getters_fall_back_to_defaults() {
        let mut graph = InheritanceGraph::new();
        let handle = graph.insert(Profile::new("Plain"));
        let view = graph.view(handle);
        assert_eq!(view.history_size(), defaults::history_size());
        assert_eq!(view.default_appearance().color_scheme(), "Campbell");
        assert!(view.snap_on_input());
        assert!(view.unfocused_appearance().is_none());
    }

    #[test]
    fn test_font_keys_inherit_individually() {
        let mut graph = InheritanceGraph::new();
        let mut base = Profile::default();
        base.font = Some(FontConfig {
            face: Some("Hack".to_string()),
            size: Some(14.0),
            weight: None,
        });
        let base = graph.insert(base.with_origin(Origin::ProfilesDefaults));
        let mut child = Profile::new("Child");
        child.font = Some(FontConfig {
            size: Some(10.0),
            ..FontConfig::default()
        });
        let child = graph.insert_child(child, base);

        let view = graph.view(child);
        assert_eq!(view.font_face(), "Hack");
        assert_eq!(view.font_size(), 10.0);
        assert_eq!(view.font_weight(), FontWeight::NORMAL);
    }

    #[test]
    fn test_unfocused_appearance_falls_back_to_focused() {
        let mut graph = InheritanceGraph::new();
        let mut parent = Profile::default();
        parent.appearance.color_scheme = Some("Parent Scheme".to_string());
        parent.appearance.cursor_shape = Some(CursorShape::Vintage);
        let parent = graph.insert(parent);

        let mut child = Profile::new("Child");
        child.unfocused_appearance = Some(AppearanceConfig {
            cursor_shape: Some(CursorShape::EmptyBox),
            ..AppearanceConfig::default()
        });
        let child = graph.insert_child(child, parent);

        let view = graph.view(child);
        let unfocused = view.unfocused_appearance().expect("unfocused appearance");
        assert_eq!(unfocused.cursor_shape(), CursorShape::EmptyBox);
        assert_eq!(unfocused.color_scheme(), "Parent Scheme");
        assert_eq!(view.default_appearance().cursor_shape(), CursorShape::Vintage);

        let source = unfocused
            .override_source(|a| a.color_scheme.is_some())
            .unwrap();
        assert_eq!(source, AppearanceSource { profile: parent, unfocused: false });
    }

    #[test]
    fn test_copy_settings_skips_defaults_layer() {
        let mut graph = InheritanceGraph::new();
        let mut base = Profile::default().with_origin(Origin::ProfilesDefaults);
        base.history_size = Some(100);
        base.commandline = Some("base-shell".to_string());
        let base = graph.insert(base);

        let mut generated = Profile::new("Gen").with_origin(Origin::Generated);
        generated.commandline = Some("gen-shell".to_string());
        let generated = graph.insert(generated);

        let mut user = Profile::new("User");
        user.tab_title = Some("Mine".to_string());
        let user = graph.insert_child(user, base);
        graph.insert_parent(user, generated, None);

        let copy = Profile::copy_settings_from(graph.view(user));
        assert_eq!(copy.tab_title.as_deref(), Some("Mine"));
        assert_eq!(copy.commandline, None, "base layer shadows the generator here");
        assert_eq!(copy.history_size, None);
        assert!(copy.name.is_none() && copy.guid.is_none());
    }

    #[test]
    fn test_replace_color_scheme() {
        let mut profile = Profile::new("P");
        profile.appearance.color_scheme = Some("Old".to_string());
        profile.unfocused_appearance = Some(AppearanceConfig {
            color_scheme: Some("Old".to_string()),
            ..AppearanceConfig::default()
        });
        assert!(profile.replace_color_scheme("Old", "New"));
        assert_eq!(profile.appearance.color_scheme.as_deref(), Some("New"));
        assert_eq!(
            profile.unfocused_appearance.unwrap().color_scheme.as_deref(),
            Some("New")
        );
    }
}
