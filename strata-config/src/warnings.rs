//! Recoverable problems found while loading settings.
//!
//! A warning never aborts a load: the offending value is skipped or repaired
//! and the warning is surfaced to the user alongside the usable settings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
pub enum SettingsLoadWarning {
    #[error("Found multiple profiles with the same GUID; only the first one was kept")]
    DuplicateProfile,
    #[error("Found a profile with an unknown color scheme; the default scheme is used instead")]
    UnknownColorScheme,
    #[error("Found a profile with an invalid background image path")]
    InvalidBackgroundImage,
    #[error("Found a profile with an invalid icon path")]
    InvalidIcon,
    #[error("Could not find the default profile; the first profile is used instead")]
    MissingDefaultProfile,
    #[error("At least one key binding could not be parsed")]
    AtLeastOneKeybindingWarning,
    #[error("Found a setColorScheme command referencing an unknown color scheme")]
    InvalidColorSchemeInCmd,
    #[error("Failed to write the settings file")]
    FailedToWriteToSettings,
    #[error("A key binding has more than one key chord")]
    TooManyKeysForChord,
    #[error("A key binding is missing a required parameter")]
    MissingRequiredParameter,
    #[error("A command could not be parsed")]
    FailedToParseCommandJson,
    #[error("A nested command list could not be parsed")]
    FailedToParseSubCommands,
}

impl SettingsLoadWarning {
    /// True for warnings produced while parsing the action map.
    pub fn is_keybinding_warning(&self) -> bool {
        matches!(
            self,
            Self::TooManyKeysForChord
                | Self::MissingRequiredParameter
                | Self::FailedToParseCommandJson
                | Self::FailedToParseSubCommands
        )
    }
}
