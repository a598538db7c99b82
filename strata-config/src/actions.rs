//! Key bindings and commands from the `actions` (legacy `keybindings`) array.
//!
//! Each entry binds an action, optionally with arguments, to a key chord
//! and/or a command-palette name:
//!
//! ```json
//! { "command": "copy", "keys": "ctrl+shift+c" }
//! { "command": { "action": "setColorScheme", "colorScheme": "Campbell" }, "keys": ["alt+1"] }
//! { "command": null, "keys": "ctrl+w" }
//! { "name": "Select color scheme...", "commands": [
//!     { "iterateOn": "schemes", "name": "${scheme.name}",
//!       "command": { "action": "setColorScheme", "colorScheme": "${scheme.name}" } }
//! ] }
//! ```
//!
//! Malformed entries are skipped and reported as [`SettingsLoadWarning`]s.
//! An [`ActionMap`] layers on top of its parents: a chord or name defined in
//! a child layer shadows the same chord or name in every parent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strata_keybindings::{KeyChord, parse_key_chord};

use crate::warnings::SettingsLoadWarning;

/// Something a key binding or palette entry can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutAction {
    /// `"command": null` or `"unbound"`: removes a chord inherited from a parent layer.
    Unbound,
    Copy,
    Paste,
    NewTab,
    NewWindow,
    DuplicateTab,
    CloseTab,
    ClosePane,
    CloseWindow,
    NextTab,
    PrevTab,
    SwitchToTab,
    SetColorScheme,
    SendInput,
    OpenSettings,
    OpenNewTabDropdown,
    CommandPalette,
    ToggleFullscreen,
    Find,
    ScrollUp,
    ScrollDown,
    ScrollToTop,
    ScrollToBottom,
    ResetFontSize,
    Quit,
}

impl ShortcutAction {
    const NAMES: [(&'static str, ShortcutAction); 25] = [
        ("unbound", Self::Unbound),
        ("copy", Self::Copy),
        ("paste", Self::Paste),
        ("newTab", Self::NewTab),
        ("newWindow", Self::NewWindow),
        ("duplicateTab", Self::DuplicateTab),
        ("closeTab", Self::CloseTab),
        ("closePane", Self::ClosePane),
        ("closeWindow", Self::CloseWindow),
        ("nextTab", Self::NextTab),
        ("prevTab", Self::PrevTab),
        ("switchToTab", Self::SwitchToTab),
        ("setColorScheme", Self::SetColorScheme),
        ("sendInput", Self::SendInput),
        ("openSettings", Self::OpenSettings),
        ("openNewTabDropdown", Self::OpenNewTabDropdown),
        ("commandPalette", Self::CommandPalette),
        ("toggleFullscreen", Self::ToggleFullscreen),
        ("find", Self::Find),
        ("scrollUp", Self::ScrollUp),
        ("scrollDown", Self::ScrollDown),
        ("scrollToTop", Self::ScrollToTop),
        ("scrollToBottom", Self::ScrollToBottom),
        ("resetFontSize", Self::ResetFontSize),
        ("quit", Self::Quit),
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, action)| *action)
    }

    pub fn name(&self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(_, action)| action == self)
            .map(|(name, _)| *name)
            .unwrap_or("unbound")
    }
}

/// Arguments for actions that open a new terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewTerminalArgs {
    /// Profile name or GUID string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Index into the visible profile list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commandline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionArgs {
    None,
    NewTerminal(NewTerminalArgs),
    SetColorScheme { scheme_name: String },
    SendInput { input: String },
    SwitchToTab { index: usize },
    Copy { single_line: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionAndArgs {
    pub action: ShortcutAction,
    pub args: ActionArgs,
}

impl ActionAndArgs {
    pub fn new(action: ShortcutAction) -> Self {
        Self {
            action,
            args: ActionArgs::None,
        }
    }

    /// Parse the value of a `command` key.
    ///
    /// `Ok(None)` means the action name is unknown; the entry is skipped
    /// without a warning so newer settings files still load.
    fn from_json(value: &Value) -> Result<Option<Self>, SettingsLoadWarning> {
        match value {
            Value::Null => Ok(Some(Self::new(ShortcutAction::Unbound))),
            Value::String(name) => match ShortcutAction::from_name(name) {
                Some(action) => Self::with_args(action, &Map::new()).map(Some),
                None => {
                    log::warn!("Ignoring unknown action '{}'", name);
                    Ok(None)
                }
            },
            Value::Object(obj) => {
                let Some(name) = obj.get("action").and_then(Value::as_str) else {
                    return Err(SettingsLoadWarning::FailedToParseCommandJson);
                };
                match ShortcutAction::from_name(name) {
                    Some(action) => Self::with_args(action, obj).map(Some),
                    None => {
                        log::warn!("Ignoring unknown action '{}'", name);
                        Ok(None)
                    }
                }
            }
            _ => Err(SettingsLoadWarning::FailedToParseCommandJson),
        }
    }

    fn with_args(
        action: ShortcutAction,
        obj: &Map<String, Value>,
    ) -> Result<Self, SettingsLoadWarning> {
        let required_str = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(SettingsLoadWarning::MissingRequiredParameter)
        };

        let args = match action {
            ShortcutAction::NewTab | ShortcutAction::NewWindow => {
                let mut fields = obj.clone();
                fields.remove("action");
                if fields.is_empty() {
                    ActionArgs::None
                } else {
                    let args = serde_json::from_value::<NewTerminalArgs>(Value::Object(fields))
                        .map_err(|_| SettingsLoadWarning::FailedToParseCommandJson)?;
                    ActionArgs::NewTerminal(args)
                }
            }
            ShortcutAction::SetColorScheme => ActionArgs::SetColorScheme {
                scheme_name: required_str("colorScheme")?,
            },
            ShortcutAction::SendInput => ActionArgs::SendInput {
                input: required_str("input")?,
            },
            ShortcutAction::SwitchToTab => ActionArgs::SwitchToTab {
                index: obj
                    .get("index")
                    .and_then(Value::as_u64)
                    .map(|i| i as usize)
                    .ok_or(SettingsLoadWarning::MissingRequiredParameter)?,
            },
            ShortcutAction::Copy => ActionArgs::Copy {
                single_line: obj
                    .get("singleLine")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            },
            _ => ActionArgs::None,
        };

        Ok(Self { action, args })
    }
}

/// What a nested command expands over when shown in the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterateOn {
    Profiles,
    Schemes,
}

/// One parsed entry of the actions array.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: Option<String>,
    /// `None` for pure containers of nested commands.
    pub action: Option<ActionAndArgs>,
    pub keys: Option<KeyChord>,
    pub iterate_on: Option<IterateOn>,
    pub subcommands: Vec<Command>,
    json: Value,
}

impl Command {
    /// Build a command directly.
    pub fn new(action: ActionAndArgs, keys: Option<KeyChord>) -> Self {
        let mut json = Map::new();
        json.insert("command".to_string(), Value::String(action.action.name().to_string()));
        if let Some(keys) = &keys {
            json.insert("keys".to_string(), Value::String(keys.to_string()));
        }
        Self {
            name: None,
            action: Some(action),
            keys,
            iterate_on: None,
            subcommands: Vec::new(),
            json: Value::Object(json),
        }
    }

    /// Parse one entry, appending any problems to `warnings`.
    pub fn from_json(value: &Value, warnings: &mut Vec<SettingsLoadWarning>) -> Option<Self> {
        let Some(obj) = value.as_object() else {
            warnings.push(SettingsLoadWarning::FailedToParseCommandJson);
            return None;
        };

        let name = obj.get("name").and_then(Value::as_str).map(str::to_string);
        let iterate_on = match obj.get("iterateOn").and_then(Value::as_str) {
            Some("profiles") => Some(IterateOn::Profiles),
            Some("schemes") => Some(IterateOn::Schemes),
            _ => None,
        };

        let mut subcommands = Vec::new();
        if let Some(nested) = obj.get("commands") {
            let Some(entries) = nested.as_array() else {
                warnings.push(SettingsLoadWarning::FailedToParseSubCommands);
                return None;
            };
            for entry in entries {
                if let Some(command) = Self::from_json(entry, warnings) {
                    subcommands.push(command);
                }
            }
        }

        let action = match obj.get("command") {
            Some(value) => match ActionAndArgs::from_json(value) {
                Ok(Some(action)) => Some(action),
                Ok(None) => return None,
                Err(warning) => {
                    warnings.push(warning);
                    return None;
                }
            },
            None if subcommands.is_empty() => {
                log::debug!("Ignoring action entry without a command: {}", value);
                return None;
            }
            None => None,
        };

        if action.is_none() && name.is_none() {
            log::debug!("Ignoring nested command list without a name");
            return None;
        }

        Some(Self {
            name,
            action,
            keys: parse_keys(obj.get("keys"), warnings),
            iterate_on,
            subcommands,
            json: value.clone(),
        })
    }

    pub fn is_unbound(&self) -> bool {
        self.action
            .as_ref()
            .is_some_and(|a| a.action == ShortcutAction::Unbound)
    }

    pub fn has_nested_commands(&self) -> bool {
        !self.subcommands.is_empty()
    }

    /// The command followed by all nested commands, depth first.
    pub fn walk(&self) -> Vec<&Command> {
        let mut out = vec![self];
        for sub in &self.subcommands {
            out.extend(sub.walk());
        }
        out
    }

    pub fn to_json(&self) -> Value {
        self.json.clone()
    }
}

fn parse_keys(value: Option<&Value>, warnings: &mut Vec<SettingsLoadWarning>) -> Option<KeyChord> {
    let text = match value? {
        Value::String(s) => s.as_str(),
        Value::Array(items) if items.len() == 1 => items[0].as_str()?,
        Value::Array(items) if items.len() > 1 => {
            warnings.push(SettingsLoadWarning::TooManyKeysForChord);
            return None;
        }
        _ => return None,
    };

    match parse_key_chord(text) {
        Ok(chord) => Some(chord),
        Err(e) => {
            log::warn!("Ignoring key binding '{}': {}", text, e);
            None
        }
    }
}

/// Layered table of commands.
#[derive(Debug, Clone, Default)]
pub struct ActionMap {
    commands: Vec<Command>,
    parents: Vec<ActionMap>,
}

impl ActionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every entry of an actions array to this layer.
    ///
    /// Later entries shadow earlier ones with the same chord or name.
    pub fn layer_json(&mut self, value: &Value) -> Vec<SettingsLoadWarning> {
        let mut warnings = Vec::new();
        let Some(entries) = value.as_array() else {
            log::warn!("Ignoring actions: expected an array");
            return warnings;
        };
        for entry in entries {
            if let Some(command) = Command::from_json(entry, &mut warnings) {
                self.commands.push(command);
            }
        }
        warnings
    }

    pub fn add_command(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Add a lower-priority layer below this one and any earlier parents.
    pub fn insert_parent(&mut self, parent: ActionMap) {
        self.parents.push(parent);
    }

    pub fn own_commands(&self) -> &[Command] {
        &self.commands
    }

    /// Every command in every layer, own layer first.
    pub fn all_commands(&self) -> Vec<&Command> {
        let mut out: Vec<&Command> = self.commands.iter().collect();
        for parent in &self.parents {
            out.extend(parent.all_commands());
        }
        out
    }

    /// `Some(None)` if the chord is explicitly unbound in this layer stack.
    fn find_chord(&self, chord: &KeyChord) -> Option<Option<&Command>> {
        if let Some(command) = self
            .commands
            .iter()
            .rev()
            .find(|c| c.keys.as_ref() == Some(chord))
        {
            return Some((!command.is_unbound()).then_some(command));
        }
        self.parents.iter().find_map(|p| p.find_chord(chord))
    }

    /// The command bound to `chord`, if it is bound at all.
    pub fn command_for_chord(&self, chord: &KeyChord) -> Option<&Command> {
        self.find_chord(chord).flatten()
    }

    pub fn command_by_name(&self, name: &str) -> Option<&Command> {
        self.commands
            .iter()
            .rev()
            .find(|c| c.name.as_deref() == Some(name))
            .or_else(|| self.parents.iter().find_map(|p| p.command_by_name(name)))
    }

    /// This layer's entries, in the shape they were read.
    pub fn to_json(&self) -> Value {
        Value::Array(self.commands.iter().map(Command::to_json).collect())
    }
}
