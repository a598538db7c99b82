//! One profile per installed shell.
//!
//! Shells come from `/etc/shells`, the login shell in `$SHELL`, and a few
//! well-known install locations that `/etc/shells` often misses (Homebrew,
//! `/usr/local`).

use std::collections::HashSet;
use std::path::Path;

use super::ProfileGenerator;
use strata_config::{Origin, Profile};

/// Information about a detected shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInfo {
    /// Display name, the binary's file name (e.g. "zsh", "bash")
    pub name: String,
    /// Absolute path to the shell binary
    pub path: String,
}

impl ShellInfo {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    fn from_path(path: &str) -> Self {
        let name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string());
        Self::new(name, path)
    }
}

impl std::fmt::Display for ShellInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.path)
    }
}

/// Shells commonly installed outside the paths listed in `/etc/shells`.
const EXTRA_SHELLS: &[(&str, &[&str])] = &[
    (
        "pwsh",
        &[
            "/opt/homebrew/bin/pwsh",
            "/usr/local/bin/pwsh",
            "/usr/bin/pwsh",
        ],
    ),
    (
        "fish",
        &[
            "/opt/homebrew/bin/fish",
            "/usr/local/bin/fish",
            "/usr/bin/fish",
        ],
    ),
    (
        "nu",
        &["/opt/homebrew/bin/nu", "/usr/local/bin/nu", "/usr/bin/nu"],
    ),
    (
        "elvish",
        &[
            "/opt/homebrew/bin/elvish",
            "/usr/local/bin/elvish",
            "/usr/bin/elvish",
        ],
    ),
];

/// Collect shells from the text of `/etc/shells`, the login shell and
/// [`EXTRA_SHELLS`], keeping those for which `exists` holds.
///
/// The login shell comes first. A shell name found at several paths is kept
/// once, at its first path.
fn collect_shells(
    etc_shells: &str,
    login_shell: Option<&str>,
    exists: impl Fn(&str) -> bool,
) -> Vec<ShellInfo> {
    let mut shells: Vec<ShellInfo> = Vec::new();
    let mut seen_names = HashSet::new();
    let mut push = |shell: ShellInfo, shells: &mut Vec<ShellInfo>| {
        if seen_names.insert(shell.name.clone()) {
            shells.push(shell);
        }
    };

    if let Some(login) = login_shell.filter(|s| !s.is_empty() && exists(*s)) {
        push(ShellInfo::from_path(login), &mut shells);
    }

    for line in etc_shells.lines() {
        let line = line.trim();
        // Skip comments and empty lines
        if line.is_empty() || line.starts_with('#') || !exists(line) {
            continue;
        }
        push(ShellInfo::from_path(line), &mut shells);
    }

    for (name, paths) in EXTRA_SHELLS {
        if let Some(path) = paths.iter().copied().find(|p| exists(*p)) {
            push(ShellInfo::new(*name, path), &mut shells);
        }
    }

    shells
}

/// Generates one profile per detected shell.
#[derive(Debug, Clone)]
pub struct ShellProfileGenerator {
    shells: Vec<ShellInfo>,
    login_shell: Option<String>,
}

impl ShellProfileGenerator {
    pub const NAMESPACE: &'static str = "Strata.ShellProfiles";

    /// Inspect the running system.
    pub fn detect() -> Self {
        let login_shell = std::env::var("SHELL").ok().filter(|s| !s.is_empty());
        let etc_shells = match std::fs::read_to_string("/etc/shells") {
            Ok(text) => text,
            Err(e) => {
                log::debug!("No /etc/shells: {}", e);
                String::new()
            }
        };
        let shells = collect_shells(&etc_shells, login_shell.as_deref(), |p| {
            Path::new(p).exists()
        });
        log::debug!("Detected {} shells", shells.len());
        Self {
            shells,
            login_shell,
        }
    }

    /// A generator over a fixed shell list.
    pub fn with_shells(shells: Vec<ShellInfo>, login_shell: Option<String>) -> Self {
        Self {
            shells,
            login_shell,
        }
    }

    pub fn shells(&self) -> &[ShellInfo] {
        &self.shells
    }
}

impl ProfileGenerator for ShellProfileGenerator {
    fn namespace(&self) -> &str {
        Self::NAMESPACE
    }

    fn generate_profiles(&self, profiles: &mut Vec<Profile>) -> anyhow::Result<()> {
        for shell in &self.shells {
            let mut profile = Profile::new(&shell.name).with_origin(Origin::Generated);
            profile.source = Some(Self::NAMESPACE.to_string());
            profile.commandline = Some(shell.path.clone());
            profile.ensure_guid();
            profiles.push(profile);
        }
        Ok(())
    }

    fn preferred_default_profile_name(&self) -> Option<String> {
        let login = self.login_shell.as_deref()?;
        self.shells
            .iter()
            .find(|s| s.path == login)
            .map(|s| s.name.clone())
    }
}
