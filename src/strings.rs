//! User-visible strings produced by the settings layer.

/// Display name of the builtin `/bin/sh` profile written into a new settings file.
pub const BUILTIN_SHELL_PROFILE_NAME: &str = "System Shell";

/// Suffix for duplicated profiles: `"Bash (Copy)"`, `"Bash (Copy 2)"`.
pub const COPY_SUFFIX: &str = "Copy";

/// Prefix for profiles created from scratch: `"Profile 3"`.
pub const NEW_PROFILE_PREFIX: &str = "Profile";

