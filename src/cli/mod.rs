//! Command-line interface for strata-term.
//!
//! Subcommands load the settings once, print something about them and exit.
//! Without a subcommand the binary keeps the settings live and reloads them
//! whenever the file changes.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

use crate::fragments::DirectoryFragmentCatalog;
use crate::settings::{LoadOptions, Settings};
use strata_config::guid::format_guid;

/// strata-term - layered settings for a terminal emulator
#[derive(Parser)]
#[command(name = "strata-term")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Settings file to load (default: settings.json in the strata-term config directory)
    #[arg(long, value_name = "PATH", global = true)]
    pub settings: Option<PathBuf>,

    /// Application state file (default: state.json next to the settings file)
    #[arg(long, value_name = "PATH", global = true)]
    pub state: Option<PathBuf>,

    /// Do not run the dynamic profile generators
    #[arg(long, global = true)]
    pub no_generators: bool,

    /// Set debug log level (overrides RUST_LOG)
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevelArg>,
}

/// Log level argument for CLI
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevelArg {
    /// Convert to `log::LevelFilter`
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevelArg::Off => log::LevelFilter::Off,
            LogLevelArg::Error => log::LevelFilter::Error,
            LogLevelArg::Warn => log::LevelFilter::Warn,
            LogLevelArg::Info => log::LevelFilter::Info,
            LogLevelArg::Debug => log::LevelFilter::Debug,
            LogLevelArg::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Print the settings document as it would be written to disk
    Dump,

    /// List profiles with GUID, source and visibility
    Profiles {
        /// Include hidden profiles
        #[arg(short, long)]
        all: bool,
    },

    /// Print load warnings, and the load error if the settings failed to load
    Warnings,

    /// Print the effective settings of one profile
    Resolve {
        /// Profile name or braced GUID
        profile: String,
    },
}

/// Runtime options passed from CLI to the live settings loop
#[derive(Clone, Debug)]
pub struct RuntimeOptions {
    pub load_options: LoadOptions,
    /// Log level override from CLI
    pub log_level: Option<log::LevelFilter>,
}

/// Result of CLI processing
pub enum CliResult {
    /// Keep the settings live, with these options
    Continue(RuntimeOptions),
    /// Exit with the given code (subcommand completed)
    Exit(i32),
}

impl Cli {
    /// Load options for the paths and flags given on the command line.
    pub fn load_options(&self) -> LoadOptions {
        let mut options = match &self.settings {
            Some(path) => LoadOptions::for_settings_file(path)
                .with_fragment_roots(DirectoryFragmentCatalog::default_roots()),
            None => LoadOptions::default(),
        };
        if let Some(state) = &self.state {
            options.state_path = Some(state.clone());
        }
        if self.no_generators {
            options.run_generators = false;
        }
        options
    }
}

/// Process CLI arguments and handle subcommands
pub fn process_cli() -> CliResult {
    let cli = Cli::parse();
    let log_level = cli.log_level.map(LogLevelArg::to_level_filter);
    let load_options = cli.load_options();

    let Some(command) = cli.command else {
        return CliResult::Continue(RuntimeOptions {
            load_options,
            log_level,
        });
    };

    crate::debug::init_log_bridge(log_level);
    debug_info!("CLI", "Running {:?} against {:?}", command, load_options.settings_path);

    let settings = Settings::load_all(&load_options);
    let stdout = std::io::stdout();
    match run_command(&command, &settings, &mut stdout.lock()) {
        Ok(code) => CliResult::Exit(code),
        Err(e) => {
            eprintln!("strata-term: error: {e:#}");
            CliResult::Exit(1)
        }
    }
}

/// Run one subcommand against loaded settings, writing to `out`.
///
/// Returns the process exit code.
pub fn run_command(command: &Commands, settings: &Settings, out: &mut dyn Write) -> Result<i32> {
    match command {
        Commands::Dump => {
            let json = settings.to_json()?;
            writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?;
        }
        Commands::Profiles { all } => {
            let profiles: Vec<_> = if *all {
                settings.all_profiles().collect()
            } else {
                settings.active_profiles().collect()
            };
            let default = settings.default_profile().map(|p| p.guid());
            for profile in profiles {
                let marker = if Some(profile.guid()) == default { "*" } else { " " };
                let mut line = format!(
                    "{marker} {} {:<24} {}",
                    format_guid(&profile.guid()),
                    profile.name(),
                    profile.source().unwrap_or_else(|| "-".to_string())
                );
                if profile.deleted() {
                    line.push_str(" (deleted)");
                } else if profile.hidden() {
                    line.push_str(" (hidden)");
                }
                writeln!(out, "{}", line.trim_end())?;
            }
        }
        Commands::Warnings => {
            for warning in settings.warnings() {
                writeln!(out, "warning: {warning}")?;
            }
            if let Some(error) = settings.load_error() {
                writeln!(out, "error: {error}")?;
                if let Some(report) = settings.deserialization_message() {
                    writeln!(out, "{report}")?;
                }
                return Ok(1);
            }
        }
        Commands::Resolve { profile } => {
            let Some(guid) = settings.profile_guid_by_name(profile) else {
                anyhow::bail!("No profile named {:?}", profile);
            };
            if let Some(json) = settings.resolved_profile_json(guid) {
                writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?;
            }
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::INBOX_JSON;

    fn run(command: Commands, settings: &Settings) -> (i32, String) {
        let mut out = Vec::new();
        let code = run_command(&command, settings, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "strata-term",
            "profiles",
            "--all",
            "--settings",
            "/tmp/x/settings.json",
            "--no-generators",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Profiles { all: true })));
        let options = cli.load_options();
        assert_eq!(options.settings_path, PathBuf::from("/tmp/x/settings.json"));
        assert_eq!(options.state_path, Some(PathBuf::from("/tmp/x/state.json")));
        assert!(!options.run_generators);
        assert_eq!(
            cli.log_level.map(LogLevelArg::to_level_filter),
            Some(log::LevelFilter::Debug)
        );
    }

    #[test]
    fn test_profiles_lists_default_first_marker() {
        let settings = Settings::from_json(
            r#"{ "profiles": [ { "name": "Work" }, { "name": "Old", "hidden": true } ] }"#,
            INBOX_JSON,
        )
        .unwrap();
        let (code, out) = run(Commands::Profiles { all: false }, &settings);
        assert_eq!(code, 0);
        assert_eq!(out.lines().count(), 2);
        assert!(out.contains("System Shell"));

        let (_, out) = run(Commands::Profiles { all: true }, &settings);
        assert!(out.lines().any(|l| l.contains("Old") && l.ends_with("(hidden)")));
        assert!(out.lines().any(|l| l.starts_with('*') && l.contains("System Shell")));
    }

    #[test]
    fn test_warnings_report_load_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{\n  \"initialRows\": \"many\"\n}").unwrap();
        let settings = Settings::load_all(&LoadOptions::for_settings_file(&path).without_generators());

        let (code, out) = run(Commands::Warnings, &settings);
        assert_eq!(code, 1);
        assert!(out.contains("error:"));
        assert!(out.contains("* Line 2"));
    }

    #[test]
    fn test_resolve_unknown_profile_fails() {
        let settings = Settings::load_defaults().unwrap();
        let mut out = Vec::new();
        let command = Commands::Resolve {
            profile: "Nope".to_string(),
        };
        assert!(run_command(&command, &settings, &mut out).is_err());

        let (code, out) = run(
            Commands::Resolve {
                profile: "System Shell".to_string(),
            },
            &settings,
        );
        assert_eq!(code, 0);
        assert!(out.contains("\"commandline\": \"/bin/sh\""));
    }
}
