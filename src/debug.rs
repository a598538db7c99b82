//! Debug logging for strata-term.
//!
//! Every record logged through the `log` facade is written to
//! `strata_term_debug.log` in the temp directory, so diagnostics never mix
//! with the JSON the CLI prints on stdout. When `RUST_LOG` is set, records are
//! mirrored to stderr as well.
//!
//! Level precedence: the `--log-level` CLI flag, then `RUST_LOG`, then off.
//!
//! The category macros (`debug_info!("LOADER", ...)` etc.) log with the
//! category as the record target.

use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Location of the debug log file.
pub fn log_path() -> PathBuf {
    std::env::temp_dir().join("strata_term_debug.log")
}

/// Global debug logger
struct DebugLogger {
    level: LevelFilter,
    mirror_stderr: bool,
    file: Mutex<Option<File>>,
}

impl DebugLogger {
    fn new(level: LevelFilter, mirror_stderr: bool) -> Self {
        let file = if level == LevelFilter::Off {
            None
        } else {
            // Silently run without a file if it can't be opened
            OpenOptions::new()
                .write(true)
                .truncate(true)
                .create(true)
                .open(log_path())
                .ok()
        };

        let logger = DebugLogger {
            level,
            mirror_stderr,
            file: Mutex::new(file),
        };
        logger.write_raw(&format!(
            "\n{}\nstrata-term debug session started at {} (level={})\n{}\n",
            "=".repeat(80),
            get_timestamp(),
            level,
            "=".repeat(80)
        ));
        logger
    }

    fn write_raw(&self, msg: &str) {
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.write_all(msg.as_bytes());
            let _ = file.flush();
        }
    }
}

impl Log for DebugLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            &get_timestamp(),
            record.level(),
            record.target(),
            &record.args().to_string(),
        );
        self.write_raw(&line);
        if self.mirror_stderr {
            eprint!("{line}");
        }
    }

    fn flush(&self) {
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.flush();
        }
    }
}

static LOGGER: OnceLock<DebugLogger> = OnceLock::new();

fn get_timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string()
}

fn format_line(timestamp: &str, level: log::Level, target: &str, msg: &str) -> String {
    format!("[{}] [{:<5}] [{}] {}\n", timestamp, level, target, msg)
}

/// Read a level from a `RUST_LOG`-style value.
///
/// Accepts a bare level (`debug`) or takes the level of the first
/// `target=level` directive.
fn parse_level(value: &str) -> Option<LevelFilter> {
    let directive = value.split(',').next()?.trim();
    let level = directive.rsplit('=').next()?.trim();
    level.parse().ok()
}

/// Install the `log` bridge.
///
/// Safe to call more than once; only the first call installs a logger.
pub fn init_log_bridge(cli_level: Option<LevelFilter>) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let level = cli_level
        .or_else(|| rust_log.as_deref().and_then(parse_level))
        .unwrap_or(LevelFilter::Off);

    let logger = LOGGER.get_or_init(|| DebugLogger::new(level, rust_log.is_some()));
    if log::set_logger(logger).is_ok() {
        log::set_max_level(logger.level);
    }
}

// Convenience macros for category-tagged logging
#[macro_export]
macro_rules! debug_error {
    ($category:expr, $($arg:tt)*) => {
        ::log::error!(target: $category, $($arg)*)
    };
}

#[macro_export]
macro_rules! debug_info {
    ($category:expr, $($arg:tt)*) => {
        ::log::info!(target: $category, $($arg)*)
    };
}

#[macro_export]
macro_rules! debug_log {
    ($category:expr, $($arg:tt)*) => {
        ::log::debug!(target: $category, $($arg)*)
    };
}

#[macro_export]
macro_rules! debug_trace {
    ($category:expr, $($arg:tt)*) => {
        ::log::trace!(target: $category, $($arg)*)
    };
}
