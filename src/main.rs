use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use strata_term::cli;
use strata_term::live::{LiveSettings, ReloadOutcome};
use tokio::runtime::Runtime;

/// How often the live loop checks the watcher for pending changes.
const WATCH_POLL_INTERVAL: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    // Process CLI arguments first (subcommands exit from here)
    let runtime_options = match cli::process_cli() {
        cli::CliResult::Exit(code) => {
            if code == 0 {
                return Ok(());
            }
            std::process::exit(code);
        }
        cli::CliResult::Continue(options) => options,
    };
    // CLI --log-level flag takes highest precedence, then RUST_LOG.
    strata_term::debug::init_log_bridge(runtime_options.log_level);

    log::info!("Starting strata-term {}", strata_term::VERSION);

    let runtime = Runtime::new()?;
    runtime.block_on(run_live(runtime_options))?;

    log::info!("Shutting down");
    runtime.shutdown_timeout(Duration::from_secs(2));
    Ok(())
}

/// Keep the settings live until Ctrl-C, reloading on every file change.
async fn run_live(options: cli::RuntimeOptions) -> Result<()> {
    let live = Arc::new(LiveSettings::load(options.load_options));
    report(&live.current());

    let watcher = match live.watch() {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            log::warn!("Settings hot reload disabled: {:#}", e);
            None
        }
    };

    let mut interval = tokio::time::interval(WATCH_POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = interval.tick() => {
                let Some(watcher) = &watcher else { continue };
                if !watcher.take_pending() {
                    continue;
                }
                match live.reload_async().await? {
                    ReloadOutcome::Reloaded(settings) => report(&settings),
                    ReloadOutcome::Failed(error) => eprintln!("strata-term: reload failed: {error}"),
                    ReloadOutcome::Busy => {}
                }
            }
        }
    }
    Ok(())
}

fn report(settings: &strata_term::settings::Settings) {
    if let Some(error) = settings.load_error() {
        eprintln!("strata-term: error: {error}");
        if let Some(report) = settings.deserialization_message() {
            eprintln!("{report}");
        }
        return;
    }
    let default = settings
        .default_profile()
        .map(|p| p.name())
        .unwrap_or_default();
    println!(
        "{} profiles ({} visible), default \"{}\", {} warnings",
        settings.all_profiles().count(),
        settings.active_profiles().count(),
        default,
        settings.warnings().len()
    );
    for warning in settings.warnings() {
        eprintln!("strata-term: warning: {warning}");
    }
}
