mod cli;
mod logging;
mod reporter;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use colored::*;
use dotenv::dotenv;
use fsdb_sync::config::{self, AppConfig};
use fsdb_sync::{Error, PgStore, SyncEngine, SyncResult, UpdateOutcome};
use reporter::CliReporter;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Exit status when the run finished but some keys failed or were skipped.
const EXIT_PARTIAL_FAILURE: u8 = 2;
const EXIT_FATAL: i32 = 1;

fn main() -> ExitCode {
    dotenv().ok();

    let args = Cli::parse();

    let _guard = logging::init_logger(args.log_level());

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    if let Err(err) = ctrlc::set_handler(move || {
        if raise_cancel(&flag) {
            eprintln!("Received second Ctrl+C, exiting now");
            std::process::exit(EXIT_FATAL);
        }
        warn!("Received Ctrl+C, stopping... (press again to exit immediately)");
    }) {
        warn!("Unable to install Ctrl+C handler: {}", err);
    }

    match run_sync(&args, cancel) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_PARTIAL_FAILURE),
        Err(err) => {
            error!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every planned update was applied.
fn run_sync(args: &Cli, cancel: Arc<AtomicBool>) -> anyhow::Result<bool> {
    let mut app_config = AppConfig::load().context("Error loading configuration")?;
    app_config.apply_overrides(args.db_overrides());

    let root = config::expand_root(&args.root);
    info!("Syncing {} with {}", root.display(), app_config.describe_target());

    let mut store = PgStore::connect(&app_config.connection_target())
        .with_context(|| format!("Error connecting to {}", app_config.describe_target()))?;
    check_interrupted(&cancel)?;

    let engine = SyncEngine::new(&root)
        .dry_run(args.dry_run)
        .with_cancel_flag(cancel);
    let reporter = CliReporter::new();
    let result = engine.run(&mut store, &reporter)?;

    if let Some(csv_path) = &args.plan_csv {
        result
            .plan
            .write_csv(csv_path)
            .with_context(|| format!("Error writing plan to {}", csv_path.display()))?;
        info!("Plan written to {}", csv_path.display());
    }

    print_summary(&result);

    Ok(result.is_clean())
}

/// Raise the cancel flag. Returns true when it was already raised.
fn raise_cancel(flag: &AtomicBool) -> bool {
    flag.swap(true, Ordering::SeqCst)
}

fn check_interrupted(cancel: &AtomicBool) -> Result<(), Error> {
    if cancel.load(Ordering::SeqCst) {
        warn!("Interrupted while connecting, nothing was changed");
        return Err(Error::Interrupted);
    }
    Ok(())
}

fn print_summary(result: &SyncResult) {
    info!(
        "Planning: {}, Updates: {}",
        format!("{:.2}s", result.planning_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.update_duration.as_secs_f64()).green(),
    );
    info!(
        "{} files on disk, {} skipped, {} tracked in database",
        format!("{}", result.scan.keys.len()).cyan(),
        format!("{}", result.scan.skipped.len()).yellow(),
        format!("{}", result.db_key_count).cyan(),
    );

    match &result.outcome {
        UpdateOutcome::Reported { adds, deletes } => {
            info!(
                "{} adds and {} deletes required (dry run, nothing changed)",
                format!("{}", adds).yellow(),
                format!("{}", deletes).yellow(),
            );
        }
        UpdateOutcome::Applied(report) => {
            info!(
                "{} inserted, {} deleted, {} failed",
                format!("{}", report.inserted).green(),
                format!("{}", report.deleted).green(),
                format!("{}", report.failures.len()).red(),
            );
            for failure in &report.failures {
                error!("{} {} failed: {}", failure.op, failure.key, failure.error);
            }
            if report.not_attempted > 0 {
                warn!(
                    "{} updates not attempted; re-run to finish",
                    format!("{}", report.not_attempted).red()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_interrupt_requests_exit() {
        let flag = AtomicBool::new(false);
        assert!(!raise_cancel(&flag));
        assert!(flag.load(Ordering::SeqCst));
        assert!(raise_cancel(&flag));
    }

    #[test]
    fn test_interrupt_before_planning_is_fatal() {
        assert!(check_interrupted(&AtomicBool::new(false)).is_ok());
        assert!(matches!(
            check_interrupted(&AtomicBool::new(true)),
            Err(Error::Interrupted)
        ));
    }
}
