use crate::error::Error;
use crate::key::{EntryKey, KeySet};
use crate::progress::SyncReporter;
use crate::reconcile::{self, UpdatePlan};
use crate::scanner::{self, ScanOutcome};
use crate::store::KeyStore;
use crate::updater::{self, SyncMode, UpdateOutcome};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The two phases of a run. `Applying` and `Reporting` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Planning,
    Applying,
    Reporting,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPhase::Planning => write!(f, "PLANNING"),
            SyncPhase::Applying => write!(f, "APPLYING"),
            SyncPhase::Reporting => write!(f, "REPORTING"),
        }
    }
}

pub struct SyncEngine {
    root: PathBuf,
    mode: SyncMode,
    cancel: Arc<AtomicBool>,
}

/// Both snapshots and the plan computed from them.
#[derive(Debug)]
pub struct Planned {
    pub scan: ScanOutcome,
    pub db_keys: KeySet,
    pub plan: UpdatePlan,
    pub db_read_duration: Duration,
    pub planning_duration: Duration,
}

#[derive(Debug)]
pub struct SyncResult {
    pub scan: ScanOutcome,
    pub db_key_count: usize,
    pub plan: UpdatePlan,
    pub final_phase: SyncPhase,
    pub outcome: UpdateOutcome,
    pub planning_duration: Duration,
    pub update_duration: Duration,
}

impl SyncResult {
    /// False when any key failed to apply or was left unattempted.
    pub fn is_clean(&self) -> bool {
        self.outcome.is_clean()
    }
}

impl SyncEngine {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            mode: SyncMode::Apply,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.mode = if dry_run {
            SyncMode::DryRun
        } else {
            SyncMode::Apply
        };
        self
    }

    /// Share an interrupt flag, typically raised from a Ctrl+C handler.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// PLANNING: scan the tree and read the store concurrently, then diff.
    ///
    /// Nothing is mutated here. Any error, or an interrupt, aborts the run.
    pub fn plan(
        &self,
        store: &mut dyn KeyStore,
        reporter: &dyn SyncReporter,
    ) -> Result<Planned, Error> {
        info!("Entering {} phase for {}", SyncPhase::Planning, self.root.display());
        let planning_start = Instant::now();
        let cancel: &AtomicBool = &self.cancel;

        let (scan_result, db_result) = rayon::join(
            || scanner::scan_tree(&self.root, reporter, cancel),
            || {
                let db_start = Instant::now();
                store
                    .fetch_keys()
                    .map(|keys| (keys, db_start.elapsed()))
            },
        );

        let scan = scan_result?;
        let (db_keys, db_read_duration) = db_result?;
        info!("Found {} tracked entries in database", db_keys.len());
        reporter.on_db_read_complete(db_keys.len(), db_read_duration.as_secs_f64());

        let mut non_canonical = 0usize;
        for key in &db_keys {
            if let Err(reason) = EntryKey::parse(key.as_str()) {
                debug!("Stored entry {} is not canonical: {}", key, reason);
                non_canonical += 1;
            }
        }
        if non_canonical > 0 {
            warn!(
                "{} database entries are not in canonical form and will be scheduled for deletion",
                non_canonical
            );
        }

        if self.cancel.load(Ordering::Relaxed) {
            warn!("Interrupted during {} phase, nothing was changed", SyncPhase::Planning);
            return Err(Error::Interrupted);
        }

        let plan = reconcile::reconcile(&scan.keys, &db_keys);
        let planning_duration = planning_start.elapsed();
        info!(
            "Planned {} adds and {} deletes",
            plan.adds.len(),
            plan.deletes.len()
        );
        debug!(
            "Planning completed in {:.2}s (database read {:.2}s)",
            planning_duration.as_secs_f64(),
            db_read_duration.as_secs_f64(),
        );
        reporter.on_plan_ready(plan.adds.len(), plan.deletes.len());

        Ok(Planned {
            scan,
            db_keys,
            plan,
            db_read_duration,
            planning_duration,
        })
    }

    /// Run the whole pipeline: PLANNING, then APPLYING or REPORTING.
    pub fn run(
        &self,
        store: &mut dyn KeyStore,
        reporter: &dyn SyncReporter,
    ) -> Result<SyncResult, Error> {
        let planned = self.plan(store, reporter)?;

        let final_phase = match self.mode {
            SyncMode::DryRun => SyncPhase::Reporting,
            SyncMode::Apply => SyncPhase::Applying,
        };
        info!("Entering {} phase", final_phase);

        let update_start = Instant::now();
        let outcome = updater::run_updates(store, &planned.plan, self.mode, reporter, &self.cancel);
        let update_duration = update_start.elapsed();

        Ok(SyncResult {
            scan: planned.scan,
            db_key_count: planned.db_keys.len(),
            plan: planned.plan,
            final_phase,
            outcome,
            planning_duration: planned.planning_duration,
            update_duration,
        })
    }
}
