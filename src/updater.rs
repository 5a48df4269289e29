use crate::error::Error;
use crate::key::EntryKey;
use crate::progress::SyncReporter;
use crate::reconcile::UpdatePlan;
use crate::store::KeyStore;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Compute and report the plan, never touch the store.
    DryRun,
    Apply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Insert,
    Delete,
}

impl fmt::Display for UpdateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOp::Insert => write!(f, "insert"),
            UpdateOp::Delete => write!(f, "delete"),
        }
    }
}

/// One key whose update failed during apply.
#[derive(Debug)]
pub struct ApplyFailure {
    pub key: EntryKey,
    pub op: UpdateOp,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct ApplyReport {
    pub inserted: usize,
    pub deleted: usize,
    pub failures: Vec<ApplyFailure>,
    /// Keys left untouched because the run was interrupted.
    pub not_attempted: usize,
    pub duration: Duration,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.not_attempted == 0
    }

    pub fn applied(&self) -> usize {
        self.inserted + self.deleted
    }
}

#[derive(Debug)]
pub enum UpdateOutcome {
    /// Dry run: counts only, the store was not touched.
    Reported { adds: usize, deletes: usize },
    Applied(ApplyReport),
}

impl UpdateOutcome {
    pub fn is_clean(&self) -> bool {
        match self {
            UpdateOutcome::Reported { .. } => true,
            UpdateOutcome::Applied(report) => report.is_clean(),
        }
    }
}

/// Apply `plan` to `store`, or only report it when `mode` is [`SyncMode::DryRun`].
///
/// Every key is attempted on its own; a failure is recorded and the next key
/// is tried. Adds go first, then deletes, each in key order. Raising `cancel`
/// stops before the next key.
pub fn run_updates(
    store: &mut dyn KeyStore,
    plan: &UpdatePlan,
    mode: SyncMode,
    reporter: &dyn SyncReporter,
    cancel: &AtomicBool,
) -> UpdateOutcome {
    match mode {
        SyncMode::DryRun => report_plan(plan),
        SyncMode::Apply => UpdateOutcome::Applied(apply_plan(store, plan, reporter, cancel)),
    }
}

fn report_plan(plan: &UpdatePlan) -> UpdateOutcome {
    warn!(
        "Required adds: {}, required deletes: {}, but in DRY_RUN mode",
        plan.adds.len(),
        plan.deletes.len()
    );
    for key in plan.sorted_adds() {
        debug!("Would add {}", key);
    }
    for key in plan.sorted_deletes() {
        debug!("Would delete {}", key);
    }

    UpdateOutcome::Reported {
        adds: plan.adds.len(),
        deletes: plan.deletes.len(),
    }
}

fn apply_plan(
    store: &mut dyn KeyStore,
    plan: &UpdatePlan,
    reporter: &dyn SyncReporter,
    cancel: &AtomicBool,
) -> ApplyReport {
    let total = plan.len();
    let start = Instant::now();
    let mut report = ApplyReport::default();

    info!(
        "Applying {} adds and {} deletes",
        plan.adds.len(),
        plan.deletes.len()
    );
    reporter.on_apply_start(total);

    let ops = plan
        .sorted_adds()
        .into_iter()
        .map(|key| (UpdateOp::Insert, key))
        .chain(
            plan.sorted_deletes()
                .into_iter()
                .map(|key| (UpdateOp::Delete, key)),
        );

    for (done, (op, key)) in ops.enumerate() {
        if cancel.load(Ordering::Relaxed) {
            report.not_attempted = total - done;
            warn!(
                "Apply interrupted, {} of {} updates not attempted",
                report.not_attempted, total
            );
            break;
        }

        let result = match op {
            UpdateOp::Insert => store.insert_key(key),
            UpdateOp::Delete => store.delete_key(key),
        };

        match result {
            Ok(()) => {
                debug!("{} {}", op, key);
                match op {
                    UpdateOp::Insert => report.inserted += 1,
                    UpdateOp::Delete => report.deleted += 1,
                }
            }
            Err(err) => {
                error!("Failed to {} {}: {}", op, key, err);
                report.failures.push(ApplyFailure {
                    key: key.clone(),
                    op,
                    error: err,
                });
            }
        }

        reporter.on_apply_progress(done + 1, total);
    }

    report.duration = start.elapsed();
    reporter.on_apply_complete(
        report.applied(),
        report.failures.len(),
        report.duration.as_secs_f64(),
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeySet;
    use crate::progress::SilentReporter;
    use crate::store::MemoryStore;

    fn key_set(keys: &[&str]) -> KeySet {
        keys.iter().map(|k| EntryKey::from_stored(*k)).collect()
    }

    fn sample_plan() -> UpdatePlan {
        UpdatePlan {
            adds: key_set(&["x/y/1.txt"]),
            deletes: key_set(&["x/y/3.txt"]),
        }
    }

    #[test]
    fn test_dry_run_leaves_store_untouched() {
        let mut store = MemoryStore::with_keys(["x/y/2.txt", "x/y/3.txt"]);
        let cancel = AtomicBool::new(false);

        let outcome = run_updates(
            &mut store,
            &sample_plan(),
            SyncMode::DryRun,
            &SilentReporter,
            &cancel,
        );

        assert!(matches!(
            outcome,
            UpdateOutcome::Reported {
                adds: 1,
                deletes: 1
            }
        ));
        assert_eq!(store.mutation_count(), 0);
        assert_eq!(store.keys(), &key_set(&["x/y/2.txt", "x/y/3.txt"]));
    }

    #[test]
    fn test_apply_inserts_and_deletes() {
        let mut store = MemoryStore::with_keys(["x/y/2.txt", "x/y/3.txt"]);
        let cancel = AtomicBool::new(false);

        let outcome = run_updates(
            &mut store,
            &sample_plan(),
            SyncMode::Apply,
            &SilentReporter,
            &cancel,
        );

        let UpdateOutcome::Applied(report) = outcome else {
            panic!("expected an applied outcome");
        };
        assert_eq!(report.inserted, 1);
        assert_eq!(report.deleted, 1);
        assert!(report.is_clean());
        assert_eq!(store.keys(), &key_set(&["x/y/1.txt", "x/y/2.txt"]));
    }

    #[test]
    fn test_apply_twice_is_idempotent() {
        let mut store = MemoryStore::with_keys(["x/y/2.txt", "x/y/3.txt"]);
        let cancel = AtomicBool::new(false);
        let plan = sample_plan();

        run_updates(&mut store, &plan, SyncMode::Apply, &SilentReporter, &cancel);
        let after_once = store.keys().clone();
        let outcome = run_updates(&mut store, &plan, SyncMode::Apply, &SilentReporter, &cancel);

        assert!(outcome.is_clean());
        assert_eq!(store.keys(), &after_once);
        assert_eq!(store.mutation_count(), 2);
    }

    #[test]
    fn test_cancelled_apply_attempts_nothing() {
        let mut store = MemoryStore::with_keys(["x/y/3.txt"]);
        let cancel = AtomicBool::new(true);

        let outcome = run_updates(
            &mut store,
            &sample_plan(),
            SyncMode::Apply,
            &SilentReporter,
            &cancel,
        );

        let UpdateOutcome::Applied(report) = outcome else {
            panic!("expected an applied outcome");
        };
        assert_eq!(report.not_attempted, 2);
        assert!(!report.is_clean());
        assert_eq!(store.mutation_count(), 0);
    }
}
