use crate::scanner::SkippedEntry;
use std::path::Path;

/// Observability handle threaded through every phase of a sync run.
///
/// The CLI implements it with indicatif progress bars; tests use it to observe
/// what was skipped or applied. All methods have default no-op implementations.
pub trait SyncReporter: Send + Sync {
    fn on_scan_start(&self, _root: &Path) {}
    fn on_scan_progress(&self, _files_found: usize) {}
    fn on_entry_skipped(&self, _entry: &SkippedEntry) {}
    fn on_scan_complete(&self, _accepted: usize, _skipped: usize, _duration_secs: f64) {}
    fn on_db_read_complete(&self, _keys: usize, _duration_secs: f64) {}
    fn on_plan_ready(&self, _adds: usize, _deletes: usize) {}
    fn on_apply_start(&self, _total: usize) {}
    fn on_apply_progress(&self, _done: usize, _total: usize) {}
    fn on_apply_complete(&self, _applied: usize, _failed: usize, _duration_secs: f64) {}
}

/// No-op reporter for silent operation.
pub struct SilentReporter;

impl SyncReporter for SilentReporter {}
