use super::{ScanOutcome, SkipReason, SkippedEntry};
use crate::error::Error;
use crate::key::{EntryKey, KeySet};
use crate::progress::SyncReporter;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Walk `root` and collect the key of every file sitting exactly
/// [`KEY_SEGMENTS`](crate::key::KEY_SEGMENTS) components below it.
///
/// Only a missing or unreadable root is fatal. Anything wrong with an
/// individual entry is logged, reported and skipped. Symlinks are not
/// followed into directories. Returns [`Error::Interrupted`] as soon as
/// `cancel` is raised.
pub fn scan_tree(
    root: &Path,
    reporter: &dyn SyncReporter,
    cancel: &AtomicBool,
) -> Result<ScanOutcome, Error> {
    check_root(root)?;

    reporter.on_scan_start(root);
    let start = Instant::now();

    let mut keys = KeySet::new();
    let mut skipped: Vec<SkippedEntry> = Vec::new();
    let mut files_seen = 0usize;

    let mut skip = |path: &Path, reason: SkipReason| {
        warn!("Skipping {}: {}", path.display(), reason);
        let entry = SkippedEntry {
            path: path.to_path_buf(),
            reason,
        };
        reporter.on_entry_skipped(&entry);
        skipped.push(entry);
    };

    for entry_result in WalkDir::new(root).follow_links(false).min_depth(1) {
        if cancel.load(Ordering::Relaxed) {
            warn!("Scan of {} interrupted", root.display());
            return Err(Error::Interrupted);
        }

        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                skip(&path, SkipReason::Unreadable(err.to_string()));
                continue;
            }
        };

        let path = entry.path();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            continue;
        }

        if file_type.is_symlink() {
            match fs::metadata(path) {
                Ok(target) if target.is_dir() => {
                    skip(path, SkipReason::SymlinkedDirectory);
                    continue;
                }
                Ok(target) if target.is_file() => {}
                Ok(_) => {
                    debug!("Ignoring {}: symlink to a special file", path.display());
                    continue;
                }
                Err(_) => {
                    skip(path, SkipReason::BrokenSymlink);
                    continue;
                }
            }
        } else if !file_type.is_file() {
            debug!("Ignoring {}: not a regular file", path.display());
            continue;
        }

        files_seen += 1;

        // WalkDir yields paths joined onto `root`, so the prefix always strips.
        let rel_path = path.strip_prefix(root).unwrap_or(path);
        match EntryKey::from_relative_path(rel_path) {
            Ok(key) => {
                debug!("Found {}", key);
                keys.insert(key);
                reporter.on_scan_progress(keys.len());
            }
            Err(rejection) => skip(path, rejection.into()),
        }
    }

    let duration = start.elapsed();
    info!("Found {} files", keys.len());
    debug!(
        "Scan of {} completed in {:.2}s — {} files seen, {} entries skipped",
        root.display(),
        duration.as_secs_f64(),
        files_seen,
        skipped.len(),
    );
    reporter.on_scan_complete(keys.len(), skipped.len(), duration.as_secs_f64());

    Ok(ScanOutcome {
        keys,
        skipped,
        files_seen,
        duration,
    })
}

fn check_root(root: &Path) -> Result<(), Error> {
    let metadata = match fs::metadata(root) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(Error::RootNotFound {
                path: root.to_path_buf(),
            })
        }
        Err(err) => {
            return Err(Error::RootUnreadable {
                path: root.to_path_buf(),
                source: err,
            })
        }
    };

    if !metadata.is_dir() {
        return Err(Error::RootNotADirectory {
            path: root.to_path_buf(),
        });
    }

    fs::read_dir(root).map_err(|err| Error::RootUnreadable {
        path: root.to_path_buf(),
        source: err,
    })?;

    Ok(())
}
