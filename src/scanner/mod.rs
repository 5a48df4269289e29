mod walk;

use crate::key::{KeyRejection, KeySet};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub use walk::scan_tree;

/// Result of walking one scan root.
#[derive(Debug)]
pub struct ScanOutcome {
    pub keys: KeySet,
    pub skipped: Vec<SkippedEntry>,
    /// Regular files seen, accepted or not.
    pub files_seen: usize,
    pub duration: Duration,
}

/// An entry below the root that was left out of the snapshot.
#[derive(Debug, Clone)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    DepthViolation { segments: usize },
    NonUtf8Path,
    NonNormalComponent,
    SymlinkedDirectory,
    BrokenSymlink,
    Unreadable(String),
}

impl From<KeyRejection> for SkipReason {
    fn from(rejection: KeyRejection) -> Self {
        match rejection {
            KeyRejection::DepthViolation { segments } => SkipReason::DepthViolation { segments },
            KeyRejection::NonUtf8Path => SkipReason::NonUtf8Path,
            KeyRejection::NonNormalComponent => SkipReason::NonNormalComponent,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DepthViolation { segments } => write!(
                f,
                "not expected # of directories deep ({} segments, expected {})",
                segments,
                crate::key::KEY_SEGMENTS
            ),
            SkipReason::NonUtf8Path => write!(f, "path is not valid UTF-8"),
            SkipReason::NonNormalComponent => write!(f, "path is not a plain relative path"),
            SkipReason::SymlinkedDirectory => write!(f, "symlinked directory is not followed"),
            SkipReason::BrokenSymlink => write!(f, "symlink target cannot be read"),
            SkipReason::Unreadable(reason) => write!(f, "unreadable: {}", reason),
        }
    }
}
