use ahash::AHashSet;
use std::fmt;
use std::path::{Component, Path};

/// Number of path components a tracked file has below the scan root.
pub const KEY_SEGMENTS: usize = 3;

/// Separator used between components in a canonical key, on every platform.
pub const KEY_SEPARATOR: char = '/';

pub type KeySet = AHashSet<EntryKey>;

/// Canonical relative-path key shared by the filesystem and the database side.
///
/// Built from a path relative to the scan root by joining its components with
/// `/`. Only paths with exactly [`KEY_SEGMENTS`] normal, UTF-8 components
/// qualify, so two distinct qualifying paths never map to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey(String);

/// Why a relative path could not be turned into an [`EntryKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRejection {
    DepthViolation { segments: usize },
    NonUtf8Path,
    NonNormalComponent,
}

impl fmt::Display for KeyRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRejection::DepthViolation { segments } => write!(
                f,
                "{} path segments, expected {}",
                segments, KEY_SEGMENTS
            ),
            KeyRejection::NonUtf8Path => write!(f, "path is not valid UTF-8"),
            KeyRejection::NonNormalComponent => {
                write!(f, "path contains a root, prefix, '.', '..' or backslash component")
            }
        }
    }
}

impl EntryKey {
    pub fn from_relative_path(rel_path: &Path) -> Result<Self, KeyRejection> {
        let mut segments: Vec<&str> = Vec::with_capacity(KEY_SEGMENTS);
        let mut non_normal = false;
        let mut non_utf8 = false;
        let mut count = 0usize;

        for component in rel_path.components() {
            count += 1;
            match component {
                Component::Normal(name) => match name.to_str() {
                    Some(name) if is_normal_segment(name) => segments.push(name),
                    Some(_) => non_normal = true,
                    None => non_utf8 = true,
                },
                _ => non_normal = true,
            }
        }

        // Depth is checked first so a misplaced file is always reported as such.
        if count != KEY_SEGMENTS {
            return Err(KeyRejection::DepthViolation { segments: count });
        }
        if non_normal {
            return Err(KeyRejection::NonNormalComponent);
        }
        if non_utf8 {
            return Err(KeyRejection::NonUtf8Path);
        }

        let mut key = String::new();
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                key.push(KEY_SEPARATOR);
            }
            key.push_str(segment);
        }
        Ok(EntryKey(key))
    }

    /// Parse a key in canonical string form (`a/b/c.ext`).
    pub fn parse(value: &str) -> Result<Self, KeyRejection> {
        let segments: Vec<&str> = value.split(KEY_SEPARATOR).collect();
        if segments.len() != KEY_SEGMENTS {
            return Err(KeyRejection::DepthViolation {
                segments: segments.len(),
            });
        }
        if !segments.iter().all(|s| is_normal_segment(s)) {
            return Err(KeyRejection::NonNormalComponent);
        }
        Ok(EntryKey(value.to_string()))
    }

    /// Wrap a value read back from a store without validating it.
    ///
    /// A stored value that is not canonical never equals a scanned key, so
    /// reconciliation schedules it for deletion.
    pub fn from_stored(value: impl Into<String>) -> Self {
        EntryKey(value.into())
    }

    pub fn is_canonical(&self) -> bool {
        EntryKey::parse(&self.0).is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single key component. Backslashes are rejected on every platform so
/// the scanned and stored forms agree.
fn is_normal_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('\\')
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_three_segments_accepted() {
        let key = EntryKey::from_relative_path(Path::new("a/b/c.txt")).unwrap();
        assert_eq!(key.as_str(), "a/b/c.txt");
        assert!(key.is_canonical());
    }

    #[test]
    fn test_key_joined_with_forward_slash() {
        let rel: PathBuf = ["x", "y", "1.txt"].iter().collect();
        let key = EntryKey::from_relative_path(&rel).unwrap();
        assert_eq!(key.as_str(), "x/y/1.txt");
    }

    #[test]
    fn test_wrong_depth_rejected() {
        assert_eq!(
            EntryKey::from_relative_path(Path::new("a/b.txt")),
            Err(KeyRejection::DepthViolation { segments: 2 })
        );
        assert_eq!(
            EntryKey::from_relative_path(Path::new("b.txt")),
            Err(KeyRejection::DepthViolation { segments: 1 })
        );
        assert_eq!(
            EntryKey::from_relative_path(Path::new("a/b/c/d.txt")),
            Err(KeyRejection::DepthViolation { segments: 4 })
        );
    }

    #[test]
    fn test_parent_component_rejected() {
        assert_eq!(
            EntryKey::from_relative_path(Path::new("a/../c.txt")),
            Err(KeyRejection::NonNormalComponent)
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_backslash_in_file_name_rejected() {
        let rel = Path::new("a/b/back\\slash.txt");
        assert_eq!(
            EntryKey::from_relative_path(rel),
            Err(KeyRejection::NonNormalComponent)
        );
        assert_eq!(
            EntryKey::parse("a/b/back\\slash.txt"),
            Err(KeyRejection::NonNormalComponent)
        );
    }

    #[test]
    fn test_parse_matches_scanned_form() {
        let scanned = EntryKey::from_relative_path(Path::new("x/y/2.txt")).unwrap();
        let parsed = EntryKey::parse("x/y/2.txt").unwrap();
        assert_eq!(scanned, parsed);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(EntryKey::parse("x/y").is_err());
        assert!(EntryKey::parse("x//2.txt").is_err());
        assert!(EntryKey::parse("x/../2.txt").is_err());
        assert!(EntryKey::parse("x\\y\\z/2.txt").is_err());
    }

    #[test]
    fn test_stored_non_canonical_kept_verbatim() {
        let key = EntryKey::from_stored("x\\y\\2.txt");
        assert_eq!(key.as_str(), "x\\y\\2.txt");
        assert!(!key.is_canonical());
    }
}
