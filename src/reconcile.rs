use crate::error::Error;
use crate::key::{EntryKey, KeySet};
use csv::Writer;
use std::path::Path;

/// Keys to insert into and remove from the store so it mirrors the scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    /// On disk, not yet tracked.
    pub adds: KeySet,
    /// Tracked, but the backing file is gone.
    pub deletes: KeySet,
}

/// Diff the filesystem snapshot against the database snapshot.
///
/// `adds = file_keys - db_keys` and `deletes = db_keys - file_keys`. Pure and
/// linear in the size of both sets.
pub fn reconcile(file_keys: &KeySet, db_keys: &KeySet) -> UpdatePlan {
    let adds: KeySet = file_keys.difference(db_keys).cloned().collect();
    let deletes: KeySet = db_keys.difference(file_keys).cloned().collect();
    UpdatePlan { adds, deletes }
}

impl UpdatePlan {
    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.deletes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.adds.len() + self.deletes.len()
    }

    pub fn sorted_adds(&self) -> Vec<&EntryKey> {
        sorted(&self.adds)
    }

    pub fn sorted_deletes(&self) -> Vec<&EntryKey> {
        sorted(&self.deletes)
    }

    /// Write the plan as `action,key` rows, adds first, each group sorted.
    pub fn write_csv(&self, file_path: &Path) -> Result<(), Error> {
        let mut writer = Writer::from_path(file_path)?;

        writer.write_record(["action", "key"])?;
        for key in self.sorted_adds() {
            writer.write_record(["add", key.as_str()])?;
        }
        for key in self.sorted_deletes() {
            writer.write_record(["delete", key.as_str()])?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn sorted(keys: &KeySet) -> Vec<&EntryKey> {
    let mut keys: Vec<&EntryKey> = keys.iter().collect();
    keys.sort();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn key_set(keys: &[&str]) -> KeySet {
        keys.iter().map(|k| EntryKey::from_stored(*k)).collect()
    }

    #[test]
    fn test_reconcile_scenario() {
        let files = key_set(&["x/y/1.txt", "x/y/2.txt"]);
        let db = key_set(&["x/y/2.txt", "x/y/3.txt"]);

        let plan = reconcile(&files, &db);

        assert_eq!(plan.adds, key_set(&["x/y/1.txt"]));
        assert_eq!(plan.deletes, key_set(&["x/y/3.txt"]));
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_reconcile_empty_sides() {
        let files = key_set(&["a/b/c"]);
        let plan = reconcile(&files, &KeySet::new());
        assert_eq!(plan.adds, files);
        assert!(plan.deletes.is_empty());

        let plan = reconcile(&KeySet::new(), &files);
        assert!(plan.adds.is_empty());
        assert_eq!(plan.deletes, files);

        assert!(reconcile(&KeySet::new(), &KeySet::new()).is_empty());
    }

    #[test]
    fn test_sorted_views_are_ordered() {
        let plan = UpdatePlan {
            adds: key_set(&["b/b/b", "a/a/a", "c/c/c"]),
            deletes: KeySet::new(),
        };
        let adds: Vec<&str> = plan.sorted_adds().iter().map(|k| k.as_str()).collect();
        assert_eq!(adds, vec!["a/a/a", "b/b/b", "c/c/c"]);
    }

    #[test]
    fn test_write_csv() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("plan.csv");
        let plan = UpdatePlan {
            adds: key_set(&["x/y/1.txt"]),
            deletes: key_set(&["x/y/3.txt"]),
        };

        plan.write_csv(&csv_path).unwrap();

        let written = fs::read_to_string(&csv_path).unwrap();
        assert_eq!(written, "action,key\nadd,x/y/1.txt\ndelete,x/y/3.txt\n");
    }
}
