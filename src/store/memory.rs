use super::KeyStore;
use crate::error::Error;
use crate::key::{EntryKey, KeySet};

/// In-memory [`KeyStore`], used by tests and dry embedding.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    keys: KeySet,
    mutations: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(EntryKey::from_stored).collect(),
            mutations: 0,
        }
    }

    pub fn keys(&self) -> &KeySet {
        &self.keys
    }

    /// Number of insert/delete calls that changed the key set.
    pub fn mutation_count(&self) -> usize {
        self.mutations
    }
}

impl KeyStore for MemoryStore {
    fn fetch_keys(&mut self) -> Result<KeySet, Error> {
        Ok(self.keys.clone())
    }

    fn insert_key(&mut self, key: &EntryKey) -> Result<(), Error> {
        if self.keys.insert(key.clone()) {
            self.mutations += 1;
        }
        Ok(())
    }

    fn delete_key(&mut self, key: &EntryKey) -> Result<(), Error> {
        if self.keys.remove(key) {
            self.mutations += 1;
        }
        Ok(())
    }
}
