pub mod memory;
pub mod models;
pub mod pg;
pub mod schema;

use crate::error::Error;
use crate::key::{EntryKey, KeySet};

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Backing store holding one record per tracked key.
///
/// `insert_key` and `delete_key` must be idempotent: inserting a present key
/// or deleting an absent one succeeds without changing anything.
pub trait KeyStore: Send {
    fn fetch_keys(&mut self) -> Result<KeySet, Error>;
    fn insert_key(&mut self, key: &EntryKey) -> Result<(), Error>;
    fn delete_key(&mut self, key: &EntryKey) -> Result<(), Error>;
}
