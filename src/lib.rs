pub mod config;
pub mod engine;
pub mod error;
pub mod key;
pub mod progress;
pub mod reconcile;
pub mod scanner;
pub mod store;
pub mod updater;

pub use config::AppConfig;
pub use engine::{Planned, SyncEngine, SyncPhase, SyncResult};
pub use error::Error;
pub use key::{EntryKey, KeySet};
pub use progress::{SilentReporter, SyncReporter};
pub use reconcile::{reconcile, UpdatePlan};
pub use store::{KeyStore, MemoryStore, PgStore};
pub use updater::{SyncMode, UpdateOutcome};
