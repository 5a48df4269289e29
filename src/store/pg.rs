use super::models::{NewTrackedFile, TrackedFile};
use super::schema::tracked_file;
use super::KeyStore;
use crate::error::Error;
use crate::key::{EntryKey, KeySet};
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use std::time::Instant;
use tracing::debug;

/// PostgreSQL-backed [`KeyStore`] over the `tracked_file` table.
pub struct PgStore {
    connection: PgConnection,
}

impl PgStore {
    /// Connect using a libpq connection string or a `postgres://` URL.
    pub fn connect(target: &str) -> Result<Self, Error> {
        let connection = PgConnection::establish(target)?;
        Ok(Self { connection })
    }
}

impl KeyStore for PgStore {
    fn fetch_keys(&mut self) -> Result<KeySet, Error> {
        let load_start = Instant::now();
        let rows = tracked_file::table
            .select(TrackedFile::as_select())
            .load::<TrackedFile>(&mut self.connection)?;
        debug!(
            "Loaded {} tracked_file rows in {} ms",
            rows.len(),
            load_start.elapsed().as_millis()
        );

        Ok(rows
            .into_iter()
            .map(|row| EntryKey::from_stored(row.rel_path))
            .collect())
    }

    fn insert_key(&mut self, key: &EntryKey) -> Result<(), Error> {
        let row = NewTrackedFile {
            rel_path: key.as_str(),
            first_seen: Utc::now().naive_utc(),
        };
        let inserted = diesel::insert_into(tracked_file::table)
            .values(&row)
            .on_conflict(tracked_file::rel_path)
            .do_nothing()
            .execute(&mut self.connection)?;
        if inserted == 0 {
            debug!("{} already tracked", key);
        }
        Ok(())
    }

    fn delete_key(&mut self, key: &EntryKey) -> Result<(), Error> {
        let deleted = diesel::delete(
            tracked_file::table.filter(tracked_file::rel_path.eq(key.as_str())),
        )
        .execute(&mut self.connection)?;
        if deleted == 0 {
            debug!("{} was not tracked", key);
        }
        Ok(())
    }
}
