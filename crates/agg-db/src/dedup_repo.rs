use crate::schema::{self, Durability};
use agg_core::error::StoreError;
use agg_core::store::DedupStore;
use agg_events::types::IdentityKey;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// SQLite-backed dedup store.
///
/// Admission is a single `INSERT OR IGNORE`; the changed-row count tells a
/// new key from an existing one, so engine errors are never mistaken for
/// duplicates. SQLite serializes writers, which keeps the test-and-insert
/// atomic even between separate connections to the same file.
pub struct SqliteDedupStore {
    conn: Mutex<Connection>,
}

impl SqliteDedupStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: impl AsRef<Path>, durability: Durability) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = schema::open_and_migrate(path, durability).map_err(to_store_error)?;
        debug!(path = %path.display(), ?durability, "dedup store opened");
        Ok(Self::new(conn))
    }
}

impl DedupStore for SqliteDedupStore {
    fn admit_if_new(&self, key: &IdentityKey) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO dedup_keys (topic, event_id, admitted_at) VALUES (?1, ?2, ?3)",
                params![key.topic, key.event_id, Utc::now().to_rfc3339()],
            )
            .map_err(to_store_error)?;
        Ok(inserted == 1)
    }

    fn len(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM dedup_keys", [], |row| row.get(0))
            .map_err(to_store_error)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

fn to_store_error(err: rusqlite::Error) -> StoreError {
    StoreError::unavailable(err.to_string())
}
