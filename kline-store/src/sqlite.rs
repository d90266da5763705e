//! SQLite storage backend.

use std::path::Path;
use std::sync::Mutex;

use chrono::NaiveDateTime;
use kline_core::dates::parse_date;
use kline_core::series::Series;
use kline_core::storage::{StorageBackend, StoredEntry};
use kline_types::{Adjust, Freq, KlineError};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::warn;

use crate::record::{decode_series, encode_series, fmt_ts, now_ts};

fn db_err(e: rusqlite::Error) -> KlineError {
    KlineError::cache(e.to_string())
}

/// One row per base key in a `cache_data` table. The serialized series is
/// an opaque `BLOB` column; everything else is reporting metadata.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Open (or create) the database at `path`, creating parent directories
    /// and the schema as needed.
    ///
    /// # Errors
    /// `KlineError::Cache` when the file cannot be opened or the schema
    /// cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KlineError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| KlineError::cache(format!("cannot create {}: {e}", parent.display())))?;
            }
        }
        let conn = Connection::open(path).map_err(db_err)?;
        let backend = Self {
            conn: Mutex::new(conn),
        };
        backend.init_schema()?;
        Ok(backend)
    }

    /// In-memory database; data dies with the backend. Useful for tests.
    ///
    /// # Errors
    /// `KlineError::Cache` when schema creation fails.
    pub fn in_memory() -> Result<Self, KlineError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        let backend = Self {
            conn: Mutex::new(conn),
        };
        backend.init_schema()?;
        Ok(backend)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, KlineError> {
        self.conn
            .lock()
            .map_err(|_| KlineError::cache("sqlite connection lock poisoned"))
    }

    fn init_schema(&self) -> Result<(), KlineError> {
        let conn = self.lock()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS cache_data (
                cache_key TEXT PRIMARY KEY,
                symbol TEXT NOT NULL,
                name TEXT,
                data BLOB,
                earliest_date TEXT,
                latest_date TEXT,
                freq TEXT,
                fq TEXT,
                updated_at TEXT,
                expire_at TEXT
            )",
            [],
        )
        .map_err(db_err)?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_symbol_freq_fq ON cache_data(symbol, freq, fq)",
            [],
        )
        .map_err(db_err)?;
        Ok(())
    }
}

impl StorageBackend for SqliteBackend {
    fn get_raw(&self, base_key: &str) -> Result<Option<StoredEntry>, KlineError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT symbol, name, data, expire_at FROM cache_data WHERE cache_key = ?1",
                params![base_key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(db_err)?;

        let Some((symbol, name, blob, expire_at)) = row else {
            return Ok(None);
        };
        let series = match decode_series(&blob) {
            Ok(s) => s,
            Err(e) => {
                warn!(base_key, error = %e, "undecodable series blob");
                return Ok(None);
            }
        };
        Ok(Some(StoredEntry {
            symbol,
            name: name.unwrap_or_default(),
            series,
            expire_at: expire_at.as_deref().and_then(parse_date),
        }))
    }

    fn put(
        &self,
        base_key: &str,
        symbol: &str,
        name: &str,
        series: &Series,
        earliest: Option<&str>,
        latest: Option<&str>,
        freq: Freq,
        fq: Adjust,
        expire_at: Option<NaiveDateTime>,
    ) -> Result<(), KlineError> {
        let blob = encode_series(series)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO cache_data
             (cache_key, symbol, name, data, earliest_date, latest_date, freq, fq, updated_at, expire_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                base_key,
                symbol,
                name,
                blob,
                earliest,
                latest,
                freq.as_str(),
                fq.as_str(),
                now_ts(),
                expire_at.map(fmt_ts),
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn delete(&self, base_key: &str) -> Result<(), KlineError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM cache_data WHERE cache_key = ?1", params![base_key])
            .map_err(db_err)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), KlineError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM cache_data", []).map_err(db_err)?;
        Ok(())
    }

    fn close(&self) -> Result<(), KlineError> {
        // rusqlite closes the connection on drop; flushing is enough here.
        let conn = self.lock()?;
        conn.execute_batch("PRAGMA optimize").map_err(db_err)?;
        Ok(())
    }
}
