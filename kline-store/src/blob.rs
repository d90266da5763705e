//! Single-file storage backend: one serialized map.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDateTime;
use kline_core::series::Series;
use kline_core::storage::{StorageBackend, StoredEntry};
use kline_types::{Adjust, Freq, KlineError};
use tracing::warn;

use crate::record::Record;

/// One file holding the whole `base_key → entry` map as JSON, written as a
/// whole on every mutation. An unreadable file degrades to an empty store
/// instead of failing open.
pub struct BlobBackend {
    path: PathBuf,
    rows: Mutex<BTreeMap<String, Record>>,
}

impl BlobBackend {
    /// Open the map file at `path`; missing files mean an empty store.
    ///
    /// # Errors
    /// `KlineError::Cache` when an existing file cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KlineError> {
        let path = path.as_ref().to_path_buf();
        let rows = if path.exists() {
            let bytes = std::fs::read(&path)
                .map_err(|e| KlineError::cache(format!("cannot read {}: {e}", path.display())))?;
            match serde_json::from_slice(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "unreadable map file, starting empty");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            rows: Mutex::new(rows),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Record>>, KlineError> {
        self.rows
            .lock()
            .map_err(|_| KlineError::cache("blob store lock poisoned"))
    }

    fn save(&self, rows: &BTreeMap<String, Record>) -> Result<(), KlineError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| KlineError::cache(format!("cannot create {}: {e}", parent.display())))?;
            }
        }
        let bytes = serde_json::to_vec(rows)
            .map_err(|e| KlineError::cache(format!("cannot encode map: {e}")))?;
        std::fs::write(&self.path, bytes)
            .map_err(|e| KlineError::cache(format!("cannot write {}: {e}", self.path.display())))
    }
}

impl StorageBackend for BlobBackend {
    fn get_raw(&self, base_key: &str) -> Result<Option<StoredEntry>, KlineError> {
        Ok(self.lock()?.get(base_key).and_then(Record::to_entry))
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
        let record = Record::build(
            base_key, symbol, name, series, earliest, latest, freq, fq, expire_at,
        )?;
        let mut rows = self.lock()?;
        rows.insert(base_key.to_string(), record);
        self.save(&rows)
    }

    fn delete(&self, base_key: &str) -> Result<(), KlineError> {
        let mut rows = self.lock()?;
        if rows.remove(base_key).is_some() {
            self.save(&rows)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), KlineError> {
        let mut rows = self.lock()?;
        rows.clear();
        self.save(&rows)
    }

    fn close(&self) -> Result<(), KlineError> {
        Ok(())
    }
}
