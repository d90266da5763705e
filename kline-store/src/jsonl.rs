//! Line-delimited JSON storage backend.

use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDateTime;
use kline_core::series::Series;
use kline_core::storage::{StorageBackend, StoredEntry};
use kline_types::{Adjust, Freq, KlineError};
use tracing::warn;

use crate::record::Record;

/// One JSON object per line. The whole file is rewritten from the in-memory
/// map on every write; loads scan the file once on open. Malformed lines
/// are skipped so a torn write never poisons the rest of the log.
pub struct JsonlBackend {
    path: PathBuf,
    rows: Mutex<BTreeMap<String, Record>>,
}

impl JsonlBackend {
    /// Open the log at `path`. A missing file is an empty store; it is
    /// created on the first write.
    ///
    /// # Errors
    /// `KlineError::Cache` when an existing file cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KlineError> {
        let path = path.as_ref().to_path_buf();
        let mut rows = BTreeMap::new();
        if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| KlineError::cache(format!("cannot read {}: {e}", path.display())))?;
            for line in text.lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Record>(line) {
                    Ok(record) => {
                        rows.insert(record.cache_key.clone(), record);
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "skipping malformed line"),
                }
            }
        }
        Ok(Self {
            path,
            rows: Mutex::new(rows),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Record>>, KlineError> {
        self.rows
            .lock()
            .map_err(|_| KlineError::cache("jsonl store lock poisoned"))
    }

    fn save(&self, rows: &BTreeMap<String, Record>) -> Result<(), KlineError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| KlineError::cache(format!("cannot create {}: {e}", parent.display())))?;
            }
        }
        let mut out = Vec::new();
        for record in rows.values() {
            serde_json::to_writer(&mut out, record)
                .map_err(|e| KlineError::cache(format!("cannot encode record: {e}")))?;
            out.write_all(b"\n")
                .map_err(|e| KlineError::cache(e.to_string()))?;
        }
        std::fs::write(&self.path, out)
            .map_err(|e| KlineError::cache(format!("cannot write {}: {e}", self.path.display())))
    }

    /// Current records, for the sharded backend's status reporting.
    pub(crate) fn snapshot(&self) -> Result<Vec<Record>, KlineError> {
        Ok(self.lock()?.values().cloned().collect())
    }
}

impl StorageBackend for JsonlBackend {
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
