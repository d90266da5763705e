//! The five-method persistence protocol storage backends implement.
//!
//! Backends store opaque records and know nothing about date windows, TTLs
//! or merging; all of that lives in the cache controller. A new store only
//! has to implement these five operations.

use chrono::NaiveDateTime;
use kline_types::{Adjust, Freq, KlineError};

use crate::series::Series;

/// One raw record as a backend returns it: no TTL check, no date filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    /// Symbol the series belongs to.
    pub symbol: String,
    /// Human-readable name captured at write time.
    pub name: String,
    /// The full persisted series.
    pub series: Series,
    /// Expiry timestamp, if the writer set one.
    pub expire_at: Option<NaiveDateTime>,
}

/// Persistence protocol. All methods take `&self`; implementations guard
/// their file handle or connection with a mutex so a cache instance can be
/// shared across threads.
pub trait StorageBackend: Send + Sync {
    /// Fetch the raw record for `base_key`, or `None` when absent.
    ///
    /// # Errors
    /// `KlineError::Cache` on I/O failure.
    fn get_raw(&self, base_key: &str) -> Result<Option<StoredEntry>, KlineError>;

    /// Unconditionally overwrite the record for `base_key`. The controller
    /// guarantees `series` is the already-merged canonical series;
    /// `earliest`/`latest` are denormalized for reporting only.
    ///
    /// # Errors
    /// `KlineError::Cache` on I/O failure.
    #[allow(clippy::too_many_arguments)]
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
    ) -> Result<(), KlineError>;

    /// Delete the record for `base_key`; absent keys are not an error.
    ///
    /// # Errors
    /// `KlineError::Cache` on I/O failure.
    fn delete(&self, base_key: &str) -> Result<(), KlineError>;

    /// Delete every record.
    ///
    /// # Errors
    /// `KlineError::Cache` on I/O failure.
    fn clear(&self) -> Result<(), KlineError>;

    /// Release connections or file handles.
    ///
    /// # Errors
    /// `KlineError::Cache` on I/O failure.
    fn close(&self) -> Result<(), KlineError>;
}
