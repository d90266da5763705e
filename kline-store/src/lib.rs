//! kline-store
//!
//! Concrete storage backends for the kline quote cache, all speaking the
//! five-method protocol from `kline_core::storage`:
//!
//! - [`SqliteBackend`]: one row per base key in a `cache_data` table.
//! - [`JsonlBackend`]: one JSON object per line, rewritten whole on write.
//! - [`BlobBackend`]: a single JSON file holding the whole entry map.
//! - [`MarketShardedBackend`]: four JSONL shards keyed by market.
//!
//! [`create_persistent_cache`] wires a backend into the range-aware cache
//! controller with default paths under `~/.kline`.
#![warn(missing_docs)]

mod blob;
mod jsonl;
mod record;
mod sharded;
mod sqlite;

use std::path::PathBuf;
use std::time::Duration;

use kline_core::PersistentCache;
use kline_core::storage::StorageBackend;
use kline_types::KlineError;

pub use blob::BlobBackend;
pub use jsonl::JsonlBackend;
pub use sharded::{MarketShardedBackend, StatusRow};
pub use sqlite::SqliteBackend;

/// Which concrete backend a factory call builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackendKind {
    /// Relational table in a SQLite file.
    Sqlite,
    /// Line-delimited JSON log.
    Jsonl,
    /// Single serialized-map file.
    Blob,
    /// Four JSONL files sharded by market.
    Sharded,
}

/// The dotted cache directory in the user's home, created on demand.
///
/// # Errors
/// `KlineError::Cache` when the home directory cannot be resolved or the
/// directory cannot be created.
pub fn default_cache_dir() -> Result<PathBuf, KlineError> {
    let home = dirs::home_dir().ok_or_else(|| KlineError::cache("cannot resolve home directory"))?;
    let dir = home.join(".kline");
    std::fs::create_dir_all(&dir)
        .map_err(|e| KlineError::cache(format!("cannot create {}: {e}", dir.display())))?;
    Ok(dir)
}

/// Build a backend of the given kind. `path` defaults to
/// `~/.kline/cache.{db,jsonl,bin}`; for [`BackendKind::Sharded`] it is the
/// shard directory instead of a file.
///
/// # Errors
/// `KlineError::Cache` when the store cannot be opened or created.
pub fn create_backend(
    kind: BackendKind,
    path: Option<PathBuf>,
) -> Result<Box<dyn StorageBackend>, KlineError> {
    fn resolve(path: Option<PathBuf>, file: &str) -> Result<PathBuf, KlineError> {
        match path {
            Some(p) => Ok(p),
            None => Ok(default_cache_dir()?.join(file)),
        }
    }
    Ok(match kind {
        BackendKind::Sqlite => Box::new(SqliteBackend::open(resolve(path, "cache.db")?)?),
        BackendKind::Jsonl => Box::new(JsonlBackend::open(resolve(path, "cache.jsonl")?)?),
        BackendKind::Blob => Box::new(BlobBackend::open(resolve(path, "cache.bin")?)?),
        BackendKind::Sharded => {
            let dir = match path {
                Some(p) => p,
                None => default_cache_dir()?,
            };
            Box::new(MarketShardedBackend::open_in_dir(dir)?)
        }
    })
}

/// Factory: a ready-to-use persistent cache over the chosen backend.
///
/// # Errors
/// `KlineError::Cache` when the store cannot be opened or created.
pub fn create_persistent_cache(
    kind: BackendKind,
    path: Option<PathBuf>,
    ttl: Option<Duration>,
) -> Result<PersistentCache, KlineError> {
    Ok(PersistentCache::new(create_backend(kind, path)?, ttl))
}
