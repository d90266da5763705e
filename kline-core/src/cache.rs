//! The `QuoteCache` trait and the trivial in-memory cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use kline_types::KlineError;
use moka::Expiry;
use moka::sync::Cache;

use crate::connector::QuoteSeries;

/// A quote cache as the facade consumes it.
///
/// Range-aware implementations (the persistent controller) interpret `key`
/// per the base/full key grammar and filter by the `[sdate, edate]` window;
/// trivial implementations treat `key` as opaque and ignore the window.
pub trait QuoteCache: Send + Sync {
    /// Look up `key`, optionally constrained to a date window. `None` means
    /// "take the window from the key if it carries one"; an explicit empty
    /// string is an open bound.
    ///
    /// # Errors
    /// `KlineError::Cache` on backend I/O failure.
    fn get(
        &self,
        key: &str,
        sdate: Option<&str>,
        edate: Option<&str>,
    ) -> Result<Option<QuoteSeries>, KlineError>;

    /// Store `value` under `key`, with an optional per-entry TTL override.
    ///
    /// # Errors
    /// `KlineError::Cache` on backend I/O failure.
    fn put(&self, key: &str, value: &QuoteSeries, ttl: Option<Duration>) -> Result<(), KlineError>;

    /// Remove `key`.
    ///
    /// # Errors
    /// `KlineError::Cache` on backend I/O failure.
    fn delete(&self, key: &str) -> Result<(), KlineError>;

    /// Remove everything.
    ///
    /// # Errors
    /// `KlineError::Cache` on backend I/O failure.
    fn clear(&self) -> Result<(), KlineError>;

    /// Release backend resources.
    ///
    /// # Errors
    /// `KlineError::Cache` on backend I/O failure.
    fn close(&self) -> Result<(), KlineError>;

    /// Whether this cache understands date windows and merge-on-put. Drives
    /// the facade's choice between the extension orchestrator and plain
    /// full-key caching.
    fn is_range_aware(&self) -> bool {
        false
    }
}

type Stored = (Arc<QuoteSeries>, Option<Duration>);

struct PerEntryTtl {
    default_ttl: Duration,
}

impl Expiry<String, Stored> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Stored,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.1.unwrap_or(self.default_ttl))
    }
}

/// Trivial full-key TTL cache. Used for intraday and non-daily requests
/// where range extension would buy nothing.
pub struct MemoryCache {
    inner: Cache<String, Stored>,
}

impl MemoryCache {
    /// Cache with the given default TTL and an unbounded entry count.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .expire_after(PerEntryTtl { default_ttl: ttl })
                .build(),
        }
    }

    /// Number of live entries (approximate until pending maintenance runs).
    #[must_use]
    pub fn size(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

impl QuoteCache for MemoryCache {
    fn get(
        &self,
        key: &str,
        _sdate: Option<&str>,
        _edate: Option<&str>,
    ) -> Result<Option<QuoteSeries>, KlineError> {
        Ok(self.inner.get(key).map(|(v, _)| (*v).clone()))
    }

    fn put(&self, key: &str, value: &QuoteSeries, ttl: Option<Duration>) -> Result<(), KlineError> {
        self.inner
            .insert(key.to_string(), (Arc::new(value.clone()), ttl));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KlineError> {
        self.inner.invalidate(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), KlineError> {
        self.inner.invalidate_all();
        Ok(())
    }

    fn close(&self) -> Result<(), KlineError> {
        Ok(())
    }
}
