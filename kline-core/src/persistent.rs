//! Range-aware cache controller over a storage backend.
//!
//! The controller owns key parsing, TTL expiry, the date-range overlap test,
//! window filtering and merge-on-put. Backends only store and load opaque
//! records.

use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use kline_types::KlineError;
use tracing::debug;

use crate::cache::QuoteCache;
use crate::connector::QuoteSeries;
use crate::dates::{fmt_date, parse_date};
use crate::key::CacheKey;
use crate::series::Series;
use crate::storage::StorageBackend;

/// Persistent, range-aware quote cache.
pub struct PersistentCache {
    backend: Box<dyn StorageBackend>,
    ttl: Option<Duration>,
}

impl PersistentCache {
    /// Wrap a storage backend. `ttl` is the default expiry for entries
    /// written without a per-call TTL; `None` disables expiry checks.
    #[must_use]
    pub fn new(backend: Box<dyn StorageBackend>, ttl: Option<Duration>) -> Self {
        Self { backend, ttl }
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn expire_at_from(&self, ttl: Option<Duration>) -> Option<NaiveDateTime> {
        ttl.or(self.ttl)
            .and_then(|d| chrono::Duration::from_std(d).ok())
            .map(|d| Self::now() + d)
    }

    /// Resolve the base key and effective window for a `get`.
    ///
    /// An explicitly supplied window wins over dates embedded in a full-form
    /// key; `None` falls back to the key's dates.
    fn resolve_get(
        key: &str,
        sdate: Option<&str>,
        edate: Option<&str>,
    ) -> (String, String, String) {
        if CacheKey::is_base_form(key) {
            (
                key.to_string(),
                sdate.unwrap_or("").to_string(),
                edate.unwrap_or("").to_string(),
            )
        } else {
            let parsed = CacheKey::parse(key);
            let s = sdate.map_or(parsed.sdate.clone(), str::to_string);
            let e = edate.map_or(parsed.edate.clone(), str::to_string);
            (parsed.base_key(), s, e)
        }
    }

    fn get_via_backend(
        &self,
        base_key: &str,
        sdate: &str,
        edate: &str,
    ) -> Result<Option<QuoteSeries>, KlineError> {
        let Some(raw) = self.backend.get_raw(base_key)? else {
            return Ok(None);
        };

        // TTL expiry is lazy: enforced on the next read, then the row dies.
        if self.ttl.is_some()
            && raw.expire_at.is_some_and(|expire| Self::now() > expire)
        {
            debug!(%base_key, "cache entry expired");
            self.backend.delete(base_key)?;
            return Ok(None);
        }

        let (Some(cached_earliest), Some(cached_latest)) =
            (raw.series.first_date(), raw.series.last_date())
        else {
            return Ok(None);
        };

        let req_s = parse_date(sdate);
        let req_e = parse_date(edate);
        if req_e.is_some_and(|e| e < cached_earliest) {
            return Ok(None);
        }
        if req_s.is_some_and(|s| s > cached_latest) {
            return Ok(None);
        }

        let filtered = raw.series.between(req_s, req_e);
        if filtered.is_empty() {
            return Ok(None);
        }
        Ok(Some(QuoteSeries::new(raw.symbol, raw.name, filtered)))
    }

    fn merge_with_existing(
        &self,
        base_key: &str,
        value: &QuoteSeries,
    ) -> Result<(String, Series), KlineError> {
        match self.backend.get_raw(base_key)? {
            Some(existing) => {
                let name = if value.name.is_empty() {
                    existing.name
                } else {
                    value.name.clone()
                };
                let mut merged = existing.series;
                merged.merge(value.series.clone());
                Ok((name, merged))
            }
            None => Ok((value.name.clone(), value.series.clone())),
        }
    }
}

impl QuoteCache for PersistentCache {
    fn get(
        &self,
        key: &str,
        sdate: Option<&str>,
        edate: Option<&str>,
    ) -> Result<Option<QuoteSeries>, KlineError> {
        let (base_key, sdate, edate) = Self::resolve_get(key, sdate, edate);
        let result = self.get_via_backend(&base_key, &sdate, &edate)?;
        match &result {
            Some(hit) => debug!(key, %base_key, rows = hit.series.len(), "cache hit"),
            None => debug!(key, %base_key, "cache miss"),
        }
        Ok(result)
    }

    fn put(&self, key: &str, value: &QuoteSeries, ttl: Option<Duration>) -> Result<(), KlineError> {
        if value.series.is_empty() {
            debug!(key, "skipping put of empty series");
            return Ok(());
        }

        // The base key is derived from the value's symbol so writes keyed by
        // a full request key land on the same record as base-form writes.
        let (base_key, freq, fq) = if CacheKey::is_base_form(key) {
            let parsed = CacheKey::parse(key);
            (key.to_string(), parsed.freq, parsed.fq)
        } else {
            let parsed = CacheKey::parse(key);
            (
                CacheKey::base(&value.symbol, parsed.freq, parsed.fq),
                parsed.freq,
                parsed.fq,
            )
        };

        let (name, merged) = self.merge_with_existing(&base_key, value)?;
        let earliest = merged.first_date().map(fmt_date);
        let latest = merged.last_date().map(fmt_date);
        let expire_at = self.expire_at_from(ttl);
        debug!(
            %base_key,
            rows = merged.len(),
            earliest = earliest.as_deref(),
            latest = latest.as_deref(),
            "cache put"
        );
        self.backend.put(
            &base_key,
            &value.symbol,
            &name,
            &merged,
            earliest.as_deref(),
            latest.as_deref(),
            freq,
            fq,
            expire_at,
        )
    }

    fn delete(&self, key: &str) -> Result<(), KlineError> {
        let base_key = if CacheKey::is_base_form(key) {
            key.to_string()
        } else {
            CacheKey::parse(key).base_key()
        };
        self.backend.delete(&base_key)
    }

    fn clear(&self) -> Result<(), KlineError> {
        self.backend.clear()
    }

    fn close(&self) -> Result<(), KlineError> {
        self.backend.close()
    }

    fn is_range_aware(&self) -> bool {
        true
    }
}

// Keep the key grammar helpers exercised close to home; the full controller
// semantics live in `tests/cache_range.rs`.
#[cfg(test)]
mod tests {
    use super::*;
    use kline_types::{Adjust, Freq};

    #[test]
    fn resolve_prefers_supplied_window_over_key_dates() {
        let (base, s, e) = PersistentCache::resolve_get(
            "sh600000:2024-01-01:2024-02-01:day:320:qfq",
            Some("2024-01-10"),
            None,
        );
        assert_eq!(base, "sh600000:day:qfq");
        assert_eq!(s, "2024-01-10");
        assert_eq!(e, "2024-02-01");
    }

    #[test]
    fn resolve_base_form_uses_supplied_window_only() {
        let (base, s, e) =
            PersistentCache::resolve_get("sh600000:day:qfq", None, Some("2024-03-01"));
        assert_eq!(base, "sh600000:day:qfq");
        assert_eq!(s, "");
        assert_eq!(e, "2024-03-01");
    }

    #[test]
    fn freq_fq_survive_resolution() {
        let parsed = CacheKey::parse("hk00700:2024-01-01:2024-02-01:week:100:hfq");
        assert_eq!(parsed.freq, Freq::Week);
        assert_eq!(parsed.fq, Adjust::Hfq);
        assert_eq!(parsed.base_key(), "hk00700:week:hfq");
    }
}
