//! Market-sharded JSONL storage backend.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use kline_core::series::Series;
use kline_core::storage::{StorageBackend, StoredEntry};
use kline_types::{Adjust, Freq, KlineError};

use crate::jsonl::JsonlBackend;

/// Shard names, in reporting order.
const MARKETS: [&str; 4] = ["cn", "hk", "us", "fu"];

/// Symbols no routing rule claims land here.
const FALLBACK_MARKET: &str = "cn";

/// Signature of a symbol-to-shard routing function.
pub type RouteFn = dyn Fn(&str) -> String + Send + Sync;

/// One line of the sharded backend's status report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    /// Shard the entry lives in.
    pub market: String,
    /// Symbol of the entry.
    pub symbol: String,
    /// Denormalized earliest date, as stored.
    pub earliest_date: Option<String>,
    /// Denormalized latest date, as stored.
    pub latest_date: Option<String>,
    /// Stored row count, `-1` when the series blob fails to decode.
    pub rows: i64,
}

fn default_route(symbol: &str) -> String {
    let s = symbol.to_ascii_lowercase();
    for market in ["us", "hk", "fu"] {
        if s.starts_with(market) {
            return market.to_string();
        }
    }
    FALLBACK_MARKET.to_string()
}

/// Routes each entry to one of four JSONL shards (`cn`, `hk`, `us`, `fu`)
/// keyed by symbol prefix. The routing function is overridable; anything it
/// maps to an unknown shard falls back to `cn`.
pub struct MarketShardedBackend {
    shards: BTreeMap<String, JsonlBackend>,
    route: Box<RouteFn>,
}

impl MarketShardedBackend {
    /// Open shards as `cache_{market}.jsonl` inside `dir`.
    ///
    /// # Errors
    /// `KlineError::Cache` when an existing shard file cannot be read.
    pub fn open_in_dir(dir: impl AsRef<Path>) -> Result<Self, KlineError> {
        let dir = dir.as_ref();
        let mut paths = BTreeMap::new();
        for market in MARKETS {
            paths.insert(market.to_string(), dir.join(format!("cache_{market}.jsonl")));
        }
        Self::open_with_paths(paths)
    }

    /// Open shards at explicit per-market paths. Markets beyond the default
    /// four are allowed; the routing function decides what lands where.
    ///
    /// # Errors
    /// `KlineError::Cache` when an existing shard file cannot be read.
    pub fn open_with_paths(paths: BTreeMap<String, PathBuf>) -> Result<Self, KlineError> {
        let mut shards = BTreeMap::new();
        for (market, path) in paths {
            shards.insert(market, JsonlBackend::open(path)?);
        }
        if !shards.contains_key(FALLBACK_MARKET) {
            return Err(KlineError::cache(format!(
                "sharded store needs a {FALLBACK_MARKET} shard for fallback routing"
            )));
        }
        Ok(Self {
            shards,
            route: Box::new(default_route),
        })
    }

    /// Replace the symbol-to-shard routing function.
    #[must_use]
    pub fn with_route(mut self, route: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.route = Box::new(route);
        self
    }

    fn symbol_of(base_key: &str) -> &str {
        base_key.split(':').next().unwrap_or_default()
    }

    fn shard_for(&self, symbol: &str) -> Result<&JsonlBackend, KlineError> {
        let market = (self.route)(symbol);
        self.shards
            .get(&market)
            .or_else(|| self.shards.get(FALLBACK_MARKET))
            .ok_or_else(|| KlineError::cache("fallback shard missing"))
    }

    /// Report every stored entry, optionally restricted to `symbols`,
    /// sorted by symbol.
    ///
    /// # Errors
    /// `KlineError::Cache` on lock failure.
    pub fn status_rows(&self, symbols: Option<&[String]>) -> Result<Vec<StatusRow>, KlineError> {
        let mut rows = Vec::new();
        for (market, shard) in &self.shards {
            for record in shard.snapshot()? {
                if record.symbol.is_empty() {
                    continue;
                }
                if let Some(wanted) = symbols {
                    if !wanted.contains(&record.symbol) {
                        continue;
                    }
                }
                rows.push(StatusRow {
                    market: market.clone(),
                    symbol: record.symbol.clone(),
                    earliest_date: record.earliest_date.clone(),
                    latest_date: record.latest_date.clone(),
                    rows: record.row_count(),
                });
            }
        }
        rows.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(rows)
    }
}

impl StorageBackend for MarketShardedBackend {
    fn get_raw(&self, base_key: &str) -> Result<Option<StoredEntry>, KlineError> {
        self.shard_for(Self::symbol_of(base_key))?.get_raw(base_key)
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
        self.shard_for(symbol)?.put(
            base_key, symbol, name, series, earliest, latest, freq, fq, expire_at,
        )
    }

    fn delete(&self, base_key: &str) -> Result<(), KlineError> {
        self.shard_for(Self::symbol_of(base_key))?.delete(base_key)
    }

    fn clear(&self) -> Result<(), KlineError> {
        for shard in self.shards.values() {
            shard.clear()?;
        }
        Ok(())
    }

    fn close(&self) -> Result<(), KlineError> {
        for shard in self.shards.values() {
            shard.close()?;
        }
        Ok(())
    }
}
