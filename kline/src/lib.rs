//! Kline serves per-symbol OHLCV candle histories from a time-range-aware
//! cache fronting several heterogeneous vendor endpoints.
//!
//! Overview
//! - Routes symbols by prefix convention (`sh`/`sz`, `hk`, `us`, `fu`,
//!   `BK`, `pt`, bare mainland codes) to the right vendor adapter.
//! - Serves daily requests through a persistent, range-aware cache that
//!   transparently extends the stored series forward (to today) and
//!   backward (for warm-up history), merging fragments into one canonical
//!   per-symbol series.
//! - Falls back to trivial full-key caching for intraday and non-daily
//!   cadences, and to direct fetches when caching is disabled.
//! - Probes ambiguous US codes against the `.OQ`/`.N` venue suffixes and
//!   keeps the richer series.
//!
//! Key behaviors and trade-offs
//! - Extension fetches are bounded by `ExtendConfig`; a defective vendor
//!   can cost at most `max_extend_iterations` round-trips per direction.
//! - Backward extension keeps paging until enough rows exist *before* the
//!   requested end date for downstream indicator warm-up, even when the
//!   requested start date is lax.
//! - Vendor outages degrade to warned cache hits when the stored series
//!   still overlaps the requested window.
//!
//! Basic usage: see `./examples/01_basic_price.rs`.
#![warn(missing_docs)]

mod price;
mod router;

pub use price::{Kline, KlineBuilder, PriceQuery};
pub use router::{route, us_candidates};

pub use kline_core::{
    Adjust, Bar, CacheKey, CandleSource, ExtendConfig, FetchRequest, Freq, KlineError, Market,
    MemoryCache, PersistentCache, QuoteCache, QuoteSeries, Series, StorageBackend, StoredEntry,
    get_price_auto_merge,
};
pub use kline_store::{
    BackendKind, BlobBackend, JsonlBackend, MarketShardedBackend, SqliteBackend, StatusRow,
    create_backend, create_persistent_cache, default_cache_dir,
};
pub use kline_types::{CacheSettings, HttpConfig};
pub use kline_vendors::{EastmoneyAdapter, HttpClient, SinaAdapter, TencentAdapter};

/// Fetch a price series with a one-off default [`Kline`] instance.
///
/// Library users issuing more than a handful of calls should build one
/// [`Kline`] and reuse it so the HTTP pool and cache are shared.
///
/// # Errors
/// See [`Kline::get_price`].
pub async fn get_price(symbol: &str, query: &PriceQuery) -> Result<QuoteSeries, KlineError> {
    Kline::builder().build()?.get_price(symbol, query).await
}

/// Fetch a multi-year series with a one-off default [`Kline`] instance.
///
/// # Errors
/// See [`Kline::get_price_longer`].
pub async fn get_price_longer(symbol: &str, years: u32) -> Result<QuoteSeries, KlineError> {
    Kline::builder()
        .build()?
        .get_price_longer(symbol, years, &PriceQuery::new())
        .await
}
