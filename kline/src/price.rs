//! The public query facade: builder, `get_price`, `get_price_longer`.

use std::sync::Arc;

use chrono::Months;
use kline_core::cache::QuoteCache;
use kline_core::connector::{CandleSource, FetchRequest, QuoteSeries};
use kline_core::dates::{fmt_date, normalize_date};
use kline_core::extend::{ExtendConfig, get_price_auto_merge};
use kline_core::key::CacheKey;
use kline_core::{MemoryCache, PersistentCache};
use kline_types::{Adjust, CacheSettings, Freq, HttpConfig, KlineError, Market};
use kline_vendors::{EastmoneyAdapter, HttpClient, SinaAdapter, TencentAdapter};
use tracing::debug;

use crate::router::{route, us_candidates};

/// Query parameters for one price request. `days` is the vendor-side bar
/// count fall-through default; it does not derive dates locally.
#[derive(Debug, Clone)]
pub struct PriceQuery {
    /// Start date, any accepted layout, or empty for an open start.
    pub sdate: String,
    /// End date, any accepted layout, or empty for an open end.
    pub edate: String,
    /// Candle frequency.
    pub freq: Freq,
    /// Vendor bar-count fall-through default.
    pub days: u32,
    /// Adjustment mode.
    pub fq: Adjust,
}

impl Default for PriceQuery {
    fn default() -> Self {
        Self {
            sdate: String::new(),
            edate: String::new(),
            freq: Freq::Day,
            days: 320,
            fq: Adjust::Qfq,
        }
    }
}

impl PriceQuery {
    /// Daily forward-adjusted query over the vendor default window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the start date.
    #[must_use]
    pub fn sdate(mut self, sdate: impl Into<String>) -> Self {
        self.sdate = sdate.into();
        self
    }

    /// Set the end date.
    #[must_use]
    pub fn edate(mut self, edate: impl Into<String>) -> Self {
        self.edate = edate.into();
        self
    }

    /// Set the frequency.
    #[must_use]
    pub const fn freq(mut self, freq: Freq) -> Self {
        self.freq = freq;
        self
    }

    /// Set the vendor bar-count default.
    #[must_use]
    pub const fn days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    /// Set the adjustment mode.
    #[must_use]
    pub const fn fq(mut self, fq: Adjust) -> Self {
        self.fq = fq;
        self
    }
}

/// Builder for a [`Kline`] facade.
pub struct KlineBuilder {
    http: HttpConfig,
    cache: Option<Arc<dyn QuoteCache>>,
    cache_settings: CacheSettings,
    extend: ExtendConfig,
    stock_source: Option<Arc<dyn CandleSource>>,
    future_source: Option<Arc<dyn CandleSource>>,
    board_source: Option<Arc<dyn CandleSource>>,
}

impl Default for KlineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl KlineBuilder {
    /// Builder with environment-adjusted defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: HttpConfig::from_env(),
            cache: None,
            cache_settings: CacheSettings::from_env(),
            extend: ExtendConfig::default(),
            stock_source: None,
            future_source: None,
            board_source: None,
        }
    }

    /// Override the HTTP defaults.
    #[must_use]
    pub fn http(mut self, cfg: HttpConfig) -> Self {
        self.http = cfg;
        self
    }

    /// Use the given cache. [`PersistentCache`] unlocks range extension for
    /// daily requests; any other [`QuoteCache`] caches whole responses by
    /// full key.
    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn QuoteCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Convenience: use a persistent cache directly.
    #[must_use]
    pub fn persistent_cache(mut self, cache: PersistentCache) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Disable caching entirely; every call hits the vendor.
    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self.cache_settings.enabled = false;
        self
    }

    /// Tune the extension orchestrator.
    #[must_use]
    pub const fn extend(mut self, cfg: ExtendConfig) -> Self {
        self.extend = cfg;
        self
    }

    /// Replace the stock-market source (mainland/HK/US/plate requests).
    #[must_use]
    pub fn stock_source(mut self, source: Arc<dyn CandleSource>) -> Self {
        self.stock_source = Some(source);
        self
    }

    /// Replace the futures source (`fu…` requests, BTC included).
    #[must_use]
    pub fn future_source(mut self, source: Arc<dyn CandleSource>) -> Self {
        self.future_source = Some(source);
        self
    }

    /// Replace the board source (`BK…` requests).
    #[must_use]
    pub fn board_source(mut self, source: Arc<dyn CandleSource>) -> Self {
        self.board_source = Some(source);
        self
    }

    /// Build the facade. Adapters not overridden are constructed against
    /// the production endpoints over one shared HTTP client; with caching
    /// enabled and no cache supplied, a [`MemoryCache`] is created.
    ///
    /// # Errors
    /// `KlineError::Network` when the HTTP client cannot be initialized.
    pub fn build(self) -> Result<Kline, KlineError> {
        let http = Arc::new(HttpClient::new(&self.http)?);
        let stock = self
            .stock_source
            .unwrap_or_else(|| Arc::new(TencentAdapter::new(http.clone())));
        let future = self
            .future_source
            .unwrap_or_else(|| Arc::new(SinaAdapter::new(http.clone())));
        let board = self
            .board_source
            .unwrap_or_else(|| Arc::new(EastmoneyAdapter::new(http.clone())));
        let cache = match self.cache {
            Some(cache) => Some(cache),
            None if self.cache_settings.enabled => Some(Arc::new(MemoryCache::new(
                self.cache_settings.ttl,
            )) as Arc<dyn QuoteCache>),
            None => None,
        };
        Ok(Kline {
            cache,
            extend: self.extend,
            stock,
            future,
            board,
        })
    }
}

/// The query facade: routing, cache wiring and the public `get_price` /
/// `get_price_longer` operations.
pub struct Kline {
    cache: Option<Arc<dyn QuoteCache>>,
    extend: ExtendConfig,
    stock: Arc<dyn CandleSource>,
    future: Arc<dyn CandleSource>,
    board: Arc<dyn CandleSource>,
}

impl Kline {
    /// Start building a facade.
    #[must_use]
    pub fn builder() -> KlineBuilder {
        KlineBuilder::new()
    }

    /// Fetch the candle series for `symbol` over the query window.
    ///
    /// Dates accept `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYYMMDD`, `YYYY.MM.DD`
    /// and `YYYY_MM_DD`. Daily requests against a persistent cache go
    /// through the extension orchestrator; other cadences use plain
    /// full-key caching, and intraday data never persists.
    ///
    /// # Errors
    /// `Symbol` for bad dates or unsupported prefixes; `Network`,
    /// `DataSource`, `Parse` and `Cache` per the component that failed.
    /// Board and BTC-minute requests soft-fail to an empty series instead.
    pub async fn get_price(
        &self,
        symbol: &str,
        query: &PriceQuery,
    ) -> Result<QuoteSeries, KlineError> {
        let sdate = normalize_date(&query.sdate)?;
        let edate = normalize_date(&query.edate)?;
        let (market, normalized) = route(symbol)?;
        debug!(symbol, %normalized, ?market, "price query");

        let req = FetchRequest {
            symbol: normalized,
            sdate,
            edate,
            freq: query.freq,
            days: query.days,
            fq: query.fq,
        };
        match market {
            Market::Board => self.board.fetch_candles(&req).await,
            Market::Plate => self.fetch_plate(&req).await,
            // The BTC endpoint ignores date windows, so extension fetches
            // would never advance it; cache whole responses instead.
            Market::Btc => self.fetch_trivial(&self.future, &req).await,
            Market::Future => self.fetch_cached(&self.future, &req).await,
            Market::Mainland | Market::HongKong => self.fetch_cached(&self.stock, &req).await,
            Market::Us => self.fetch_us(&req).await,
            _ => unreachable!("Market has no variants beyond the ones matched above"),
        }
    }

    /// Fetch roughly `years` years of history by walking backward one year
    /// at a time from the earliest date of the previous segment, merging
    /// segments with dedup-by-date.
    ///
    /// # Errors
    /// As [`Kline::get_price`].
    pub async fn get_price_longer(
        &self,
        symbol: &str,
        years: u32,
        query: &PriceQuery,
    ) -> Result<QuoteSeries, KlineError> {
        let first = self.get_price(symbol, query).await?;
        let mut acc = first.series.clone();
        let Some(mut upper) = acc.first_date() else {
            return Ok(first);
        };
        for _ in 1..years.max(1) {
            let Some(lower) = upper.checked_sub_months(Months::new(12)) else {
                break;
            };
            let window = query
                .clone()
                .sdate(fmt_date(lower))
                .edate(fmt_date(upper));
            let segment = self.get_price(symbol, &window).await?;
            if segment.series.is_empty() {
                break;
            }
            // Rows already accumulated win over the older segment's copies.
            let mut merged = segment.series;
            merged.merge(acc);
            acc = merged;
            upper = lower;
        }
        Ok(QuoteSeries::new(first.symbol, first.name, acc))
    }

    /// Plate codes cache under their base key with the window passed
    /// alongside; there is no extension loop for them.
    async fn fetch_plate(&self, req: &FetchRequest) -> Result<QuoteSeries, KlineError> {
        let Some(cache) = &self.cache else {
            return self.stock.fetch_candles(req).await;
        };
        let base_key = CacheKey::base(&req.symbol, req.freq, req.fq);
        if let Some(hit) = cache.get(&base_key, Some(&req.sdate), Some(&req.edate))? {
            return Ok(hit);
        }
        let fetched = self.stock.fetch_candles(req).await?;
        cache.put(&base_key, &fetched, None)?;
        Ok(fetched)
    }

    async fn fetch_cached(
        &self,
        source: &Arc<dyn CandleSource>,
        req: &FetchRequest,
    ) -> Result<QuoteSeries, KlineError> {
        if let Some(cache) = &self.cache {
            if cache.is_range_aware() && req.freq == Freq::Day {
                return get_price_auto_merge(cache.as_ref(), source.as_ref(), req, &self.extend)
                    .await;
            }
        }
        self.fetch_trivial(source, req).await
    }

    /// Whole-response caching by full request key; the fallback for every
    /// cadence the extension loop does not serve.
    async fn fetch_trivial(
        &self,
        source: &Arc<dyn CandleSource>,
        req: &FetchRequest,
    ) -> Result<QuoteSeries, KlineError> {
        let Some(cache) = &self.cache else {
            return source.fetch_candles(req).await;
        };
        // Intraday series are never written to persistent storage.
        if cache.is_range_aware() && req.freq == Freq::Min {
            return source.fetch_candles(req).await;
        }
        let key = CacheKey::full(&req.symbol, &req.sdate, &req.edate, req.freq, req.days, req.fq);
        if let Some(hit) = cache.get(&key, None, None)? {
            return Ok(hit);
        }
        let fetched = source.fetch_candles(req).await?;
        cache.put(&key, &fetched, None)?;
        Ok(fetched)
    }

    /// US dispatch: probe venue-suffix candidates and keep the richer
    /// response (more rows; ties broken by the earlier first date).
    async fn fetch_us(&self, req: &FetchRequest) -> Result<QuoteSeries, KlineError> {
        if req.freq == Freq::Min {
            return self.stock.fetch_candles(req).await;
        }
        let candidates = us_candidates(&req.symbol);
        let mut best: Option<QuoteSeries> = None;
        let mut last_err: Option<KlineError> = None;
        for candidate in candidates {
            let probe = FetchRequest {
                symbol: candidate,
                ..req.clone()
            };
            match self.fetch_cached(&self.stock, &probe).await {
                Ok(result) => {
                    best = Some(match best.take() {
                        None => result,
                        Some(prev) => richer(prev, result),
                    });
                }
                Err(e) => {
                    debug!(error = %e, "US suffix candidate failed");
                    last_err = Some(e);
                }
            }
        }
        match best {
            Some(result) => Ok(result),
            None => Err(last_err
                .unwrap_or_else(|| KlineError::symbol(format!("no US candidates for {}", req.symbol)))),
        }
    }
}

fn richer(a: QuoteSeries, b: QuoteSeries) -> QuoteSeries {
    if b.series.len() > a.series.len() {
        return b;
    }
    if b.series.len() == a.series.len() && b.series.first_date() < a.series.first_date() {
        return b;
    }
    a
}
