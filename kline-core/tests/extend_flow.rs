mod common;

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveTime;
use common::{MapBackend, d, daily_series};
use kline_core::dates::{fmt_date, today};
use kline_core::{
    CandleSource, ExtendConfig, FetchRequest, KlineError, PersistentCache, QuoteCache,
    QuoteSeries, Series, get_price_auto_merge,
};

/// Plays back a script of responses and records every request it sees.
struct ScriptedSource {
    responses: Mutex<VecDeque<Result<QuoteSeries, KlineError>>>,
    calls: Mutex<Vec<FetchRequest>>,
}

impl ScriptedSource {
    fn new(responses: Vec<Result<QuoteSeries, KlineError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(vec![]),
        }
    }

    fn calls(&self) -> Vec<FetchRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandleSource for ScriptedSource {
    async fn fetch_candles(&self, req: &FetchRequest) -> Result<QuoteSeries, KlineError> {
        self.calls.lock().unwrap().push(req.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(QuoteSeries::soft_empty(&req.symbol)))
    }
}

fn cache() -> PersistentCache {
    PersistentCache::new(Box::new(MapBackend::new()), None)
}

fn quote(series: Series) -> QuoteSeries {
    QuoteSeries::new("sh600000", "浦发银行", series)
}

fn request(sdate: &str, edate: &str) -> FetchRequest {
    FetchRequest::daily("sh600000").with_window(sdate, edate)
}

fn seed(cache: &PersistentCache, series: Series) {
    cache.put("sh600000:day:qfq", &quote(series), None).unwrap();
}

#[tokio::test]
async fn cold_miss_is_a_single_direct_fetch() {
    let cache = cache();
    let source = ScriptedSource::new(vec![Ok(quote(daily_series("2024-01-02", 4)))]);
    let req = request("2024-01-02", "2024-01-05");

    let result = get_price_auto_merge(&cache, &source, &req, &ExtendConfig::default())
        .await
        .unwrap();

    let calls = source.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].sdate, "2024-01-02");
    assert_eq!(calls[0].edate, "2024-01-05");
    assert_eq!(result.series.len(), 4);

    // The base entry now exists.
    assert!(cache.get("sh600000:day:qfq", Some(""), Some("")).unwrap().is_some());
}

#[tokio::test]
async fn covered_window_never_touches_the_network() {
    let cache = cache();
    seed(&cache, daily_series("2024-01-02", 4));
    let source = ScriptedSource::new(vec![]);
    let req = request("2024-01-02", "2024-01-05");

    let result = get_price_auto_merge(&cache, &source, &req, &ExtendConfig::default())
        .await
        .unwrap();

    assert!(source.calls().is_empty());
    assert_eq!(result.series.len(), 4);
}

#[tokio::test]
async fn forward_extension_requests_latest_plus_one_to_today() {
    let cache = cache();
    seed(&cache, daily_series("2024-01-02", 4)); // through 2024-01-05
    let source = ScriptedSource::new(vec![Ok(quote(daily_series("2024-01-06", 7)))]);
    let req = request("2024-01-02", "2024-01-12");

    let result = get_price_auto_merge(&cache, &source, &req, &ExtendConfig::default())
        .await
        .unwrap();

    let calls = source.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].sdate, "2024-01-06");
    assert_eq!(calls[0].edate, fmt_date(today().and_time(NaiveTime::MIN)));

    assert_eq!(result.series.first_date(), Some(d("2024-01-02")));
    assert_eq!(result.series.last_date(), Some(d("2024-01-12")));

    // Persisted latest advanced too.
    let full = cache.get("sh600000:day:qfq", Some(""), Some("")).unwrap().unwrap();
    assert_eq!(full.series.last_date(), Some(d("2024-01-12")));
}

#[tokio::test]
async fn forward_extension_stops_on_empty_vendor_payload() {
    let cache = cache();
    seed(&cache, daily_series("2024-01-02", 4));
    let source = ScriptedSource::new(vec![Ok(QuoteSeries::soft_empty("sh600000"))]);
    let req = request("2024-01-02", "2024-01-12");

    let result = get_price_auto_merge(&cache, &source, &req, &ExtendConfig::default())
        .await
        .unwrap();

    assert_eq!(source.calls().len(), 1);
    // Exactly the pre-extension cached window, filtered to the request.
    assert_eq!(result.series.len(), 4);
    assert_eq!(result.series.last_date(), Some(d("2024-01-05")));
}

#[tokio::test]
async fn forward_extension_stops_when_latest_does_not_advance() {
    let cache = cache();
    seed(&cache, daily_series("2024-01-02", 4));
    // Vendor keeps answering with the same already-cached rows.
    let source = ScriptedSource::new(vec![
        Ok(quote(daily_series("2024-01-02", 4))),
        Ok(quote(daily_series("2024-01-02", 4))),
    ]);
    let req = request("2024-01-02", "2024-01-12");

    let result = get_price_auto_merge(&cache, &source, &req, &ExtendConfig::default())
        .await
        .unwrap();

    assert_eq!(source.calls().len(), 1, "non-advancing fetch must stop the loop");
    assert_eq!(result.series.len(), 4);
}

#[tokio::test]
async fn backward_extension_pages_until_warmup_satisfied() {
    let cache = cache();
    seed(&cache, daily_series("2024-03-01", 20)); // through 2024-03-20
    // 60 rows ending at 2024-02-29 (2024 is a leap year: Jan 1 … Feb 29).
    let source = ScriptedSource::new(vec![Ok(quote(daily_series("2024-01-01", 60)))]);
    let cfg = ExtendConfig {
        min_rows_before_edate: 60,
        max_extend_iterations: 15,
    };
    let req = request("2024-02-01", "2024-03-20");

    let result = get_price_auto_merge(&cache, &source, &req, &cfg).await.unwrap();

    let calls = source.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].sdate, "", "backward windows have a deliberately open start");
    assert_eq!(calls[0].edate, "2024-02-29");

    // Warm-up satisfied: more than 60 rows at or before the request edate.
    let full = cache.get("sh600000:day:qfq", Some(""), Some("")).unwrap().unwrap();
    assert!(full.series.rows_at_or_before(d("2024-03-20")) > 60);

    assert_eq!(result.series.first_date(), Some(d("2024-02-01")));
    assert_eq!(result.series.last_date(), Some(d("2024-03-20")));
}

#[tokio::test]
async fn backward_extension_respects_iteration_cap() {
    let cache = cache();
    seed(&cache, daily_series("2024-03-01", 20));
    // Each response retreats by exactly one day, never satisfying warm-up.
    let source = ScriptedSource::new(vec![
        Ok(quote(daily_series("2024-02-29", 1))),
        Ok(quote(daily_series("2024-02-28", 1))),
        Ok(quote(daily_series("2024-02-27", 1))),
        Ok(quote(daily_series("2024-02-26", 1))),
    ]);
    let cfg = ExtendConfig {
        min_rows_before_edate: 60,
        max_extend_iterations: 3,
    };
    let req = request("2024-02-01", "2024-03-20");

    let result = get_price_auto_merge(&cache, &source, &req, &cfg).await.unwrap();

    assert_eq!(source.calls().len(), 3, "loop must stop at the iteration cap");
    assert_eq!(result.series.first_date(), Some(d("2024-02-27")));
}

#[tokio::test]
async fn backward_extension_stops_when_earliest_does_not_retreat() {
    let cache = cache();
    seed(&cache, daily_series("2024-03-01", 20));
    let source = ScriptedSource::new(vec![
        Ok(quote(daily_series("2024-03-01", 5))), // already-cached rows only
        Ok(quote(daily_series("2024-02-01", 20))),
    ]);
    let cfg = ExtendConfig {
        min_rows_before_edate: 60,
        max_extend_iterations: 15,
    };
    let req = request("2024-02-01", "2024-03-20");

    get_price_auto_merge(&cache, &source, &req, &cfg).await.unwrap();
    assert_eq!(source.calls().len(), 1, "non-retreating fetch must stop the loop");
}

#[tokio::test]
async fn network_failure_degrades_to_cached_window() {
    let cache = cache();
    seed(&cache, daily_series("2024-01-02", 10)); // through 2024-01-11
    let source = ScriptedSource::new(vec![Err(KlineError::network("http://x", 3, "down"))]);
    let req = request("2024-01-02", "2024-01-20");

    let result = get_price_auto_merge(&cache, &source, &req, &ExtendConfig::default())
        .await
        .unwrap();

    // The cached fragment still satisfies (part of) the window.
    assert_eq!(result.series.len(), 10);
}

#[tokio::test]
async fn network_failure_propagates_when_cache_cannot_satisfy() {
    let cache = cache();
    seed(&cache, daily_series("2024-01-02", 4)); // through 2024-01-05
    let source = ScriptedSource::new(vec![Err(KlineError::network("http://x", 3, "down"))]);
    // Entirely after the cached range: no overlap once extension fails.
    let req = request("2024-02-01", "2024-02-10");

    let err = get_price_auto_merge(&cache, &source, &req, &ExtendConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, KlineError::Network { .. }));
}

#[tokio::test]
async fn data_source_error_acts_as_empty_iteration() {
    let cache = cache();
    seed(&cache, daily_series("2024-01-02", 4));
    let source = ScriptedSource::new(vec![Err(KlineError::data_source("tencent", "code 500"))]);
    let req = request("2024-01-02", "2024-01-12");

    let result = get_price_auto_merge(&cache, &source, &req, &ExtendConfig::default())
        .await
        .unwrap();
    assert_eq!(source.calls().len(), 1);
    assert_eq!(result.series.len(), 4);
}
