//! Forward/backward auto-merge extension orchestrator.
//!
//! Given a request whose window the cached series does not cover, the
//! orchestrator plans vendor fetches the user never asked for: forward
//! windows to catch the series up to today, and unbounded-start backward
//! windows that use the vendor's "N most recent bars ending at `edate`"
//! contract as a paging primitive. Every fragment is `put` through the
//! cache, which merges it into the canonical series.

use chrono::{Days, NaiveDateTime, NaiveTime};
use kline_types::KlineError;
use tracing::{debug, warn};

use crate::cache::QuoteCache;
use crate::connector::{CandleSource, FetchRequest, QuoteSeries};
use crate::dates::{fmt_date, parse_date, today};
use crate::key::CacheKey;

/// Tuning for the extension loops.
#[derive(Debug, Clone, Copy)]
pub struct ExtendConfig {
    /// Minimum rows that must exist at or before the requested `edate`
    /// before backward extension stops. Downstream indicator consumers need
    /// a trailing warm-up window even when the requested `sdate` is lax.
    pub min_rows_before_edate: usize,
    /// Upper bound on fetches per direction, so a defective vendor cannot
    /// drive an unbounded loop.
    pub max_extend_iterations: usize,
}

impl Default for ExtendConfig {
    fn default() -> Self {
        Self {
            min_rows_before_edate: 60,
            max_extend_iterations: 15,
        }
    }
}

/// Outcome of one planned fetch inside an extension loop.
enum Step {
    Fragment(QuoteSeries),
    Nothing,
    NetworkDown(KlineError),
}

async fn step(source: &dyn CandleSource, req: &FetchRequest) -> Result<Step, KlineError> {
    match source.fetch_candles(req).await {
        Ok(frag) if frag.series.is_empty() => Ok(Step::Nothing),
        Ok(frag) => Ok(Step::Fragment(frag)),
        // A vendor error code means this iteration produced nothing.
        Err(e) if e.is_empty_fetch() => {
            debug!(error = %e, "extension fetch produced nothing");
            Ok(Step::Nothing)
        }
        // Transport death may still be satisfiable from cache; decided at
        // finalization.
        Err(e @ KlineError::Network { .. }) => Ok(Step::NetworkDown(e)),
        Err(e) => Err(e),
    }
}

fn load_full(cache: &dyn QuoteCache, base_key: &str) -> Result<Option<QuoteSeries>, KlineError> {
    cache.get(base_key, Some(""), Some(""))
}

fn window_of(req: &FetchRequest) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
    (parse_date(&req.sdate), parse_date(&req.edate))
}

/// Fetch with range-extension against a persistent, range-aware cache.
///
/// Semantics:
/// - cold cache → one-shot fetch of the requested window;
/// - `edate` beyond the cached series → forward extensions from
///   `cachedLatest + 1 day` to today until the series covers the request,
///   stops advancing, returns nothing, or the iteration cap is hit;
/// - `edate` before the cached series, or a request reaching before it
///   (absent `sdate` included) with fewer than `min_rows_before_edate`
///   rows at or before `edate` → backward extensions ending at
///   `cachedEarliest − 1 day` with an unbounded start;
/// - finally the cache is consulted for the requested window, with one
///   direct fallback fetch on a miss.
///
/// Forward extensions all complete before backward extensions begin, and
/// fragments merge in fetch order, so newer vendor data overrides older
/// cached rows for overlapping dates.
///
/// # Errors
/// `Cache` errors always propagate (a broken store must not silently turn
/// into vendor traffic). `Network` errors propagate unless the cached
/// series still satisfies the window, which degrades to a warned cache hit.
/// `Parse` errors propagate.
pub async fn get_price_auto_merge(
    cache: &dyn QuoteCache,
    source: &dyn CandleSource,
    req: &FetchRequest,
    cfg: &ExtendConfig,
) -> Result<QuoteSeries, KlineError> {
    let base_key = CacheKey::base(&req.symbol, req.freq, req.fq);
    let (req_s, req_e) = window_of(req);

    let Some(mut full) = load_full(cache, &base_key)? else {
        // Cold miss: one-shot fetch of the requested window.
        debug!(%base_key, "cold cache, direct fetch");
        let fetched = source.fetch_candles(req).await?;
        cache.put(&base_key, &fetched, None)?;
        if let Some(hit) = cache.get(&base_key, Some(&req.sdate), Some(&req.edate))? {
            return Ok(hit);
        }
        let filtered = fetched.series.between(req_s, req_e);
        return Ok(QuoteSeries::new(fetched.symbol, fetched.name, filtered));
    };

    let mut net_down: Option<KlineError> = None;

    // Forward: catch the cached series up toward the requested end date.
    if let Some(req_e) = req_e {
        let mut cached_latest = full.series.last_date();
        let mut iterations = 0;
        while net_down.is_none()
            && iterations < cfg.max_extend_iterations
            && cached_latest.is_some_and(|latest| req_e > latest)
        {
            iterations += 1;
            let Some(latest) = cached_latest else {
                break;
            };
            let extend_s = fmt_date(latest + Days::new(1));
            let extend_e = fmt_date(today().and_time(NaiveTime::MIN));
            debug!(%base_key, %extend_s, %extend_e, iterations, "forward extension");
            match step(source, &req.with_window(extend_s, extend_e)).await? {
                Step::Nothing => break,
                Step::NetworkDown(e) => net_down = Some(e),
                Step::Fragment(frag) => {
                    cache.put(&base_key, &frag, None)?;
                    let Some(reloaded) = load_full(cache, &base_key)? else {
                        break;
                    };
                    full = reloaded;
                    let new_latest = full.series.last_date();
                    // A vendor with nothing past a weekend or holiday keeps
                    // answering without advancing; stop instead of looping.
                    if new_latest <= cached_latest {
                        break;
                    }
                    cached_latest = new_latest;
                }
            }
        }
    }

    // Backward: page older bars until the warm-up window is satisfied.
    if let Some(req_e) = req_e {
        // A window lying entirely inside the cached range must not fetch;
        // warm-up paging only kicks in when the request reaches before the
        // cached series (an absent sdate counts as reaching before it).
        let needs_backward = |series: &crate::series::Series| {
            let Some(earliest) = series.first_date() else {
                return false;
            };
            if req_e < earliest {
                return true;
            }
            req_s.is_none_or(|s| s < earliest)
                && series.rows_at_or_before(req_e) <= cfg.min_rows_before_edate
        };
        let mut iterations = 0;
        while net_down.is_none()
            && iterations < cfg.max_extend_iterations
            && needs_backward(&full.series)
        {
            iterations += 1;
            let Some(cached_earliest) = full.series.first_date() else {
                break;
            };
            let extend_e = fmt_date(cached_earliest - Days::new(1));
            debug!(%base_key, %extend_e, iterations, "backward extension");
            // Unbounded start: the vendor returns up to `days` bars ending
            // at `extend_e`, which is the paging contract we rely on.
            match step(source, &req.with_window("", extend_e)).await? {
                Step::Nothing => break,
                Step::NetworkDown(e) => net_down = Some(e),
                Step::Fragment(frag) => {
                    cache.put(&base_key, &frag, None)?;
                    let Some(reloaded) = load_full(cache, &base_key)? else {
                        break;
                    };
                    full = reloaded;
                    let retreated = full
                        .series
                        .first_date()
                        .is_some_and(|earliest| earliest < cached_earliest);
                    if !retreated {
                        break;
                    }
                    if full.series.rows_at_or_before(req_e) > cfg.min_rows_before_edate
                        && full.series.first_date().is_some_and(|e| e <= req_e)
                    {
                        break;
                    }
                }
            }
        }
    }

    // Finalize from cache; fall back to one direct fetch on a miss.
    if let Some(hit) = cache.get(&base_key, Some(&req.sdate), Some(&req.edate))? {
        if let Some(e) = net_down {
            warn!(%base_key, error = %e, "vendor unreachable, serving cached window");
        }
        return Ok(hit);
    }
    if let Some(e) = net_down {
        return Err(e);
    }

    debug!(%base_key, "extension left the window uncovered, direct fetch");
    let fetched = source.fetch_candles(req).await?;
    cache.put(&base_key, &fetched, None)?;
    if let Some(hit) = cache.get(&base_key, Some(&req.sdate), Some(&req.edate))? {
        return Ok(hit);
    }
    let filtered = fetched.series.between(req_s, req_e);
    Ok(QuoteSeries::new(fetched.symbol, fetched.name, filtered))
}
