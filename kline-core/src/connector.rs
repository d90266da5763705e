//! The connector trait vendor adapters implement.

use async_trait::async_trait;
use kline_types::{Adjust, Freq, KlineError};

use crate::series::Series;

/// One candle fetch, exactly as a vendor endpoint understands it.
///
/// `days` is the vendor-side fall-through default (how many bars to return
/// when the window does not pin it down); it is forwarded verbatim and never
/// used to derive dates locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Normalized symbol, prefix included.
    pub symbol: String,
    /// Start date (`YYYY-MM-DD`) or empty for an open start.
    pub sdate: String,
    /// End date (`YYYY-MM-DD`) or empty for an open end.
    pub edate: String,
    /// Candle frequency.
    pub freq: Freq,
    /// Vendor bar-count fall-through default.
    pub days: u32,
    /// Adjustment mode.
    pub fq: Adjust,
}

impl FetchRequest {
    /// A daily qfq request with the vendor default of 320 bars.
    #[must_use]
    pub fn daily(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            sdate: String::new(),
            edate: String::new(),
            freq: Freq::Day,
            days: 320,
            fq: Adjust::Qfq,
        }
    }

    /// Same request against a different date window.
    #[must_use]
    pub fn with_window(&self, sdate: impl Into<String>, edate: impl Into<String>) -> Self {
        Self {
            sdate: sdate.into(),
            edate: edate.into(),
            ..self.clone()
        }
    }
}

/// The `(symbol, name, table)` result tuple as a struct.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuoteSeries {
    /// Canonical symbol the data belongs to.
    pub symbol: String,
    /// Human-readable instrument name; `"None"` on soft-fail paths.
    pub name: String,
    /// The candle series; possibly empty on soft-fail paths.
    pub series: Series,
}

impl QuoteSeries {
    /// Build a result.
    #[must_use]
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, series: Series) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            series,
        }
    }

    /// The empty tuple shape soft-fail paths return.
    #[must_use]
    pub fn soft_empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: "None".to_string(),
            series: Series::new(),
        }
    }
}

/// A vendor adapter: composes the URL, fetches, parses, and returns the
/// canonical result. Adapters never cache; caching is orthogonal.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Fetch candles for the request.
    ///
    /// # Errors
    /// `Network` after exhausted retries, `DataSource` when the vendor
    /// answers with an error code or empty payload, `Parse` when the body
    /// shape is unrecognized.
    async fn fetch_candles(&self, req: &FetchRequest) -> Result<QuoteSeries, KlineError>;
}
