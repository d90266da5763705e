//! Parsers that turn materialized vendor payloads into canonical series.

mod candle;
mod future;

pub use candle::{parse_candles, parse_us_minute};
pub use future::{parse_btc_daily, parse_btc_minute, parse_future_daily, parse_future_minute};

use chrono::NaiveDateTime;
use kline_core::dates::parse_date;
use kline_types::KlineError;
use serde_json::Value;

/// Numeric coercion policy: strings parse if they can, anything invalid
/// becomes NaN. Vendors interleave `"-"`, `""` and bare numbers freely.
pub(crate) fn num(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Row dates must coerce to a calendar timestamp; that is the one column a
/// series cannot survive losing.
pub(crate) fn row_date(value: &Value, context: &str) -> Result<NaiveDateTime, KlineError> {
    value
        .as_str()
        .and_then(parse_date)
        .ok_or_else(|| KlineError::parse("row date is not a timestamp", &format!("{context}: {value}")))
}
