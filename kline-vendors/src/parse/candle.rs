//! Candle-table parser for the qt fq-kline payload family.

use kline_core::series::{Bar, Series};
use kline_types::{Adjust, KlineError};
use serde_json::Value;

use super::{num, row_date};

/// Frequency keys in preference order when the request asked for
/// forward-adjusted prices.
const KEYS_QFQ: [&str; 9] = [
    "qfqday", "day", "hfqday", "qfqweek", "week", "hfqweek", "qfqmonth", "month", "hfqmonth",
];
const KEYS_HFQ: [&str; 9] = [
    "hfqday", "day", "qfqday", "hfqweek", "week", "qfqweek", "hfqmonth", "month", "qfqmonth",
];
const KEYS_RAW: [&str; 9] = [
    "day", "qfqday", "hfqday", "week", "qfqweek", "hfqweek", "month", "qfqmonth", "hfqmonth",
];

const fn freq_keys(fq: Adjust) -> [&'static str; 9] {
    match fq {
        Adjust::Qfq => KEYS_QFQ,
        Adjust::Hfq => KEYS_HFQ,
        Adjust::Raw => KEYS_RAW,
    }
}

/// Parse the qt candle payload: locate `data[symbol]`, pick the frequency
/// key by the adjustment-driven preference order, read the first six
/// positional fields of each row as `date, open, close, high, low, vol`,
/// and take the name from `qt[symbol][1]` when present.
///
/// # Errors
/// `KlineError::Parse` carrying the offending fragment when the symbol
/// block, the frequency key, or a row shape is missing. Never silently
/// returns an empty series for an unexpected wire shape.
pub fn parse_candles(
    payload: &Value,
    symbol: &str,
    fq: Adjust,
) -> Result<(String, Series), KlineError> {
    let symbol_data = payload
        .get("data")
        .and_then(|d| d.get(symbol))
        .and_then(Value::as_object)
        .ok_or_else(|| {
            KlineError::parse(format!("no data block for {symbol}"), &payload.to_string())
        })?;

    let key = freq_keys(fq)
        .into_iter()
        .find(|k| symbol_data.contains_key(*k))
        .ok_or_else(|| {
            KlineError::parse(
                format!("no frequency key for {symbol}"),
                &Value::Object(symbol_data.clone()).to_string(),
            )
        })?;

    let name = symbol_data
        .get("qt")
        .and_then(|qt| qt.get(symbol))
        .and_then(|row| row.get(1))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let rows = symbol_data
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| KlineError::parse(format!("{key} is not a row list"), &payload.to_string()))?;

    let mut series = Series::new();
    for row in rows {
        let cells = row.as_array().ok_or_else(|| {
            KlineError::parse("candle row is not an array", &row.to_string())
        })?;
        if cells.len() < 6 {
            return Err(KlineError::parse(
                "candle row has fewer than 6 fields",
                &row.to_string(),
            ));
        }
        let date = row_date(&cells[0], key)?;
        series.insert(
            date,
            Bar::ohlcv(
                num(&cells[1]),
                num(&cells[2]),
                num(&cells[3]),
                num(&cells[4]),
                num(&cells[5]),
            ),
        );
    }
    Ok((name, series))
}

/// Parse the US intraday payload: whitespace-separated
/// `minute price volume` rows under `data[symbol].data.data`, with the name
/// from `qt[symbol][1]`. Minute rows become bars with `close` carrying the
/// price.
///
/// # Errors
/// `KlineError::Parse` when the minute block or a row shape is missing.
pub fn parse_us_minute(payload: &Value, symbol: &str) -> Result<(String, Series), KlineError> {
    let symbol_data = payload
        .get("data")
        .and_then(|d| d.get(symbol))
        .ok_or_else(|| {
            KlineError::parse(format!("no data block for {symbol}"), &payload.to_string())
        })?;

    let name = symbol_data
        .get("qt")
        .and_then(|qt| qt.get(symbol))
        .and_then(|row| row.get(1))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let rows = symbol_data
        .get("data")
        .and_then(|d| d.get("data"))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            KlineError::parse(format!("no minute rows for {symbol}"), &payload.to_string())
        })?;

    let mut series = Series::new();
    for row in rows {
        let text = row
            .as_str()
            .ok_or_else(|| KlineError::parse("minute row is not a string", &row.to_string()))?;
        let mut fields = text.split_whitespace();
        let (Some(minute), Some(price), Some(volume)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(KlineError::parse("minute row has fewer than 3 fields", text));
        };
        let date = row_date(&Value::String(minute.to_string()), "minute")?;
        let bar = Bar {
            close: price.trim().parse().unwrap_or(f64::NAN),
            vol: volume.trim().parse().unwrap_or(f64::NAN),
            ..Bar::default()
        };
        series.insert(date, bar);
    }
    Ok((name, series))
}
