//! Futures and BTC parsers. Column order is part of the vendor contract.

use kline_core::series::{Bar, Series};
use kline_types::KlineError;
use serde_json::Value;

use super::{num, row_date};

fn rows_of(payload: &Value) -> Result<&Vec<Value>, KlineError> {
    payload
        .as_array()
        .ok_or_else(|| KlineError::parse("payload is not a row list", &payload.to_string()))
}

/// Daily futures rows: `date, open, high, low, close, vol, p, s`.
///
/// # Errors
/// `KlineError::Parse` when the payload is not a row list of that shape.
pub fn parse_future_daily(payload: &Value) -> Result<Series, KlineError> {
    let mut series = Series::new();
    for row in rows_of(payload)? {
        let cells = row
            .as_array()
            .ok_or_else(|| KlineError::parse("futures row is not an array", &row.to_string()))?;
        if cells.len() < 8 {
            return Err(KlineError::parse(
                "futures daily row has fewer than 8 fields",
                &row.to_string(),
            ));
        }
        let date = row_date(&cells[0], "futures daily")?;
        let mut bar = Bar::ohlcv(
            num(&cells[1]),
            num(&cells[4]),
            num(&cells[2]),
            num(&cells[3]),
            num(&cells[5]),
        );
        bar.p = Some(num(&cells[6]));
        bar.s = Some(num(&cells[7]));
        series.insert(date, bar);
    }
    Ok(series)
}

/// Intraday futures rows:
/// `dtime, close, avg, vol, hold, last_close, cur_date`.
///
/// # Errors
/// `KlineError::Parse` when the payload is not a row list of that shape.
pub fn parse_future_minute(payload: &Value) -> Result<Series, KlineError> {
    let mut series = Series::new();
    for row in rows_of(payload)? {
        let cells = row
            .as_array()
            .ok_or_else(|| KlineError::parse("futures row is not an array", &row.to_string()))?;
        if cells.len() < 7 {
            return Err(KlineError::parse(
                "futures minute row has fewer than 7 fields",
                &row.to_string(),
            ));
        }
        let date = row_date(&cells[0], "futures minute")?;
        let bar = Bar {
            close: num(&cells[1]),
            avg: Some(num(&cells[2])),
            vol: num(&cells[3]),
            hold: Some(num(&cells[4])),
            ..Bar::default()
        };
        series.insert(date, bar);
    }
    Ok(series)
}

/// BTC daily quotes arrive as bar-delimited CSV:
/// `date,open,high,low,close,vol,amount` rows joined by `|`. The trailing
/// amount lands in the bar's `money` column.
///
/// # Errors
/// `KlineError::Parse` when a row does not have 7 comma-separated fields.
pub fn parse_btc_daily(data: &str) -> Result<Series, KlineError> {
    let mut series = Series::new();
    for row in data.split('|') {
        let cells: Vec<&str> = row.split(',').collect();
        if cells.len() < 7 {
            return Err(KlineError::parse("BTC daily row has fewer than 7 fields", row));
        }
        let date = row_date(&Value::String(cells[0].to_string()), "btc daily")?;
        let parse = |s: &str| s.trim().parse().unwrap_or(f64::NAN);
        let mut bar = Bar::ohlcv(
            parse(cells[1]),
            parse(cells[4]),
            parse(cells[2]),
            parse(cells[3]),
            parse(cells[5]),
        );
        bar.money = Some(parse(cells[6]));
        series.insert(date, bar);
    }
    Ok(series)
}

/// BTC minute rows are objects `{d, o, h, l, c, v, a}` under
/// `result.data`; the caller has already checked `result.status.code`.
///
/// # Errors
/// `KlineError::Parse` when the row list or a row date is missing.
pub fn parse_btc_minute(payload: &Value) -> Result<Series, KlineError> {
    let rows = payload
        .get("result")
        .and_then(|r| r.get("data"))
        .and_then(Value::as_array)
        .ok_or_else(|| KlineError::parse("no BTC minute rows", &payload.to_string()))?;

    let mut series = Series::new();
    for row in rows {
        let field = |k: &str| num(row.get(k).unwrap_or(&Value::Null));
        let date = row_date(row.get("d").unwrap_or(&Value::Null), "btc minute")?;
        let mut bar = Bar::ohlcv(field("o"), field("c"), field("h"), field("l"), field("v"));
        bar.money = Some(field("a"));
        series.insert(date, bar);
    }
    Ok(series)
}
