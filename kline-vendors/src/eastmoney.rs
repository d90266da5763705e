//! EastMoney adapter: sector-board (`BK`) candle history.
//!
//! The board endpoint legitimately produces empty payloads for retired
//! board codes, so this adapter is a soft path: every failure is logged and
//! returned as the empty tuple shape instead of an error.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use kline_core::connector::{CandleSource, FetchRequest, QuoteSeries};
use kline_core::series::{Bar, Series};
use kline_types::KlineError;
use serde_json::Value;
use tracing::warn;

use crate::envelope::strip_jsonp;
use crate::http::HttpClient;
use crate::parse::{num, row_date};

const VENDOR: &str = "eastmoney";

/// The history endpoint ships base64-obfuscated in source, callback and
/// secid prefix included; it is decoded once at adapter construction.
const ENDPOINT_B64: &str = "aHR0cDovL3B1c2gyaGlzLmVhc3Rtb25leS5jb20vYXBpL3F0L3N0b2NrL2tsaW5lL2dldD9jYj1qUXVlcnkxMTI0MDIyNTY2NDQ1ODczNzY2OTcyXzE2MTc4NjQ1NjgxMzEmc2VjaWQ9OTAu";

const CALLBACK: &str = "jQuery1124022566445873766972_1617864568131";

const QUERY_SUFFIX: &str = "&fields1=f1%2Cf2%2Cf3%2Cf4%2Cf5\
&fields2=f51%2Cf52%2Cf53%2Cf54%2Cf55%2Cf56%2Cf57%2Cf58\
&klt=101&fqt=0&beg=19900101&end=20990101&_=1";

fn default_endpoint() -> String {
    BASE64
        .decode(ENDPOINT_B64)
        .ok()
        .and_then(|b| String::from_utf8(b).ok())
        .unwrap_or_default()
}

/// Adapter over the EastMoney board-history API.
pub struct EastmoneyAdapter {
    http: Arc<HttpClient>,
    endpoint: String,
}

impl EastmoneyAdapter {
    /// Adapter against the production endpoint.
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self {
            http,
            endpoint: default_endpoint(),
        }
    }

    /// Rebuild the endpoint against a different host (tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let host = url.into().trim_end_matches('/').to_string();
        self.endpoint = format!("{host}/api/qt/stock/kline/get?cb={CALLBACK}&secid=90.");
        self
    }

    fn board_url(&self, symbol: &str) -> String {
        format!("{}{symbol}{QUERY_SUFFIX}", self.endpoint)
    }

    async fn try_fetch(&self, req: &FetchRequest) -> Result<Option<QuoteSeries>, KlineError> {
        let body = self.http.get(&self.board_url(&req.symbol)).await?;
        let text = strip_jsonp(&body)?;
        let payload: Value =
            serde_json::from_str(text).map_err(|e| KlineError::parse(e.to_string(), &body))?;

        let Some(data) = payload.get("data").filter(|d| !d.is_null()) else {
            // Retired board codes answer with a null data block.
            return Ok(None);
        };
        let name = data
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let rows = data
            .get("klines")
            .and_then(Value::as_array)
            .ok_or_else(|| KlineError::parse("no klines rows", &body))?;

        // Board rows are comma-joined strings:
        // date,open,close,high,low,vol,money,p
        let mut series = Series::new();
        for row in rows {
            let text = row
                .as_str()
                .ok_or_else(|| KlineError::parse("board row is not a string", &row.to_string()))?;
            let cells: Vec<Value> = text
                .split(',')
                .map(|c| Value::String(c.to_string()))
                .collect();
            if cells.len() < 8 {
                return Err(KlineError::parse("board row has fewer than 8 fields", text));
            }
            let date = row_date(&cells[0], "board")?;
            let mut bar = Bar::ohlcv(
                num(&cells[1]),
                num(&cells[2]),
                num(&cells[3]),
                num(&cells[4]),
                num(&cells[5]),
            );
            bar.money = Some(num(&cells[6]));
            bar.p = Some(num(&cells[7]));
            series.insert(date, bar);
        }
        Ok(Some(QuoteSeries::new(&req.symbol, name, series)))
    }
}

#[async_trait]
impl CandleSource for EastmoneyAdapter {
    async fn fetch_candles(&self, req: &FetchRequest) -> Result<QuoteSeries, KlineError> {
        if !req.symbol.starts_with("BK") {
            return Err(KlineError::data_source(
                VENDOR,
                format!("unsupported symbol: {}", req.symbol),
            ));
        }
        match self.try_fetch(req).await {
            Ok(Some(result)) => Ok(result),
            Ok(None) => {
                warn!(symbol = %req.symbol, "board data empty");
                Ok(QuoteSeries::soft_empty(&req.symbol))
            }
            Err(e) => {
                warn!(symbol = %req.symbol, error = %e, "board fetch failed");
                Ok(QuoteSeries::soft_empty(&req.symbol))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obfuscated_endpoint_decodes_to_the_history_api() {
        assert_eq!(
            default_endpoint(),
            format!("http://push2his.eastmoney.com/api/qt/stock/kline/get?cb={CALLBACK}&secid=90.")
        );
    }

    #[test]
    fn board_url_appends_symbol_and_fields() {
        let adapter = EastmoneyAdapter::new(Arc::new(HttpClient::with_defaults().unwrap()));
        let url = adapter.board_url("BK0420");
        assert!(url.contains("secid=90.BK0420"));
        assert!(url.contains("klt=101"));
        assert!(url.ends_with("&_=1"));
    }
}
