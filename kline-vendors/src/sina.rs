//! Sina adapter: futures daily/minute and the BTC pseudo-future.

use std::sync::Arc;

use async_trait::async_trait;
use kline_core::connector::{CandleSource, FetchRequest, QuoteSeries};
use kline_types::{Freq, KlineError};
use serde_json::Value;
use tracing::warn;

use crate::envelope::{skip_leading_comment, strip_jsonp, strip_var_assign};
use crate::http::HttpClient;
use crate::parse::{parse_btc_daily, parse_btc_minute, parse_future_daily, parse_future_minute};

const VENDOR: &str = "sina";
const BASE_URL: &str = "https://stock2.finance.sina.com.cn";
const QUOTES_BASE_URL: &str = "https://quotes.sina.cn";

/// Bars one BTC minute fetch asks for (24 hours at one per minute).
const BTC_MINUTE_LEN: u32 = 1440;

/// Adapter over Sina's futures JSONP endpoints and the BTC openapi.
pub struct SinaAdapter {
    http: Arc<HttpClient>,
    base_url: String,
    quotes_base_url: String,
}

impl SinaAdapter {
    /// Adapter against the production endpoints.
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self {
            http,
            base_url: BASE_URL.to_string(),
            quotes_base_url: QUOTES_BASE_URL.to_string(),
        }
    }

    /// Point the futures endpoints at a different host (tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Point the BTC endpoints at a different host (tests).
    #[must_use]
    pub fn with_quotes_base_url(mut self, url: impl Into<String>) -> Self {
        self.quotes_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn future_url(&self, code: &str, service: &str) -> String {
        format!(
            "{}/futures/api/jsonp.php/var%20t1nf_{code}=/InnerFuturesNewService.{service}?symbol={code}",
            self.base_url
        )
    }

    fn btc_daily_url(&self) -> String {
        format!(
            "{}/fx/api/openapi.php/BtcService.getDayKLine?symbol=btcbtcusd",
            self.quotes_base_url
        )
    }

    fn btc_minute_url(&self) -> String {
        format!(
            "{}/fx/api/openapi.php/BtcService.getMinKline?symbol=btcbtcusd&scale=1&datalen={BTC_MINUTE_LEN}&callback=var%20_btcbtcusd",
            self.quotes_base_url
        )
    }

    async fn fetch_future(&self, symbol: &str, code: &str, freq: Freq) -> Result<QuoteSeries, KlineError> {
        let service = if freq == Freq::Min { "getMinLine" } else { "getDailyKLine" };
        let body = self.http.get(&self.future_url(code, service)).await?;
        let text = strip_var_assign(&body)?;
        let payload: Value =
            serde_json::from_str(text).map_err(|e| KlineError::parse(e.to_string(), &body))?;
        if payload.as_array().is_some_and(|rows| rows.is_empty()) {
            return Err(KlineError::data_source(
                VENDOR,
                format!("empty futures payload for {code}"),
            ));
        }
        let series = if freq == Freq::Min {
            parse_future_minute(&payload)?
        } else {
            parse_future_daily(&payload)?
        };
        Ok(QuoteSeries::new(symbol, code, series))
    }

    async fn fetch_btc_daily(&self, symbol: &str) -> Result<QuoteSeries, KlineError> {
        let body = self.http.get(&self.btc_daily_url()).await?;
        let payload: Value =
            serde_json::from_str(body.trim()).map_err(|e| KlineError::parse(e.to_string(), &body))?;
        let data = payload
            .get("result")
            .and_then(|r| r.get("data"))
            .and_then(Value::as_str)
            .ok_or_else(|| KlineError::data_source(VENDOR, "missing BTC daily data"))?;
        Ok(QuoteSeries::new(symbol, "BTC", parse_btc_daily(data)?))
    }

    async fn try_btc_minute(&self, symbol: &str) -> Result<QuoteSeries, KlineError> {
        let body = self.http.get(&self.btc_minute_url()).await?;
        let text = strip_jsonp(skip_leading_comment(&body))?;
        let payload: Value =
            serde_json::from_str(text).map_err(|e| KlineError::parse(e.to_string(), &body))?;
        let status = payload
            .get("result")
            .and_then(|r| r.get("status"))
            .and_then(|s| s.get("code"))
            .and_then(Value::as_i64)
            .unwrap_or(-1);
        if status != 0 {
            return Err(KlineError::data_source(
                VENDOR,
                format!("BTC minute status {status}"),
            ));
        }
        Ok(QuoteSeries::new(symbol, "BTC", parse_btc_minute(&payload)?))
    }
}

#[async_trait]
impl CandleSource for SinaAdapter {
    async fn fetch_candles(&self, req: &FetchRequest) -> Result<QuoteSeries, KlineError> {
        let Some(code) = req.symbol.strip_prefix("fu") else {
            return Err(KlineError::data_source(
                VENDOR,
                format!("unsupported symbol: {}", req.symbol),
            ));
        };
        if code.len() >= 3 && code[..3].eq_ignore_ascii_case("btc") {
            if req.freq == Freq::Min {
                // BTC minute is a soft path: the endpoint flakes routinely
                // and callers expect the tuple shape back regardless.
                return Ok(match self.try_btc_minute(&req.symbol).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(symbol = %req.symbol, error = %e, "BTC minute fetch failed");
                        QuoteSeries::soft_empty(&req.symbol)
                    }
                });
            }
            return self.fetch_btc_daily(&req.symbol).await;
        }
        self.fetch_future(&req.symbol, code, req.freq).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn future_urls_are_bit_exact() {
        let adapter = SinaAdapter::new(Arc::new(HttpClient::with_defaults().unwrap()));
        assert_eq!(
            adapter.future_url("SC2109", "getDailyKLine"),
            "https://stock2.finance.sina.com.cn/futures/api/jsonp.php/var%20t1nf_SC2109=/InnerFuturesNewService.getDailyKLine?symbol=SC2109"
        );
        assert_eq!(
            adapter.future_url("SC2109", "getMinLine"),
            "https://stock2.finance.sina.com.cn/futures/api/jsonp.php/var%20t1nf_SC2109=/InnerFuturesNewService.getMinLine?symbol=SC2109"
        );
        assert_eq!(
            adapter.btc_daily_url(),
            "https://quotes.sina.cn/fx/api/openapi.php/BtcService.getDayKLine?symbol=btcbtcusd"
        );
    }
}
