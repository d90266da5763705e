//! Tencent qt adapter: mainland / HK / US candles, US minute quotes and the
//! plate proxy endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use kline_core::connector::{CandleSource, FetchRequest, QuoteSeries};
use kline_types::{Freq, KlineError};
use serde_json::Value;

use crate::envelope::strip_var_assign;
use crate::http::HttpClient;
use crate::parse::{parse_candles, parse_us_minute};

const VENDOR: &str = "tencent";
const BASE_URL: &str = "https://web.ifzq.gtimg.cn";
const PROXY_BASE_URL: &str = "https://proxy.finance.qq.com";

/// Adapter over the qt fq-kline endpoint family. Holds the shared fetcher
/// and composes bit-exact query strings; it never caches.
pub struct TencentAdapter {
    http: Arc<HttpClient>,
    base_url: String,
    proxy_base_url: String,
}

impl TencentAdapter {
    /// Adapter against the production endpoints.
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self {
            http,
            base_url: BASE_URL.to_string(),
            proxy_base_url: PROXY_BASE_URL.to_string(),
        }
    }

    /// Point the kline endpoints at a different host (tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Point the plate proxy endpoint at a different host (tests).
    #[must_use]
    pub fn with_proxy_base_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn kline_url(&self, endpoint: &str, req: &FetchRequest) -> String {
        format!(
            "{}/appstock/app/{endpoint}/get?param={},{},{},{},{},{}",
            self.base_url, req.symbol, req.freq, req.sdate, req.edate, req.days, req.fq
        )
    }

    fn plate_url(&self, req: &FetchRequest) -> String {
        format!(
            "{}/ifzqgtimg/appstock/app/newfqkline/get?_var=kline_dayqfq&param={},{},{},{},{},{}",
            self.proxy_base_url, req.symbol, req.freq, req.sdate, req.edate, req.days, req.fq
        )
    }

    fn us_minute_url(&self, symbol: &str) -> String {
        format!(
            "{}/appstock/app/UsMinute/query?_var=min_data_{}&code={symbol}",
            self.base_url,
            symbol.replace('.', "")
        )
    }

    /// Materialize a body that is either bare JSON or a `_var=` assignment,
    /// and map a non-zero vendor `code` to `DataSource`.
    fn decode_checked(body: &str) -> Result<Value, KlineError> {
        let text = if body.trim_start().starts_with('{') {
            body.trim()
        } else {
            strip_var_assign(body)?
        };
        let payload: Value =
            serde_json::from_str(text).map_err(|e| KlineError::parse(e.to_string(), body))?;
        let code = payload.get("code").and_then(Value::as_i64).unwrap_or(0);
        if code != 0 {
            let msg = payload
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(KlineError::data_source(VENDOR, format!("code {code}: {msg}")));
        }
        Ok(payload)
    }

    async fn fetch_kline(&self, endpoint: &str, req: &FetchRequest) -> Result<QuoteSeries, KlineError> {
        let body = self.http.get(&self.kline_url(endpoint, req)).await?;
        let payload = Self::decode_checked(&body)?;
        let (name, series) = parse_candles(&payload, &req.symbol, req.fq)?;
        Ok(QuoteSeries::new(&req.symbol, name, series))
    }

    async fn fetch_plate(&self, req: &FetchRequest) -> Result<QuoteSeries, KlineError> {
        let body = self.http.get(&self.plate_url(req)).await?;
        let payload = Self::decode_checked(&body)?;
        let (name, series) = parse_candles(&payload, &req.symbol, req.fq)?;
        Ok(QuoteSeries::new(&req.symbol, name, series))
    }

    async fn fetch_us_minute(&self, req: &FetchRequest) -> Result<QuoteSeries, KlineError> {
        let body = self.http.get(&self.us_minute_url(&req.symbol)).await?;
        let text = strip_var_assign(&body)?;
        let payload: Value =
            serde_json::from_str(text).map_err(|e| KlineError::parse(e.to_string(), &body))?;
        let (name, series) = parse_us_minute(&payload, &req.symbol)?;
        Ok(QuoteSeries::new(&req.symbol, name, series))
    }
}

#[async_trait]
impl CandleSource for TencentAdapter {
    async fn fetch_candles(&self, req: &FetchRequest) -> Result<QuoteSeries, KlineError> {
        match req.symbol.get(..2) {
            Some("sh" | "sz") => self.fetch_kline("newfqkline", req).await,
            Some("hk") => self.fetch_kline("hkfqkline", req).await,
            Some("us") if req.freq == Freq::Min => self.fetch_us_minute(req).await,
            Some("us") => self.fetch_kline("usfqkline", req).await,
            Some("pt") => self.fetch_plate(req).await,
            _ => Err(KlineError::data_source(
                VENDOR,
                format!("unsupported symbol: {}", req.symbol),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kline_urls_are_bit_exact() {
        let adapter = TencentAdapter::new(Arc::new(HttpClient::with_defaults().unwrap()));
        let req = FetchRequest::daily("sh600000").with_window("2024-01-02", "2024-01-05");
        assert_eq!(
            adapter.kline_url("newfqkline", &req),
            "https://web.ifzq.gtimg.cn/appstock/app/newfqkline/get?param=sh600000,day,2024-01-02,2024-01-05,320,qfq"
        );
        let req = FetchRequest::daily("usAAPL.OQ");
        assert_eq!(
            adapter.us_minute_url(&req.symbol),
            "https://web.ifzq.gtimg.cn/appstock/app/UsMinute/query?_var=min_data_usAAPLOQ&code=usAAPL.OQ"
        );
        let req = FetchRequest::daily("pt001");
        assert_eq!(
            adapter.plate_url(&req),
            "https://proxy.finance.qq.com/ifzqgtimg/appstock/app/newfqkline/get?_var=kline_dayqfq&param=pt001,day,,,320,qfq"
        );
    }

    #[test]
    fn non_zero_code_maps_to_data_source() {
        let body = r#"{"code":-1,"msg":"param error"}"#;
        assert!(matches!(
            TencentAdapter::decode_checked(body),
            Err(KlineError::DataSource { .. })
        ));
    }

    #[test]
    fn var_assignment_bodies_decode() {
        let body = r#"kline_dayqfq={"code":0,"data":{}}"#;
        assert!(TencentAdapter::decode_checked(body).is_ok());
    }
}
