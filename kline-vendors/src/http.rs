//! Retrying HTTP fetcher shared by every vendor adapter.

use kline_types::{HttpConfig, KlineError};
use rand::prelude::IndexedRandom;
use reqwest::header::{REFERER, USER_AGENT};
use tracing::warn;

/// Desktop browser strings the fetcher rotates through uniformly at random.
const UA_POOL: [&str; 11] = [
    "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/30.0.1599.101",
    "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/38.0.2125.122",
    "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/39.0.2171.71",
    "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/39.0.2171.95",
    "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.1 (KHTML, like Gecko) Chrome/21.0.1180.71",
    "Mozilla/4.0 (compatible; MSIE 6.0; Windows NT 5.1; SV1; QQDownload 732; .NET4.0C; .NET4.0E)",
    "Mozilla/5.0 (Windows NT 5.1; U; en; rv:1.8.1) Gecko/20061208 Firefox/2.0.0 Opera 9.50",
    "Mozilla/5.0 (Windows NT 6.1; WOW64; rv:34.0) Gecko/20100101 Firefox/34.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_12_3) AppleWebKit/534.55.3 (KHTML, like Gecko) Version/5.1.5 Safari/534.55.3",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.114 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.114 Safari/521.61",
];

fn random_ua() -> &'static str {
    UA_POOL
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(UA_POOL[0])
}

/// GET-only client with a bounded pool, per-request timeout, rotating
/// User-Agent, random referer, and linear-back-off retries. Knows nothing
/// about any vendor.
pub struct HttpClient {
    client: reqwest::Client,
    retry_times: u32,
    retry_delay: std::time::Duration,
}

impl HttpClient {
    /// Build a client from explicit configuration.
    ///
    /// # Errors
    /// `KlineError::Network` when the TLS stack cannot be initialized.
    pub fn new(cfg: &HttpConfig) -> Result<Self, KlineError> {
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .pool_max_idle_per_host(cfg.pool_size)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| KlineError::network("(client init)", 0, e.to_string()))?;
        Ok(Self {
            client,
            retry_times: cfg.retry_times.max(1),
            retry_delay: cfg.retry_delay,
        })
    }

    /// Client with environment-adjusted defaults.
    ///
    /// # Errors
    /// `KlineError::Network` when the TLS stack cannot be initialized.
    pub fn with_defaults() -> Result<Self, KlineError> {
        Self::new(&HttpConfig::from_env())
    }

    /// GET `url` and return the body. Attempt `n` sleeps
    /// `retry_delay × n` before retrying; the final failure becomes a
    /// `Network` error carrying the attempt count.
    ///
    /// The body is fully drained here, so the response (and its TLS
    /// connection) is released before any parser touches the text.
    ///
    /// # Errors
    /// `KlineError::Network` after exhausting retries.
    pub async fn get(&self, url: &str) -> Result<String, KlineError> {
        let mut last_err = String::new();
        for attempt in 1..=self.retry_times {
            let result = self
                .client
                .get(url)
                .header(USER_AGENT, random_ua())
                .header(REFERER, uuid::Uuid::new_v4().to_string())
                .send()
                .await;
            match result {
                Ok(resp) => match resp.error_for_status() {
                    Ok(resp) => match resp.text().await {
                        Ok(body) => return Ok(body),
                        Err(e) => last_err = e.to_string(),
                    },
                    Err(e) => last_err = e.to_string(),
                },
                Err(e) => last_err = e.to_string(),
            }
            if attempt < self.retry_times {
                warn!(url, attempt, error = %last_err, "fetch failed, retrying");
                tokio::time::sleep(self.retry_delay * attempt).await;
            }
        }
        Err(KlineError::network(url, self.retry_times, last_err))
    }
}
