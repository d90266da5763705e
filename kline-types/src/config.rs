//! Configuration shared by the HTTP fetcher and the facade's default cache.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok()?.trim().parse().ok()
}

/// HTTP fetcher defaults. All vendors share one pool built from this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Total attempts before a fetch becomes a `Network` error.
    pub retry_times: u32,
    /// Base back-off; attempt `n` waits `retry_delay × n`.
    pub retry_delay: Duration,
    /// Maximum idle connections kept per host.
    pub pool_size: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retry_times: 3,
            retry_delay: Duration::from_secs(1),
            pool_size: 10,
        }
    }
}

impl HttpConfig {
    /// Defaults with `KLINE_HTTP_TIMEOUT` (seconds) and `KLINE_RETRY_TIMES`
    /// environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(secs) = env_u64("KLINE_HTTP_TIMEOUT") {
            cfg.timeout = Duration::from_secs(secs);
        }
        if let Some(times) = env_u64("KLINE_RETRY_TIMES") {
            cfg.retry_times = times.min(u64::from(u32::MAX)) as u32;
        }
        cfg
    }
}

/// Defaults for the facade's implicit cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Whether the facade creates a memory cache when none is supplied.
    pub enabled: bool,
    /// Default time-to-live for cached entries.
    pub ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheSettings {
    /// Defaults with `KLINE_CACHE_ENABLED` and `KLINE_CACHE_TTL` (seconds)
    /// environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("KLINE_CACHE_ENABLED") {
            cfg.enabled = v.trim().eq_ignore_ascii_case("true");
        }
        if let Some(secs) = env_u64("KLINE_CACHE_TTL") {
            cfg.ttl = Duration::from_secs(secs);
        }
        cfg
    }
}
