//! The persisted record schema shared by the file-based backends.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{Local, NaiveDateTime};
use kline_core::dates::parse_date;
use kline_core::series::Series;
use kline_core::storage::StoredEntry;
use kline_types::{Adjust, Freq, KlineError};
use serde::{Deserialize, Serialize};
use tracing::warn;

const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One stored entry as it appears on disk. The series travels as base64
/// over its row-list JSON so the outer record stays one line of plain
/// ASCII-safe JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Record {
    pub cache_key: String,
    pub symbol: String,
    pub name: String,
    pub data: String,
    pub earliest_date: Option<String>,
    pub latest_date: Option<String>,
    pub freq: String,
    pub fq: String,
    pub updated_at: String,
    pub expire_at: Option<String>,
}

pub(crate) fn encode_series(series: &Series) -> Result<Vec<u8>, KlineError> {
    serde_json::to_vec(series).map_err(|e| KlineError::cache(format!("cannot encode series: {e}")))
}

pub(crate) fn decode_series(bytes: &[u8]) -> Result<Series, KlineError> {
    serde_json::from_slice(bytes)
        .map_err(|e| KlineError::cache(format!("cannot decode series: {e}")))
}

pub(crate) fn fmt_ts(ts: NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

pub(crate) fn now_ts() -> String {
    fmt_ts(Local::now().naive_local())
}

impl Record {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn build(
        base_key: &str,
        symbol: &str,
        name: &str,
        series: &Series,
        earliest: Option<&str>,
        latest: Option<&str>,
        freq: Freq,
        fq: Adjust,
        expire_at: Option<NaiveDateTime>,
    ) -> Result<Self, KlineError> {
        Ok(Self {
            cache_key: base_key.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            data: BASE64.encode(encode_series(series)?),
            earliest_date: earliest.map(str::to_string),
            latest_date: latest.map(str::to_string),
            freq: freq.to_string(),
            fq: fq.to_string(),
            updated_at: now_ts(),
            expire_at: expire_at.map(fmt_ts),
        })
    }

    /// Decode the record back into a raw entry. A record whose blob no
    /// longer decodes is treated as absent rather than fatal, so one
    /// corrupt entry cannot wedge the whole cache.
    pub(crate) fn to_entry(&self) -> Option<StoredEntry> {
        let bytes = match BASE64.decode(&self.data) {
            Ok(b) => b,
            Err(e) => {
                warn!(cache_key = %self.cache_key, error = %e, "undecodable series blob");
                return None;
            }
        };
        let series = match decode_series(&bytes) {
            Ok(s) => s,
            Err(e) => {
                warn!(cache_key = %self.cache_key, error = %e, "undecodable series blob");
                return None;
            }
        };
        Some(StoredEntry {
            symbol: self.symbol.clone(),
            name: self.name.clone(),
            series,
            expire_at: self.expire_at.as_deref().and_then(parse_date),
        })
    }

    /// Row count of the stored series, `-1` when the blob fails to decode.
    pub(crate) fn row_count(&self) -> i64 {
        BASE64
            .decode(&self.data)
            .ok()
            .and_then(|b| decode_series(&b).ok())
            .map_or(-1, |s| s.len() as i64)
    }
}
