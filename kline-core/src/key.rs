//! Textual cache-key parsing.

use kline_types::{Adjust, Freq};

/// Parsed cache key.
///
/// Two textual forms are accepted:
/// - full form `symbol:sdate:edate:freq:days:fq` (six segments);
/// - base form `symbol:freq:fq` (three segments), with the date window
///   supplied out of band.
///
/// Parsing is deliberately tolerant: ≥4 segments are read positionally and
/// missing trailing fields fall back to `day` / `qfq`, so keys written by
/// older callers keep resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    /// Symbol, exactly as it appears in the key.
    pub symbol: String,
    /// Start date from a full-form key, or empty.
    pub sdate: String,
    /// End date from a full-form key, or empty.
    pub edate: String,
    /// Frequency.
    pub freq: Freq,
    /// Adjustment.
    pub fq: Adjust,
}

impl CacheKey {
    /// Parse any accepted textual form.
    #[must_use]
    pub fn parse(key: &str) -> Self {
        let parts: Vec<&str> = key.split(':').collect();
        match parts.len() {
            3 => Self {
                symbol: parts[0].to_string(),
                sdate: String::new(),
                edate: String::new(),
                freq: Freq::parse_or_default(parts[1]),
                fq: Adjust::parse_or_default(parts[2]),
            },
            n if n >= 6 => Self {
                symbol: parts[0].to_string(),
                sdate: parts[1].to_string(),
                edate: parts[2].to_string(),
                freq: Freq::parse_or_default(parts[3]),
                fq: Adjust::parse_or_default(parts[5]),
            },
            n if n >= 4 => Self {
                symbol: parts[0].to_string(),
                sdate: parts[1].to_string(),
                edate: parts[2].to_string(),
                freq: Freq::parse_or_default(parts[3]),
                fq: parts
                    .get(4)
                    .map_or(Adjust::Qfq, |s| Adjust::parse_or_default(s)),
            },
            _ => Self {
                symbol: parts.first().copied().unwrap_or_default().to_string(),
                sdate: String::new(),
                edate: String::new(),
                freq: Freq::Day,
                fq: Adjust::Qfq,
            },
        }
    }

    /// Whether `key` is the three-segment base form.
    #[must_use]
    pub fn is_base_form(key: &str) -> bool {
        key.split(':').count() == 3
    }

    /// Render the base key for a `(symbol, freq, fq)` triple.
    #[must_use]
    pub fn base(symbol: &str, freq: Freq, fq: Adjust) -> String {
        format!("{symbol}:{freq}:{fq}")
    }

    /// The base key this parsed key identifies.
    #[must_use]
    pub fn base_key(&self) -> String {
        Self::base(&self.symbol, self.freq, self.fq)
    }

    /// Render the six-segment full form.
    #[must_use]
    pub fn full(symbol: &str, sdate: &str, edate: &str, freq: Freq, days: u32, fq: Adjust) -> String {
        format!("{symbol}:{sdate}:{edate}:{freq}:{days}:{fq}")
    }
}
