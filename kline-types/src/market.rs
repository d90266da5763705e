use serde::{Deserialize, Serialize};

use crate::KlineError;

/// Venue family a symbol resolves to. Routing happens in the facade crate;
/// this enum is only the vocabulary it speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Market {
    /// Mainland exchanges (`sh…` / `sz…`).
    Mainland,
    /// Hong Kong (`hk…`).
    HongKong,
    /// United States (`us…`).
    Us,
    /// Generic future (`fu…`).
    Future,
    /// BTC pseudo-future (`fuBTC…`), served by a separate endpoint.
    Btc,
    /// Sector board (`BK…`), list-rank service with its own URL schema.
    Board,
    /// Plate index (`pt…`), qfq-kline endpoint with an alternate envelope.
    Plate,
}

impl Market {
    /// Shard name used by the market-sharded storage backend.
    #[must_use]
    pub const fn shard(self) -> &'static str {
        match self {
            Self::HongKong => "hk",
            Self::Us => "us",
            Self::Future | Self::Btc => "fu",
            Self::Mainland | Self::Board | Self::Plate => "cn",
        }
    }
}

/// Candle frequency. `Min` is never written to persistent storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Freq {
    /// Daily bars.
    #[default]
    Day,
    /// Weekly bars.
    Week,
    /// Monthly bars.
    Month,
    /// Intraday minute bars.
    Min,
}

impl Freq {
    /// Wire string the vendors expect.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Min => "min",
        }
    }

    /// Parse a wire string. `min`, `1min` and `minute` all mean `Min`.
    ///
    /// # Errors
    /// Returns `KlineError::Symbol` for anything else.
    pub fn parse(s: &str) -> Result<Self, KlineError> {
        match s {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "min" | "1min" | "minute" => Ok(Self::Min),
            other => Err(KlineError::symbol(format!("unknown frequency: {other}"))),
        }
    }

    /// Lenient variant used when re-reading textual cache keys: unknown
    /// strings fall back to `Day`, matching the key parser's defaults.
    #[must_use]
    pub fn parse_or_default(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }
}

impl std::fmt::Display for Freq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price adjustment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Adjust {
    /// Forward-adjusted prices.
    #[default]
    Qfq,
    /// Back-adjusted prices.
    Hfq,
    /// Raw, unadjusted prices (empty wire string).
    Raw,
}

impl Adjust {
    /// Wire string the vendors expect; raw prices are the empty string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Qfq => "qfq",
            Self::Hfq => "hfq",
            Self::Raw => "",
        }
    }

    /// Parse a wire string.
    ///
    /// # Errors
    /// Returns `KlineError::Symbol` for unknown adjustments.
    pub fn parse(s: &str) -> Result<Self, KlineError> {
        match s {
            "qfq" => Ok(Self::Qfq),
            "hfq" => Ok(Self::Hfq),
            "" => Ok(Self::Raw),
            other => Err(KlineError::symbol(format!("unknown adjustment: {other}"))),
        }
    }

    /// Lenient variant for textual cache keys; unknown strings mean `Qfq`.
    #[must_use]
    pub fn parse_or_default(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }
}

impl std::fmt::Display for Adjust {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
