use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest fragment of an offending vendor body kept inside a `Parse` error.
const FRAGMENT_LIMIT: usize = 160;

/// Unified error type for the kline workspace.
///
/// Every failure surfaced by the library is one of these kinds: bad user
/// input (`Symbol`), transport failure after retries (`Network`), a vendor
/// answering with garbage or an explicit error code (`DataSource`), a body
/// whose shape the parsers do not recognize (`Parse`), or persistence I/O
/// (`Cache`).
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KlineError {
    /// Unsupported symbol prefix or unrecognized date argument.
    #[error("bad symbol or date: {0}")]
    Symbol(String),

    /// The HTTP fetcher exhausted its retries.
    #[error("network failure for {url} after {attempts} attempts: {msg}")]
    Network {
        /// URL that could not be fetched.
        url: String,
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Final transport error message.
        msg: String,
    },

    /// A vendor returned a non-zero status code, an empty payload, or a
    /// truncated body.
    #[error("{vendor} returned bad data: {msg}")]
    DataSource {
        /// Vendor name (e.g. "tencent", "sina", "eastmoney").
        vendor: String,
        /// Human-readable error message.
        msg: String,
    },

    /// A response body did not match the expected wire shape.
    #[error("parse failure: {msg}; fragment: {fragment}")]
    Parse {
        /// What the parser was looking for.
        msg: String,
        /// Truncated slice of the offending body.
        fragment: String,
    },

    /// Storage backend I/O failure.
    #[error("cache failure: {0}")]
    Cache(String),
}

impl KlineError {
    /// Helper: build a `Symbol` error.
    pub fn symbol(msg: impl Into<String>) -> Self {
        Self::Symbol(msg.into())
    }

    /// Helper: build a `Network` error.
    pub fn network(url: impl Into<String>, attempts: u32, msg: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            attempts,
            msg: msg.into(),
        }
    }

    /// Helper: build a `DataSource` error.
    pub fn data_source(vendor: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::DataSource {
            vendor: vendor.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `Parse` error, truncating the offending fragment so
    /// multi-megabyte bodies never end up inside error values.
    pub fn parse(msg: impl Into<String>, fragment: &str) -> Self {
        let fragment = if fragment.len() > FRAGMENT_LIMIT {
            let mut end = FRAGMENT_LIMIT;
            while !fragment.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}…", &fragment[..end])
        } else {
            fragment.to_string()
        };
        Self::Parse {
            msg: msg.into(),
            fragment,
        }
    }

    /// Helper: build a `Cache` error.
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Whether the orchestrator should treat this failure as "this fetch
    /// produced nothing" rather than aborting the whole request.
    #[must_use]
    pub const fn is_empty_fetch(&self) -> bool {
        matches!(self, Self::DataSource { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fragment_is_truncated() {
        let body = "x".repeat(1000);
        let err = KlineError::parse("no freq key", &body);
        match err {
            KlineError::Parse { fragment, .. } => assert!(fragment.len() < 200),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn display_names_the_kind() {
        let err = KlineError::network("http://x", 3, "timed out");
        assert!(err.to_string().contains("after 3 attempts"));
        assert!(KlineError::symbol("zz0001").to_string().contains("zz0001"));
    }
}
