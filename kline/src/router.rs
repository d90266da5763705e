//! Symbol routing: prefix conventions to markets, plus US venue-suffix
//! candidates.

use kline_types::{KlineError, Market};

fn pad_hk(symbol: &str) -> String {
    // A 4-digit body is zero-padded to the 5 digits the vendor expects.
    let body = &symbol[2..];
    if body.len() == 4 && body.bytes().all(|b| b.is_ascii_digit()) {
        format!("hk0{body}")
    } else {
        symbol.to_string()
    }
}

/// Map a user symbol to `(market, normalized symbol)`. First match wins:
/// `BK…` board, `pt…` plate, `fu…` + BTC body, `fu…` future, `sh`/`sz`
/// mainland, `hk` (zero-padded), `us`, then bare mainland codes (`5`/`6` →
/// `sh…`, `0`/`1`/`3` → `sz…`).
///
/// # Errors
/// `KlineError::Symbol` for anything no rule claims.
pub fn route(symbol: &str) -> Result<(Market, String), KlineError> {
    if symbol.starts_with("BK") {
        return Ok((Market::Board, symbol.to_string()));
    }
    if symbol.starts_with("pt") {
        return Ok((Market::Plate, symbol.to_string()));
    }
    if let Some(body) = symbol.strip_prefix("fu") {
        if body.len() >= 3 && body[..3].eq_ignore_ascii_case("btc") {
            return Ok((Market::Btc, symbol.to_string()));
        }
        return Ok((Market::Future, symbol.to_string()));
    }
    match symbol.get(..2) {
        Some("sh" | "sz") => Ok((Market::Mainland, symbol.to_string())),
        Some("hk") => Ok((Market::HongKong, pad_hk(symbol))),
        Some("us") => Ok((Market::Us, symbol.to_string())),
        _ => match symbol.as_bytes().first() {
            Some(b'5' | b'6') => Ok((Market::Mainland, format!("sh{symbol}"))),
            Some(b'0' | b'1' | b'3') => Ok((Market::Mainland, format!("sz{symbol}"))),
            _ => Err(KlineError::symbol(format!(
                "target market not supported: {symbol}"
            ))),
        },
    }
}

/// Venue-suffix candidates for an ambiguous US code. A symbol that already
/// carries a suffix is its own only candidate; bare codes are probed
/// against `.OQ` and `.N`, and the caller keeps the richer response.
#[must_use]
pub fn us_candidates(symbol: &str) -> Vec<String> {
    let body = symbol.strip_prefix("us").unwrap_or(symbol);
    if body.contains('.') {
        vec![symbol.to_string()]
    } else {
        vec![format!("{symbol}.OQ"), format!("{symbol}.N")]
    }
}
