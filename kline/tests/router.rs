use kline::{Market, route, us_candidates};
use kline_types::KlineError;

#[test]
fn prefix_table_first_match_wins() {
    assert_eq!(route("BK0420").unwrap(), (Market::Board, "BK0420".to_string()));
    assert_eq!(route("pt110").unwrap(), (Market::Plate, "pt110".to_string()));
    assert_eq!(route("fuBTC").unwrap(), (Market::Btc, "fuBTC".to_string()));
    assert_eq!(route("fubtcusd").unwrap(), (Market::Btc, "fubtcusd".to_string()));
    assert_eq!(route("fuSC2109").unwrap(), (Market::Future, "fuSC2109".to_string()));
    assert_eq!(route("sh600000").unwrap(), (Market::Mainland, "sh600000".to_string()));
    assert_eq!(route("sz000001").unwrap(), (Market::Mainland, "sz000001".to_string()));
    assert_eq!(route("usTSLA").unwrap(), (Market::Us, "usTSLA".to_string()));
}

#[test]
fn bare_mainland_codes_gain_a_prefix() {
    assert_eq!(route("600000").unwrap(), (Market::Mainland, "sh600000".to_string()));
    assert_eq!(route("510300").unwrap(), (Market::Mainland, "sh510300".to_string()));
    assert_eq!(route("000001").unwrap(), (Market::Mainland, "sz000001".to_string()));
    assert_eq!(route("159915").unwrap(), (Market::Mainland, "sz159915".to_string()));
    assert_eq!(route("300750").unwrap(), (Market::Mainland, "sz300750".to_string()));
}

#[test]
fn hk_four_digit_bodies_are_zero_padded() {
    assert_eq!(route("hk0700").unwrap(), (Market::HongKong, "hk00700".to_string()));
    assert_eq!(route("hk00700").unwrap(), (Market::HongKong, "hk00700".to_string()));
}

#[test]
fn unsupported_symbols_error() {
    for symbol in ["", "xx1234", "7abc", "AAPL"] {
        assert!(
            matches!(route(symbol), Err(KlineError::Symbol(_))),
            "{symbol:?} should be unsupported"
        );
    }
}

#[test]
fn us_suffix_candidates() {
    assert_eq!(
        us_candidates("usTSLA"),
        vec!["usTSLA.OQ".to_string(), "usTSLA.N".to_string()]
    );
    assert_eq!(us_candidates("usAAPL.OQ"), vec!["usAAPL.OQ".to_string()]);
}
