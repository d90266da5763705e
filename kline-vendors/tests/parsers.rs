use kline_core::dates::parse_date;
use kline_types::{Adjust, KlineError};
use kline_vendors::parse::{
    parse_btc_daily, parse_btc_minute, parse_candles, parse_future_daily, parse_future_minute,
    parse_us_minute,
};
use serde_json::json;

#[test]
fn candle_parser_reads_first_six_positional_fields() {
    let payload = json!({
        "code": 0,
        "data": {
            "sh600000": {
                "qfqday": [
                    // Extra trailing fields must be ignored.
                    ["2024-01-02", "7.10", "7.20", "7.25", "7.05", "1000", "extra"],
                    ["2024-01-03", "7.20", "7.30", "7.35", "7.15", "1100"]
                ],
                "qt": { "sh600000": ["1", "浦发银行", "600000"] }
            }
        }
    });
    let (name, series) = parse_candles(&payload, "sh600000", Adjust::Qfq).unwrap();
    assert_eq!(name, "浦发银行");
    assert_eq!(series.len(), 2);
    let bar = series.get(&parse_date("2024-01-02").unwrap()).unwrap();
    assert_eq!(bar.open, 7.10);
    assert_eq!(bar.close, 7.20);
    assert_eq!(bar.high, 7.25);
    assert_eq!(bar.low, 7.05);
    assert_eq!(bar.vol, 1000.0);
}

#[test]
fn candle_parser_prefers_key_matching_the_adjustment() {
    let payload = json!({
        "data": {
            "sh600000": {
                "day": [["2024-01-02", "1", "1", "1", "1", "1"]],
                "hfqday": [["2024-01-02", "2", "2", "2", "2", "2"]]
            }
        }
    });
    let (_, series) = parse_candles(&payload, "sh600000", Adjust::Hfq).unwrap();
    assert_eq!(series.get(&parse_date("2024-01-02").unwrap()).unwrap().open, 2.0);

    let (_, series) = parse_candles(&payload, "sh600000", Adjust::Raw).unwrap();
    assert_eq!(series.get(&parse_date("2024-01-02").unwrap()).unwrap().open, 1.0);

    // qfq falls through to `day` when no qfqday key exists.
    let (_, series) = parse_candles(&payload, "sh600000", Adjust::Qfq).unwrap();
    assert_eq!(series.get(&parse_date("2024-01-02").unwrap()).unwrap().open, 1.0);
}

#[test]
fn candle_parser_coerces_invalid_numerics_to_nan() {
    let payload = json!({
        "data": {
            "sh600000": {
                "day": [["2024-01-02", "-", "7.20", "", "7.05", "n/a"]]
            }
        }
    });
    let (_, series) = parse_candles(&payload, "sh600000", Adjust::Qfq).unwrap();
    let bar = series.get(&parse_date("2024-01-02").unwrap()).unwrap();
    assert!(bar.open.is_nan());
    assert_eq!(bar.close, 7.20);
    assert!(bar.high.is_nan());
    assert!(bar.vol.is_nan());
}

#[test]
fn candle_parser_fails_loudly_without_a_frequency_key() {
    let payload = json!({ "data": { "sh600000": { "qt": {} } } });
    let err = parse_candles(&payload, "sh600000", Adjust::Qfq).unwrap_err();
    assert!(matches!(err, KlineError::Parse { .. }));
}

#[test]
fn candle_parser_fails_loudly_on_missing_symbol_block() {
    let payload = json!({ "data": {} });
    let err = parse_candles(&payload, "sh600000", Adjust::Qfq).unwrap_err();
    match err {
        KlineError::Parse { msg, .. } => assert!(msg.contains("sh600000")),
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn candle_parser_rejects_short_rows() {
    let payload = json!({
        "data": { "sh600000": { "day": [["2024-01-02", "1", "2"]] } }
    });
    assert!(parse_candles(&payload, "sh600000", Adjust::Qfq).is_err());
}

#[test]
fn future_daily_column_order_is_the_contract() {
    let payload = json!([
        ["2024-01-02", "500.0", "510.0", "495.0", "505.0", "12345", "1.1", "2.2"]
    ]);
    let series = parse_future_daily(&payload).unwrap();
    let bar = series.get(&parse_date("2024-01-02").unwrap()).unwrap();
    assert_eq!(bar.open, 500.0);
    assert_eq!(bar.high, 510.0);
    assert_eq!(bar.low, 495.0);
    assert_eq!(bar.close, 505.0);
    assert_eq!(bar.vol, 12345.0);
    assert_eq!(bar.p, Some(1.1));
    assert_eq!(bar.s, Some(2.2));
}

#[test]
fn future_minute_column_order_is_the_contract() {
    let payload = json!([
        ["2024-01-02 09:35:00", "505.0", "504.5", "321", "999", "503.0", "2024-01-02"]
    ]);
    let series = parse_future_minute(&payload).unwrap();
    let bar = series
        .get(&parse_date("2024-01-02 09:35:00").unwrap())
        .unwrap();
    assert_eq!(bar.close, 505.0);
    assert_eq!(bar.avg, Some(504.5));
    assert_eq!(bar.vol, 321.0);
    assert_eq!(bar.hold, Some(999.0));
    assert!(bar.open.is_nan());
}

#[test]
fn future_parser_rejects_non_list_payloads() {
    assert!(parse_future_daily(&json!({"data": 1})).is_err());
    assert!(parse_future_minute(&json!("rows")).is_err());
}

#[test]
fn btc_daily_is_bar_delimited_csv() {
    let data = "2024-01-01,42000,43000,41000,42500,100,4250000|2024-01-02,42500,44000,42000,43800,110,4800000";
    let series = parse_btc_daily(data).unwrap();
    assert_eq!(series.len(), 2);
    let bar = series.get(&parse_date("2024-01-02").unwrap()).unwrap();
    assert_eq!(bar.open, 42500.0);
    assert_eq!(bar.high, 44000.0);
    assert_eq!(bar.low, 42000.0);
    assert_eq!(bar.close, 43800.0);
    assert_eq!(bar.money, Some(4_800_000.0));
}

#[test]
fn btc_minute_rows_are_short_key_objects() {
    let payload = json!({
        "result": {
            "status": { "code": 0 },
            "data": [
                {"d": "2024-01-02 15:35:00", "o": "95835.37", "h": "95919.90",
                 "l": "95835.37", "c": "95919.89", "v": "6", "a": "551441.42"}
            ]
        }
    });
    let series = parse_btc_minute(&payload).unwrap();
    let bar = series
        .get(&parse_date("2024-01-02 15:35:00").unwrap())
        .unwrap();
    assert_eq!(bar.close, 95919.89);
    assert_eq!(bar.money, Some(551441.42));
}

#[test]
fn us_minute_rows_are_whitespace_split() {
    let payload = json!({
        "data": {
            "usAAPL.OQ": {
                "qt": { "usAAPL.OQ": ["200", "Apple Inc", "AAPL"] },
                "data": { "data": ["0930 185.5 1200", "0931 185.7 900"] }
            }
        }
    });
    let (name, series) = parse_us_minute(&payload, "usAAPL.OQ").unwrap();
    assert_eq!(name, "Apple Inc");
    assert_eq!(series.len(), 2);
    let (_, bar) = series.iter().next().unwrap();
    assert_eq!(bar.close, 185.5);
    assert_eq!(bar.vol, 1200.0);
}
