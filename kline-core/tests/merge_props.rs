use chrono::{DateTime, NaiveDateTime};
use kline_core::{Bar, Series};
use proptest::prelude::*;

fn ts(day: i64) -> NaiveDateTime {
    DateTime::from_timestamp(day * 86_400, 0).unwrap().naive_utc()
}

fn arb_rows() -> impl Strategy<Value = Vec<(i64, f64)>> {
    proptest::collection::vec((0i64..3_000, 0.0f64..10_000.0), 0..200)
}

fn series_of(rows: &[(i64, f64)]) -> Series {
    Series::from_rows(
        rows.iter()
            .map(|(day, close)| (ts(*day), Bar::ohlcv(1.0, *close, 2.0, 0.5, 100.0))),
    )
}

proptest! {
    #[test]
    fn merge_keeps_later_write_per_date(a in arb_rows(), b in arb_rows()) {
        let older = series_of(&a);
        let newer = series_of(&b);
        let mut merged = older.clone();
        merged.merge(newer.clone());

        // Every date from the newer series carries the newer row.
        for (date, bar) in newer.iter() {
            prop_assert_eq!(merged.get(date), Some(bar));
        }
        // Dates only the older series had survive untouched.
        for (date, bar) in older.iter() {
            if newer.get(date).is_none() {
                prop_assert_eq!(merged.get(date), Some(bar));
            }
        }
    }

    #[test]
    fn merge_output_is_strictly_sorted_and_unique(a in arb_rows(), b in arb_rows()) {
        let mut merged = series_of(&a);
        merged.merge(series_of(&b));
        let dates: Vec<_> = merged.dates().collect();
        for pair in dates.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn merge_is_idempotent(a in arb_rows()) {
        let series = series_of(&a);
        let mut twice = series.clone();
        twice.merge(series.clone());
        prop_assert_eq!(twice, series);
    }

    #[test]
    fn between_returns_exactly_the_window(a in arb_rows(), lo in 0i64..3_000, len in 0i64..500) {
        let series = series_of(&a);
        let (s, e) = (ts(lo), ts(lo + len));
        let window = series.between(Some(s), Some(e));
        for date in window.dates() {
            prop_assert!(*date >= s && *date <= e);
        }
        let expected = series.dates().filter(|d| **d >= s && **d <= e).count();
        prop_assert_eq!(window.len(), expected);
    }

    #[test]
    fn json_round_trip_preserves_rows(a in arb_rows()) {
        let series = series_of(&a);
        let json = serde_json::to_string(&series).unwrap();
        let back: Series = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, series);
    }

    #[test]
    fn warmup_count_matches_filter(a in arb_rows(), cut in 0i64..3_000) {
        let series = series_of(&a);
        prop_assert_eq!(
            series.rows_at_or_before(ts(cut)),
            series.between(None, Some(ts(cut))).len()
        );
    }
}
