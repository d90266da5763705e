//! The ordered candle container and its merge semantics.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::de::{SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Serde adapter mapping non-finite floats to `null` so series survive a
/// JSON round-trip. Vendors deliver malformed numerics often enough that
/// NaN cells are a normal part of a series, not an error.
mod nan_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &f64, ser: S) -> Result<S::Ok, S::Error> {
        if v.is_finite() {
            ser.serialize_some(v)
        } else {
            ser.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(de)?.unwrap_or(f64::NAN))
    }
}

/// One candle row. The five OHLCV fields are always present (possibly NaN);
/// the extras depend on the market that produced the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Opening price.
    #[serde(with = "nan_null")]
    pub open: f64,
    /// Closing price.
    #[serde(with = "nan_null")]
    pub close: f64,
    /// Highest price.
    #[serde(with = "nan_null")]
    pub high: f64,
    /// Lowest price.
    #[serde(with = "nan_null")]
    pub low: f64,
    /// Traded volume.
    #[serde(with = "nan_null")]
    pub vol: f64,
    /// Traded money amount (boards, BTC).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub money: Option<f64>,
    /// Vendor-specific percentage column (boards, futures).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<f64>,
    /// Vendor-specific settlement column (futures).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<f64>,
    /// Open interest (futures minute rows).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold: Option<f64>,
    /// Average price (futures minute rows).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
}

impl Default for Bar {
    fn default() -> Self {
        Self {
            open: f64::NAN,
            close: f64::NAN,
            high: f64::NAN,
            low: f64::NAN,
            vol: f64::NAN,
            money: None,
            p: None,
            s: None,
            hold: None,
            avg: None,
        }
    }
}

impl Bar {
    /// Build a plain OHLCV bar with no extras.
    #[must_use]
    pub fn ohlcv(open: f64, close: f64, high: f64, low: f64, vol: f64) -> Self {
        Self {
            open,
            close,
            high,
            low,
            vol,
            ..Self::default()
        }
    }
}

/// An ordered, deduplicated-by-date candle series for one
/// `(symbol, frequency, adjustment)` triple.
///
/// The `BTreeMap` keying makes the two series invariants structural: dates
/// are unique, and iteration is strictly increasing by date. Merging is
/// "later write wins" per date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    rows: BTreeMap<NaiveDateTime, Bar>,
}

impl Series {
    /// Empty series.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(date, bar)` pairs; for duplicate dates the later pair
    /// wins, matching merge semantics.
    #[must_use]
    pub fn from_rows<I: IntoIterator<Item = (NaiveDateTime, Bar)>>(rows: I) -> Self {
        Self {
            rows: rows.into_iter().collect(),
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the series has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Insert (or overwrite) a row.
    pub fn insert(&mut self, date: NaiveDateTime, bar: Bar) {
        self.rows.insert(date, bar);
    }

    /// Row for an exact date, if present.
    #[must_use]
    pub fn get(&self, date: &NaiveDateTime) -> Option<&Bar> {
        self.rows.get(date)
    }

    /// Earliest date in the series.
    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDateTime> {
        self.rows.keys().next().copied()
    }

    /// Latest date in the series.
    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDateTime> {
        self.rows.keys().next_back().copied()
    }

    /// Iterate rows in date order.
    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, NaiveDateTime, Bar> {
        self.rows.iter()
    }

    /// Iterate dates in order.
    pub fn dates(&self) -> impl Iterator<Item = &NaiveDateTime> {
        self.rows.keys()
    }

    /// Merge `newer` into `self`; for any date present in both, the row from
    /// `newer` wins.
    pub fn merge(&mut self, newer: Self) {
        self.rows.extend(newer.rows);
    }

    /// Rows whose date falls inside the inclusive `[sdate, edate]` window;
    /// an absent bound leaves that side open.
    #[must_use]
    pub fn between(&self, sdate: Option<NaiveDateTime>, edate: Option<NaiveDateTime>) -> Self {
        let rows = self
            .rows
            .iter()
            .filter(|(d, _)| sdate.is_none_or(|s| **d >= s) && edate.is_none_or(|e| **d <= e))
            .map(|(d, b)| (*d, b.clone()))
            .collect();
        Self { rows }
    }

    /// Count of rows dated at or before `edate`; the warmup measure the
    /// extension orchestrator stops on.
    #[must_use]
    pub fn rows_at_or_before(&self, edate: NaiveDateTime) -> usize {
        self.rows.range(..=edate).count()
    }
}

/// Persisted row shape: the date plus the flattened bar columns. Keeping the
/// encoding an explicit row list (rather than a map keyed by formatted
/// dates) makes the stored bytes self-describing and stable across versions.
#[derive(Serialize, Deserialize)]
struct Row {
    date: NaiveDateTime,
    #[serde(flatten)]
    bar: Bar,
}

impl Serialize for Series {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        let mut seq = ser.serialize_seq(Some(self.rows.len()))?;
        for (date, bar) in &self.rows {
            seq.serialize_element(&Row {
                date: *date,
                bar: bar.clone(),
            })?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Series {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        struct RowsVisitor;

        impl<'de> Visitor<'de> for RowsVisitor {
            type Value = Series;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a sequence of candle rows")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Series, A::Error> {
                let mut series = Series::new();
                while let Some(row) = seq.next_element::<Row>()? {
                    series.insert(row.date, row.bar);
                }
                Ok(series)
            }
        }

        de.deserialize_seq(RowsVisitor)
    }
}
