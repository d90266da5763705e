//! Shared fixtures: an in-memory storage backend and series builders.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{Days, NaiveDateTime};
use kline_core::dates::parse_date;
use kline_core::{Adjust, Bar, Freq, KlineError, Series, StorageBackend, StoredEntry};

#[derive(Default)]
pub struct MapBackend {
    rows: Mutex<HashMap<String, StoredEntry>>,
}

impl MapBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, base_key: &str) -> bool {
        self.rows.lock().unwrap().contains_key(base_key)
    }
}

impl StorageBackend for MapBackend {
    fn get_raw(&self, base_key: &str) -> Result<Option<StoredEntry>, KlineError> {
        Ok(self.rows.lock().unwrap().get(base_key).cloned())
    }

    fn put(
        &self,
        base_key: &str,
        symbol: &str,
        name: &str,
        series: &Series,
        _earliest: Option<&str>,
        _latest: Option<&str>,
        _freq: Freq,
        _fq: Adjust,
        expire_at: Option<NaiveDateTime>,
    ) -> Result<(), KlineError> {
        self.rows.lock().unwrap().insert(
            base_key.to_string(),
            StoredEntry {
                symbol: symbol.to_string(),
                name: name.to_string(),
                series: series.clone(),
                expire_at,
            },
        );
        Ok(())
    }

    fn delete(&self, base_key: &str) -> Result<(), KlineError> {
        self.rows.lock().unwrap().remove(base_key);
        Ok(())
    }

    fn clear(&self) -> Result<(), KlineError> {
        self.rows.lock().unwrap().clear();
        Ok(())
    }

    fn close(&self) -> Result<(), KlineError> {
        Ok(())
    }
}

pub fn d(s: &str) -> NaiveDateTime {
    parse_date(s).unwrap()
}

/// `days` consecutive calendar rows starting at `start`, with `close` set to
/// the row's offset so individual rows stay distinguishable.
pub fn daily_series(start: &str, days: usize) -> Series {
    let first = d(start);
    let mut series = Series::new();
    for i in 0..days {
        let date = first + Days::new(i as u64);
        series.insert(date, Bar::ohlcv(10.0, i as f64, 11.0, 9.0, 1000.0));
    }
    series
}
