//! kline-core
//!
//! Core types and logic shared across the kline workspace.
//!
//! - `series`: the ordered candle container and its merge semantics.
//! - `key`: textual cache-key parsing.
//! - `dates`: date normalization and lenient timestamp parsing.
//! - `connector`: the `CandleSource` trait vendor adapters implement.
//! - `storage`: the five-method persistence protocol backends implement.
//! - `cache`: the `QuoteCache` trait and the trivial in-memory cache.
//! - `persistent`: the range-aware cache controller over a storage backend.
//! - `extend`: the forward/backward auto-merge extension orchestrator.
#![warn(missing_docs)]

pub mod cache;
pub mod connector;
pub mod dates;
pub mod extend;
pub mod key;
pub mod persistent;
pub mod series;
pub mod storage;

pub use cache::{MemoryCache, QuoteCache};
pub use connector::{CandleSource, FetchRequest, QuoteSeries};
pub use extend::{ExtendConfig, get_price_auto_merge};
pub use key::CacheKey;
pub use kline_types::{Adjust, CacheSettings, Freq, HttpConfig, KlineError, Market};
pub use persistent::PersistentCache;
pub use series::{Bar, Series};
pub use storage::{StorageBackend, StoredEntry};
