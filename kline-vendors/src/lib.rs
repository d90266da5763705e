//! kline-vendors
//!
//! Vendor adapters that turn candle endpoints into `CandleSource`
//! implementations:
//!
//! - [`TencentAdapter`]: mainland / Hong Kong / US fq-kline endpoints, US
//!   minute quotes and the plate proxy endpoint.
//! - [`SinaAdapter`]: futures daily/minute and the BTC pseudo-future.
//! - [`EastmoneyAdapter`]: sector-board history (soft-fail).
//!
//! All adapters share one [`HttpClient`] (rotating UA, retries with linear
//! back-off) and delegate body handling to the `envelope`/`parse` modules.
#![warn(missing_docs)]

pub mod envelope;
pub mod http;
pub mod parse;

mod eastmoney;
mod sina;
mod tencent;

pub use eastmoney::EastmoneyAdapter;
pub use http::HttpClient;
pub use sina::SinaAdapter;
pub use tencent::TencentAdapter;
