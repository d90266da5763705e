//! Fetch a daily series through a persistent SQLite cache and print the
//! last few bars. Run it twice: the second run answers from `~/.kline`.
//!
//! ```bash
//! cargo run --example 01_basic_price
//! ```

use kline::{BackendKind, Kline, PriceQuery, create_persistent_cache};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let kline = Kline::builder()
        .persistent_cache(create_persistent_cache(BackendKind::Sqlite, None, None)?)
        .build()?;

    let result = kline
        .get_price(
            "sh600000",
            &PriceQuery::new().sdate("2024-01-02").edate("2024-03-01"),
        )
        .await?;

    println!("{} {} ({} bars)", result.symbol, result.name, result.series.len());
    for (date, bar) in result.series.iter().rev().take(5) {
        println!("{date}  o={:.2} c={:.2} h={:.2} l={:.2}", bar.open, bar.close, bar.high, bar.low);
    }
    Ok(())
}
