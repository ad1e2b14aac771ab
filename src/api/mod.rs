//! Market data sources
//!
//! The surface engine only ever talks to a [`MarketDataSource`]; the handle is
//! created by the server layer and injected into the engine.

mod yahoo;

pub use yahoo::YahooClient;

use crate::error::Result;
use crate::models::{OptionChain, SpotQuote};
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Current reference price of the underlying
    async fn get_quote(&self, symbol: &str) -> Result<SpotQuote>;

    /// Listed expiration dates, nearest first
    async fn get_expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>>;

    /// Options chain for one expiration
    async fn get_chain(&self, symbol: &str, expiry: NaiveDate) -> Result<OptionChain>;
}
