use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_YEAR: f64 = 365.0 * 24.0 * 60.0 * 60.0;

/// Spot quote for an underlying
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotQuote {
    pub symbol: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

/// One contract row of an options chain as delivered by the data source.
///
/// Both fields are optional because upstream feeds routinely omit them;
/// `implied_vol` is a fraction (0.20 == 20%).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainQuote {
    pub strike: Option<f64>,
    pub implied_vol: Option<f64>,
}

impl ChainQuote {
    pub fn new(strike: f64, implied_vol: f64) -> Self {
        Self {
            strike: Some(strike),
            implied_vol: Some(implied_vol),
        }
    }
}

/// Options chain for a single expiry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionChain {
    pub expiry: Option<NaiveDate>,
    pub calls: Vec<ChainQuote>,
    pub puts: Vec<ChainQuote>,
}

impl OptionChain {
    pub fn new(expiry: NaiveDate) -> Self {
        Self {
            expiry: Some(expiry),
            calls: Vec::new(),
            puts: Vec::new(),
        }
    }
}

/// A filtered, normalized quote ready for binning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawQuotePoint {
    /// Time to expiry in years, never negative
    pub time_to_expiry: f64,
    /// strike / reference price
    pub moneyness: f64,
    /// Implied volatility in percent
    pub implied_vol_pct: f64,
}

/// Year fraction between `now` and the start of `expiry` (UTC), clamped at zero
pub fn years_between(now: DateTime<Utc>, expiry: NaiveDate) -> f64 {
    let expiry = expiry.and_time(NaiveTime::MIN).and_utc();
    if now >= expiry {
        return 0.0;
    }
    (expiry - now).num_seconds() as f64 / SECONDS_PER_YEAR
}
