//! Point filter and normalizer
//!
//! Turns raw chain rows into [`RawQuotePoint`]s. Rows failing any check are
//! dropped silently; that is noise rejection, not an error.

use crate::models::{years_between, ChainQuote, OptionChain, RawQuotePoint};
use chrono::{DateTime, NaiveDate, Utc};

/// Exclusive moneyness bounds
pub const MIN_MONEYNESS: f64 = 0.80;
pub const MAX_MONEYNESS: f64 = 1.20;
/// Exclusive upper bound on implied vol, in percent
pub const MAX_IV_PCT: f64 = 200.0;

/// Normalize one row at a known time to expiry
pub fn normalize_quote(
    quote: &ChainQuote,
    reference_price: f64,
    time_to_expiry: f64,
) -> Option<RawQuotePoint> {
    let strike = quote.strike?;
    let iv = quote.implied_vol?;
    if !(iv > 0.0) || !strike.is_finite() {
        return None;
    }

    let moneyness = strike / reference_price;
    let implied_vol_pct = iv * 100.0;

    if moneyness > MIN_MONEYNESS && moneyness < MAX_MONEYNESS && implied_vol_pct < MAX_IV_PCT {
        Some(RawQuotePoint {
            time_to_expiry,
            moneyness,
            implied_vol_pct,
        })
    } else {
        None
    }
}

/// Normalize the call side of each chain.
///
/// Time to expiry is computed once per chain so every point of a chain
/// carries the bit-identical `t` the grid builder matches on. Output keeps
/// input order.
pub fn filter_points(
    reference_price: f64,
    chains: &[(NaiveDate, OptionChain)],
    now: DateTime<Utc>,
) -> Vec<RawQuotePoint> {
    if !(reference_price > 0.0) || !reference_price.is_finite() {
        return Vec::new();
    }

    chains
        .iter()
        .flat_map(|(expiry, chain)| {
            let t = years_between(now, *expiry);
            chain
                .calls
                .iter()
                .filter_map(move |q| normalize_quote(q, reference_price, t))
        })
        .collect()
}
