//! Synthetic surface generator
//!
//! Builds a complete surface from closed-form harmonics of moneyness, time to
//! expiry and wall-clock time. Used whenever live data is unavailable; it
//! cannot fail.

use crate::engine::regime::RegimeThresholds;
use crate::models::{AxisSet, SurfaceGrid, SurfaceResponse};
use chrono::{DateTime, Utc};

/// Animation period of the synthetic surface
pub const FALLBACK_PERIOD_MS: f64 = 3000.0;

const BASE_VOL: f64 = 18.0;
const SKEW_SLOPE: f64 = 25.0;
const TERM_WEIGHT: f64 = 2.5;
const TERM_OFFSET: f64 = 0.1;
const NOISE_AMPLITUDE: f64 = 1.8;
const RIPPLE_AMPLITUDE: f64 = 1.2;
const PRICE_DRIFT: f64 = 0.5;

/// Reference price the synthetic market drifts around
pub fn reference_price(symbol: &str) -> f64 {
    if symbol == "SPY" {
        475.2
    } else {
        150.45
    }
}

/// Synthetic implied vol (percent) at moneyness `m`, expiry `t` and clock phase `shift`
pub fn synthetic_iv(m: f64, t: f64, shift: f64) -> f64 {
    let skew = (1.0 - m) * SKEW_SLOPE;
    let term = TERM_WEIGHT / (t + TERM_OFFSET);
    let noise = (shift + t * 5.0 + m * 10.0).sin() * NOISE_AMPLITUDE;
    let ripple = (shift * 0.5 + m * 5.0).cos() * RIPPLE_AMPLITUDE;
    round2(BASE_VOL + skew + term + noise + ripple)
}

/// Full synthetic response for `symbol` at `at`
pub fn generate(symbol: &str, at: DateTime<Utc>, thresholds: &RegimeThresholds) -> SurfaceResponse {
    let shift = at.timestamp_millis() as f64 / FALLBACK_PERIOD_MS;
    let axes = AxisSet::fixed();

    let mut surface = SurfaceGrid::unset(&axes);
    for (i, &m) in axes.moneyness_levels.iter().enumerate() {
        for (j, &t) in axes.expiries.iter().enumerate() {
            surface.z[[i, j]] = Some(synthetic_iv(m, t, shift));
        }
    }

    SurfaceResponse {
        symbol: symbol.to_string(),
        price: reference_price(symbol) + shift.sin() * PRICE_DRIFT,
        probabilities: thresholds.probabilities(&surface),
        surface,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
