//! Animation overlay
//!
//! A smooth, wall-clock driven perturbation added to every populated cell so
//! a polled surface appears to breathe. It depends only on the cell
//! coordinates and the instant, never on request state.

use crate::models::SurfaceGrid;
use chrono::{DateTime, Utc};

/// Perturbation strategy applied on top of a built grid
pub trait Perturbation: Send + Sync {
    fn perturb(&self, expiry: f64, moneyness: f64, at: DateTime<Utc>) -> f64;
}

/// `sin(now_ms / period_ms / 2 + expiry + moneyness) * amplitude`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveOverlay {
    pub period_ms: f64,
    pub amplitude: f64,
}

impl WaveOverlay {
    pub fn new(period_ms: f64, amplitude: f64) -> Self {
        Self {
            period_ms,
            amplitude,
        }
    }
}

impl Default for WaveOverlay {
    /// Live-path settings
    fn default() -> Self {
        Self::new(2000.0, 1.5)
    }
}

impl Perturbation for WaveOverlay {
    fn perturb(&self, expiry: f64, moneyness: f64, at: DateTime<Utc>) -> f64 {
        let phase = at.timestamp_millis() as f64 / self.period_ms;
        (phase / 2.0 + expiry + moneyness).sin() * self.amplitude
    }
}

/// Leaves the grid untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOverlay;

impl Perturbation for NoOverlay {
    fn perturb(&self, _expiry: f64, _moneyness: f64, _at: DateTime<Utc>) -> f64 {
        0.0
    }
}

/// Add the perturbation at `at` to every populated cell
pub fn apply_overlay(grid: &mut SurfaceGrid, overlay: &dyn Perturbation, at: DateTime<Utc>) {
    for ((i, j), cell) in grid.z.indexed_iter_mut() {
        if let Some(v) = cell {
            *v += overlay.perturb(grid.x[j], grid.y[i], at);
        }
    }
}
