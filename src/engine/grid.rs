//! Grid builder and gap filler
//!
//! Points are binned onto the fixed moneyness ladder and a data-driven expiry
//! axis. A point lands in a cell when its expiry equals the column exactly
//! and its moneyness lies strictly within [`BIN_TOLERANCE`] of the row level.

use crate::models::{AxisSet, RawQuotePoint, SurfaceGrid};
use std::cmp::Ordering;

/// Half-width of a moneyness bin
pub const BIN_TOLERANCE: f64 = 0.02;

/// Value written into cells no quote reached
pub const GAP_FILL_IV: f64 = 20.0;

/// Distinct expiries of `points`, ascending.
///
/// With no points the fixed schedule is used so the grid keeps its shape.
pub fn expiry_axis(points: &[RawQuotePoint]) -> Vec<f64> {
    if points.is_empty() {
        return AxisSet::fixed().expiries;
    }

    let mut expiries: Vec<f64> = points.iter().map(|p| p.time_to_expiry).collect();
    expiries.sort_by(f64::total_cmp);
    expiries.dedup();
    expiries
}

/// Best point for the cell at (`level`, `expiry`).
///
/// Among points with an exactly matching expiry and `|m - level| < 0.02`,
/// the smallest moneyness distance wins; equal distances go to the point
/// seen first.
pub fn bin_point<'a>(
    points: &'a [RawQuotePoint],
    level: f64,
    expiry: f64,
) -> Option<&'a RawQuotePoint> {
    let mut best: Option<(&RawQuotePoint, f64)> = None;
    for p in points {
        if p.time_to_expiry != expiry {
            continue;
        }
        let distance = (p.moneyness - level).abs();
        if distance >= BIN_TOLERANCE {
            continue;
        }
        match best {
            Some((_, d)) if distance.partial_cmp(&d) != Some(Ordering::Less) => {}
            _ => best = Some((p, distance)),
        }
    }
    best.map(|(p, _)| p)
}

/// Bin `points` into a grid; cells without a match stay unset
pub fn build_grid(points: &[RawQuotePoint]) -> SurfaceGrid {
    let axes = AxisSet::new(expiry_axis(points));
    let mut grid = SurfaceGrid::unset(&axes);

    for (i, &level) in axes.moneyness_levels.iter().enumerate() {
        for (j, &expiry) in axes.expiries.iter().enumerate() {
            grid.z[[i, j]] = bin_point(points, level, expiry).map(|p| p.implied_vol_pct);
        }
    }

    grid
}

/// Replace every unset cell with `default`
pub fn fill_gaps(grid: &mut SurfaceGrid, default: f64) {
    grid.z.mapv_inplace(|v| v.or(Some(default)));
}
