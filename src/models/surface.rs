//! Surface data structures
//!
//! The grid is stored as an `Array2` indexed `[moneyness_idx, expiry_idx]`
//! and crosses the wire as nested rows, one row per moneyness level.

use crate::error::SurfaceError;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Lowest moneyness level, in hundredths
const LADDER_START: u32 = 80;
/// Highest moneyness level, in hundredths
const LADDER_END: u32 = 120;
/// Ladder step, in hundredths
const LADDER_STEP: u32 = 2;

/// Expiry schedule (years) used when the data does not supply one
pub const FIXED_EXPIRY_SCHEDULE: [f64; 7] = [0.1, 0.25, 0.5, 0.75, 1.0, 1.5, 2.0];

/// Fixed moneyness axis 0.80, 0.82, ..., 1.20.
///
/// Built from integer hundredths so every level is the exact two-decimal value.
pub fn moneyness_ladder() -> Vec<f64> {
    (LADDER_START..=LADDER_END)
        .step_by(LADDER_STEP as usize)
        .map(|h| h as f64 / 100.0)
        .collect()
}

/// The two axes of a surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSet {
    /// Ascending, distinct times to expiry in years
    pub expiries: Vec<f64>,
    /// Ascending moneyness levels
    pub moneyness_levels: Vec<f64>,
}

impl AxisSet {
    pub fn new(expiries: Vec<f64>) -> Self {
        Self {
            expiries,
            moneyness_levels: moneyness_ladder(),
        }
    }

    /// Fixed expiry schedule on the standard ladder
    pub fn fixed() -> Self {
        Self::new(FIXED_EXPIRY_SCHEDULE.to_vec())
    }
}

/// Implied volatility grid.
///
/// `x` holds expiries, `y` moneyness levels, and `z[[i, j]]` is the value at
/// (`y[i]`, `x[j]`). `None` marks a cell with no matching quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "GridWire", try_from = "GridWire")]
pub struct SurfaceGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Array2<Option<f64>>,
}

impl SurfaceGrid {
    /// Grid over `axes` with every cell unset
    pub fn unset(axes: &AxisSet) -> Self {
        Self {
            x: axes.expiries.clone(),
            y: axes.moneyness_levels.clone(),
            z: Array2::from_elem((axes.moneyness_levels.len(), axes.expiries.len()), None),
        }
    }

    /// (rows, columns) == (moneyness levels, expiries)
    pub fn dims(&self) -> (usize, usize) {
        self.z.dim()
    }

    pub fn get(&self, moneyness_idx: usize, expiry_idx: usize) -> Option<f64> {
        self.z.get((moneyness_idx, expiry_idx)).copied().flatten()
    }

    /// True when no cell is unset
    pub fn is_complete(&self) -> bool {
        self.z.iter().all(Option::is_some)
    }

    /// Iterator over populated cell values
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.z.iter().filter_map(|v| *v)
    }

    pub fn rows(&self) -> Vec<Vec<Option<f64>>> {
        self.z.outer_iter().map(|row| row.to_vec()).collect()
    }
}

#[derive(Serialize, Deserialize)]
struct GridWire {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<Vec<Option<f64>>>,
}

impl From<SurfaceGrid> for GridWire {
    fn from(grid: SurfaceGrid) -> Self {
        let z = grid.rows();
        Self {
            x: grid.x,
            y: grid.y,
            z,
        }
    }
}

impl TryFrom<GridWire> for SurfaceGrid {
    type Error = SurfaceError;

    fn try_from(wire: GridWire) -> Result<Self, Self::Error> {
        let rows = wire.y.len();
        let cols = wire.x.len();
        if wire.z.len() != rows || wire.z.iter().any(|row| row.len() != cols) {
            return Err(SurfaceError::ParseError(format!(
                "surface z must be {}x{}",
                rows, cols
            )));
        }
        let flat: Vec<Option<f64>> = wire.z.into_iter().flatten().collect();
        let z = Array2::from_shape_vec((rows, cols), flat)
            .map_err(|e| SurfaceError::ParseError(format!("Invalid surface shape: {}", e)))?;
        Ok(Self {
            x: wire.x,
            y: wire.y,
            z,
        })
    }
}

/// Share of cells in each volatility regime, in whole percent.
///
/// Each share is rounded on its own, so the sum may be 99 or 101.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeProbabilities {
    pub low: u8,
    pub med: u8,
    pub high: u8,
}

/// Response of one surface request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceResponse {
    pub symbol: String,
    pub price: f64,
    pub probabilities: RegimeProbabilities,
    pub surface: SurfaceGrid,
}
