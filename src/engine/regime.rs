use crate::models::{RegimeProbabilities, SurfaceGrid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Low,
    Med,
    High,
}

/// Regime boundaries in implied vol percent.
///
/// `iv < low_below` is low, `iv < high_from` is med, anything else is high.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeThresholds {
    pub low_below: f64,
    pub high_from: f64,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        Self {
            low_below: 18.0,
            high_from: 25.0,
        }
    }
}

impl RegimeThresholds {
    pub fn classify(&self, iv: f64) -> Regime {
        if iv < self.low_below {
            Regime::Low
        } else if iv < self.high_from {
            Regime::Med
        } else {
            Regime::High
        }
    }

    /// Percentage of cells per regime, each rounded half away from zero.
    ///
    /// Unset cells are not counted; an empty grid yields 0/0/0.
    pub fn probabilities(&self, grid: &SurfaceGrid) -> RegimeProbabilities {
        let (mut low, mut med, mut high) = (0usize, 0usize, 0usize);
        for iv in grid.values() {
            match self.classify(iv) {
                Regime::Low => low += 1,
                Regime::Med => med += 1,
                Regime::High => high += 1,
            }
        }

        let total = low + med + high;
        if total == 0 {
            return RegimeProbabilities::default();
        }

        let pct = |n: usize| ((n as f64 / total as f64) * 100.0).round() as u8;
        RegimeProbabilities {
            low: pct(low),
            med: pct(med),
            high: pct(high),
        }
    }
}
