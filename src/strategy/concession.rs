//! Time-dependent concession curve

use crate::error::{ParleyError, Result};
use serde::{Deserialize, Serialize};

/// Target utility at progress `t`:
/// `clip(min + (max - min) * (1 - t^(1/e)), min, max)`.
///
/// Bounds given in the wrong order are swapped; a NaN bound yields the other.
pub fn target_utility(t: f64, e: f64, min_utility: f64, max_utility: f64) -> f64 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let (lo, hi) = if min_utility <= max_utility {
        (min_utility, max_utility)
    } else {
        (max_utility, min_utility)
    };
    let conceded = t.powf(1.0 / e);
    let target = lo + (hi - lo) * (1.0 - conceded);
    target.max(lo).min(hi)
}

/// Concession settings as they appear in the agent configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcessionConfig {
    /// `e < 1` boulware, `e = 1` linear, `e > 1` conceder
    pub exponent: f64,
    /// Lowest target the agent concedes to; raised to the reservation value
    pub min_utility: f64,
}

impl Default for ConcessionConfig {
    fn default() -> Self {
        Self {
            exponent: 0.2,
            min_utility: 0.6,
        }
    }
}

/// Shape of a concession curve
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurveShape {
    Boulware,
    Linear,
    Conceder,
}

/// Concession curve with fixed exponent and utility range
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConcessionCurve {
    exponent: f64,
    min_utility: f64,
    max_utility: f64,
}

impl ConcessionCurve {
    pub fn new(exponent: f64, min_utility: f64, max_utility: f64) -> Result<Self> {
        if !exponent.is_finite() || exponent <= 0.0 {
            return Err(ParleyError::InvalidConfig(format!(
                "concession exponent must be positive, got {}",
                exponent
            )));
        }
        if !(0.0..=1.0).contains(&min_utility)
            || !(0.0..=1.0).contains(&max_utility)
            || min_utility > max_utility
        {
            return Err(ParleyError::InvalidConfig(format!(
                "concession range [{}, {}] is not within [0, 1]",
                min_utility, max_utility
            )));
        }
        Ok(Self {
            exponent,
            min_utility,
            max_utility,
        })
    }

    /// Target utility at progress `t`
    pub fn target(&self, t: f64) -> f64 {
        target_utility(t, self.exponent, self.min_utility, self.max_utility)
    }

    /// Same curve with its lower end raised to at least `floor`
    pub fn with_floor(self, floor: f64) -> Self {
        let min_utility = self.min_utility.max(floor).min(self.max_utility);
        Self {
            min_utility,
            ..self
        }
    }

    pub fn shape(&self) -> CurveShape {
        if (self.exponent - 1.0).abs() < f64::EPSILON {
            CurveShape::Linear
        } else if self.exponent < 1.0 {
            CurveShape::Boulware
        } else {
            CurveShape::Conceder
        }
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    pub fn min_utility(&self) -> f64 {
        self.min_utility
    }

    pub fn max_utility(&self) -> f64 {
        self.max_utility
    }
}
