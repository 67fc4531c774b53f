//! Numerical tolerances
//!
//! The defaults are what every model operation uses. Functions that make
//! rank or root-grouping decisions on behalf of the caller also have a
//! variant taking an explicit `Tolerances`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tolerances used by polynomial and realization routines
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tolerances {
    /// Relative distance under which two roots count as the same root when
    /// forming least common multiples of denominators.
    pub root_merge: f64,
    /// Leading denominator coefficients smaller than this in magnitude are
    /// reported with a warning during realization.
    pub leading_coefficient_warning: f64,
    /// Multiplier on `max(rows, cols) * eps * sigma_max` for rank decisions.
    pub rank_factor: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            root_merge: 1e-6,
            leading_coefficient_warning: 1e-5,
            rank_factor: 10.0,
        }
    }
}

impl Tolerances {
    /// Rank threshold for a matrix with the given dimensions and largest
    /// singular value.
    pub fn rank_threshold(&self, rows: usize, cols: usize, sigma_max: f64) -> f64 {
        self.rank_factor * (rows.max(cols) as f64) * f64::EPSILON * sigma_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let tol = Tolerances::default();
        assert_eq!(tol.root_merge, 1e-6);
        assert_eq!(tol.leading_coefficient_warning, 1e-5);
    }

    #[test]
    fn test_rank_threshold_scales_with_sigma() {
        let tol = Tolerances::default();
        let small = tol.rank_threshold(2, 3, 1.0);
        let large = tol.rank_threshold(2, 3, 100.0);
        assert!((large / small - 100.0).abs() < 1e-9);
        assert!(small > 0.0);
    }
}
