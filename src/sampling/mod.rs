//! Sampling and Discretization Metadata
//!
//! Every model is either continuous-time (sampling set `R`) or
//! discrete-time with a positive sampling period (sampling set `Z`).
//! Discrete models may additionally record how they were obtained from a
//! continuous one; that record is what an undiscretization routine would
//! consult.

use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Time domain of a model
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Sampling {
    #[default]
    Continuous,
    /// Sampling period in seconds
    Discrete(f64),
}

impl Sampling {
    /// Discrete sampling with period `dt`.
    ///
    /// # Errors
    ///
    /// `ModelError::InvalidSamplingPeriod` unless `dt` is finite and
    /// strictly positive.
    pub fn discrete(dt: f64) -> Result<Self> {
        if dt.is_finite() && dt > 0.0 {
            Ok(Sampling::Discrete(dt))
        } else {
            Err(ModelError::InvalidSamplingPeriod(dt))
        }
    }

    /// Sampling period, `None` for continuous-time models
    pub fn period(&self) -> Option<f64> {
        match self {
            Sampling::Continuous => None,
            Sampling::Discrete(dt) => Some(*dt),
        }
    }

    pub fn set(&self) -> SamplingSet {
        match self {
            Sampling::Continuous => SamplingSet::R,
            Sampling::Discrete(_) => SamplingSet::Z,
        }
    }

    pub fn is_discrete(&self) -> bool {
        matches!(self, Sampling::Discrete(_))
    }
}

/// `R` for continuous-time, `Z` for discrete-time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SamplingSet {
    R,
    Z,
}

impl fmt::Display for SamplingSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingSet::R => write!(f, "R"),
            SamplingSet::Z => write!(f, "Z"),
        }
    }
}

/// Known continuous-to-discrete mappings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DiscretizationMethod {
    Tustin,
    Zoh,
    Foh,
    ForwardEuler,
    BackwardEuler,
    /// Generic linear fractional transformation given by a matrix
    Lft,
}

impl FromStr for DiscretizationMethod {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tustin" | "bilinear" | "trapezoidal" => Ok(Self::Tustin),
            "zoh" => Ok(Self::Zoh),
            "foh" => Ok(Self::Foh),
            "forward euler" | "forward difference" | "forward rectangular" | ">>" => {
                Ok(Self::ForwardEuler)
            }
            "backward euler" | "backward difference" | "backward rectangular" | "<<" => {
                Ok(Self::BackwardEuler)
            }
            "lft" => Ok(Self::Lft),
            other => Err(ModelError::Discretization(format!(
                "unknown discretization method '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for DiscretizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tustin => "tustin",
            Self::Zoh => "zoh",
            Self::Foh => "foh",
            Self::ForwardEuler => "forward euler",
            Self::BackwardEuler => "backward euler",
            Self::Lft => "lft",
        };
        write!(f, "{}", name)
    }
}

/// How a discrete model was obtained.
///
/// All setters check the rules against the model's current sampling, so
/// they take it as an argument.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Discretization {
    method: Option<DiscretizationMethod>,
    matrix: Option<Array2<f64>>,
    prewarp_frequency: Option<f64>,
}

impl Discretization {
    pub fn method(&self) -> Option<DiscretizationMethod> {
        self.method
    }

    /// LFT interconnection matrix, only present for `Lft`
    pub fn matrix(&self) -> Option<&Array2<f64>> {
        self.matrix.as_ref()
    }

    pub fn prewarp_frequency(&self) -> Option<f64> {
        self.prewarp_frequency
    }

    /// Record the discretization method.
    ///
    /// Switching methods drops a previously set matrix or prewarp
    /// frequency that no longer applies.
    ///
    /// # Errors
    ///
    /// `ModelError::Discretization` for continuous-time models.
    pub fn set_method(&mut self, sampling: Sampling, method: DiscretizationMethod) -> Result<()> {
        if !sampling.is_discrete() {
            return Err(ModelError::Discretization(
                "a continuous-time model has no discretization method; discretize it first"
                    .to_string(),
            ));
        }

        if method == DiscretizationMethod::Lft {
            log::info!("the lft method also needs an interconnection matrix; set it as well");
        } else {
            self.matrix = None;
        }
        if method != DiscretizationMethod::Tustin {
            self.prewarp_frequency = None;
        }
        self.method = Some(method);
        Ok(())
    }

    /// Set the LFT interconnection matrix `Q` of `1/s I = 1/z I * Q`.
    ///
    /// # Errors
    ///
    /// `ModelError::Discretization` unless the method is `Lft`, and
    /// `ModelError::Dimension` if `q` is not square.
    pub fn set_matrix(&mut self, q: Array2<f64>) -> Result<()> {
        if self.method != Some(DiscretizationMethod::Lft) {
            return Err(ModelError::Discretization(
                "a discretization matrix only applies to the lft method".to_string(),
            ));
        }
        if q.nrows() != q.ncols() {
            return Err(ModelError::Dimension(format!(
                "discretization matrix must be square, got {}x{}",
                q.nrows(),
                q.ncols()
            )));
        }
        self.matrix = Some(q);
        Ok(())
    }

    /// Set the Tustin prewarp frequency (Hz).
    ///
    /// # Errors
    ///
    /// `ModelError::Discretization` unless the method is `Tustin` and
    /// `0 < w < 1/(2 dt)`.
    pub fn set_prewarp_frequency(&mut self, sampling: Sampling, w: f64) -> Result<()> {
        if self.method != Some(DiscretizationMethod::Tustin) {
            return Err(ModelError::Discretization(
                "prewarping only applies to the Tustin approximation".to_string(),
            ));
        }
        let dt = sampling.period().ok_or_else(|| {
            ModelError::Discretization("continuous-time model cannot be prewarped".to_string())
        })?;
        let nyquist = 1.0 / (2.0 * dt);
        if !(w > 0.0 && w < nyquist) {
            return Err(ModelError::Discretization(format!(
                "prewarp frequency must satisfy 0 < w < 1/(2*dt) = {} Hz, got {}",
                nyquist, w
            )));
        }
        self.prewarp_frequency = Some(w);
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Fail unless both models share the same sampling
pub(crate) fn ensure_same_sampling(
    left: Sampling,
    right: Sampling,
    operation: &'static str,
) -> Result<()> {
    if left == right {
        Ok(())
    } else {
        Err(ModelError::SamplingMismatch { operation })
    }
}
