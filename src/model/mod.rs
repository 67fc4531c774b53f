//! Mixed Models and Pole Analysis
//!
//! `Lti` lets callers combine transfer and state models without caring
//! which representation each operand uses. Whenever a `State` takes part,
//! the other operand is realized and the result is a `State`.

use std::fmt::Write as _;

use num_complex::Complex64;

use crate::convert::{state_to_transfer, transfer_to_state};
use crate::error::Result;
use crate::sampling::Sampling;
use crate::state::State;
use crate::transfer::Transfer;

/// Natural frequency and damping of a single pole
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoleProperty {
    pub pole: Complex64,
    /// rad/s
    pub natural_frequency: f64,
    /// NaN for pure integrators
    pub damping: f64,
}

/// Compute natural frequencies and damping ratios.
///
/// For continuous-time poles `wn = |p|` and `zeta = -Re(p) / |p|`.
/// Discrete-time poles are first mapped to the s-plane through
/// `ln(p) / dt`. Poles at the integrator location (`s = 0`, or `z = 1`)
/// get frequency 0 and damping NaN. A discrete pole at `z = 0` maps to
/// `s = -inf` and gets an infinite frequency and damping NaN.
///
/// # Examples
///
/// ```
/// use lti_rs::{pole_properties, Sampling};
/// use num_complex::Complex64;
///
/// let props = pole_properties(&[Complex64::new(-1.0, 1.0)], Sampling::Continuous);
/// assert!((props[0].natural_frequency - 2f64.sqrt()).abs() < 1e-12);
/// assert!((props[0].damping - 1.0 / 2f64.sqrt()).abs() < 1e-12);
/// ```
pub fn pole_properties(poles: &[Complex64], sampling: Sampling) -> Vec<PoleProperty> {
    poles
        .iter()
        .map(|&pole| {
            let s = match sampling {
                Sampling::Continuous => pole,
                Sampling::Discrete(dt) => {
                    if pole.norm() == 0.0 {
                        // z = 0 maps to s = -inf
                        return PoleProperty {
                            pole,
                            natural_frequency: f64::INFINITY,
                            damping: f64::NAN,
                        };
                    }
                    pole.ln() / dt
                }
            };

            let wn = s.norm();
            if wn == 0.0 {
                PoleProperty {
                    pole,
                    natural_frequency: 0.0,
                    damping: f64::NAN,
                }
            } else {
                PoleProperty {
                    pole,
                    natural_frequency: wn,
                    damping: -s.re / wn,
                }
            }
        })
        .collect()
}

/// All poles strictly inside the stability region. A model without poles
/// is stable.
pub(crate) fn poles_are_stable(poles: &[Complex64], sampling: Sampling) -> bool {
    match sampling {
        Sampling::Continuous => poles.iter().all(|p| p.re < 0.0),
        Sampling::Discrete(_) => poles.iter().all(|p| p.norm() < 1.0),
    }
}

/// Description header shared by the model `Display` impls
pub(crate) fn header(kind: &str, sampling: Sampling) -> String {
    match sampling {
        Sampling::Continuous => format!("Continuous-Time {}\n", kind),
        Sampling::Discrete(dt) => format!(
            "Discrete-Time {} with sampling time: {:.3} ({:.3} Hz.)\n",
            kind,
            dt,
            1.0 / dt
        ),
    }
}

/// Four-column table of poles and zeros, padded where one list is shorter
pub(crate) fn pole_zero_table(poles: &[Complex64], zeros: &[Complex64]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>12}  {:>12}  {:>12}  {:>12}",
        "Poles(real)", "Poles(imag)", "Zeros(real)", "Zeros(imag)"
    );
    let _ = writeln!(out, "{}", "-".repeat(54));

    let cell = |z: Option<&Complex64>| match z {
        Some(z) => (format!("{:12.6}", z.re), format!("{:12.6}", z.im)),
        None => (" ".repeat(12), " ".repeat(12)),
    };
    for k in 0..poles.len().max(zeros.len()) {
        let (pr, pi) = cell(poles.get(k));
        let (zr, zi) = cell(zeros.get(k));
        let _ = writeln!(out, "{}  {}  {}  {}", pr, pi, zr, zi);
    }
    out
}

/// Either representation of an LTI model
#[derive(Clone, Debug)]
pub enum Lti {
    Transfer(Transfer),
    State(State),
}

impl From<Transfer> for Lti {
    fn from(g: Transfer) -> Self {
        Lti::Transfer(g)
    }
}

impl From<State> for Lti {
    fn from(g: State) -> Self {
        Lti::State(g)
    }
}

impl Lti {
    /// `(outputs, inputs)`
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Lti::Transfer(g) => g.shape(),
            Lti::State(g) => g.shape(),
        }
    }

    pub fn sampling(&self) -> Sampling {
        match self {
            Lti::Transfer(g) => g.sampling(),
            Lti::State(g) => g.sampling(),
        }
    }

    pub fn poles(&self) -> &[Complex64] {
        match self {
            Lti::Transfer(g) => g.poles(),
            Lti::State(g) => g.poles(),
        }
    }

    pub fn zeros(&self) -> &[Complex64] {
        match self {
            Lti::Transfer(g) => g.zeros(),
            Lti::State(g) => g.zeros(),
        }
    }

    pub fn is_stable(&self) -> bool {
        match self {
            Lti::Transfer(g) => g.is_stable(),
            Lti::State(g) => g.is_stable(),
        }
    }

    pub fn to_state(&self) -> Result<State> {
        match self {
            Lti::Transfer(g) => transfer_to_state(g),
            Lti::State(g) => Ok(g.clone()),
        }
    }

    pub fn to_transfer(&self) -> Result<Transfer> {
        match self {
            Lti::Transfer(g) => Ok(g.clone()),
            Lti::State(g) => state_to_transfer(g),
        }
    }

    pub fn neg(&self) -> Lti {
        match self {
            Lti::Transfer(g) => Lti::Transfer(-g),
            Lti::State(g) => Lti::State(-g),
        }
    }

    /// Parallel connection `self + other`
    pub fn try_add(&self, other: &Lti) -> Result<Lti> {
        match (self, other) {
            (Lti::Transfer(g), Lti::Transfer(h)) => Ok(Lti::Transfer(g.try_add(h)?)),
            _ => Ok(Lti::State(self.to_state()?.try_add(&other.to_state()?)?)),
        }
    }

    pub fn try_sub(&self, other: &Lti) -> Result<Lti> {
        self.try_add(&other.neg())
    }

    /// Entrywise product
    pub fn mul_elementwise(&self, other: &Lti) -> Result<Lti> {
        match (self, other) {
            (Lti::Transfer(g), Lti::Transfer(h)) => Ok(Lti::Transfer(g.mul_elementwise(h)?)),
            _ => Ok(Lti::State(
                self.to_state()?.mul_elementwise(&other.to_state()?)?,
            )),
        }
    }

    /// Series connection `self * other` (other acts first)
    pub fn matmul(&self, other: &Lti) -> Result<Lti> {
        match (self, other) {
            (Lti::Transfer(g), Lti::Transfer(h)) => Ok(Lti::Transfer(g.matmul(h)?)),
            _ => Ok(Lti::State(self.to_state()?.matmul(&other.to_state()?)?)),
        }
    }
}
