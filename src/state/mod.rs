//! State-Space Models
//!
//! A `State` holds the matrices of
//! ```text
//! x' = A x + B u
//! y  = C x + D u
//! ```
//! with `A` (n×n), `B` (n×m), `C` (p×n) and `D` (p×m). A static gain is a
//! model without states: `A` is 0×0, `B` is 0×m and `C` is p×0, so every
//! interconnection formula below applies to gains unchanged.

use std::fmt;
use std::ops::Neg;

use ndarray::{s, Array2, ArrayView2, Axis};
use num_complex::Complex64;

use crate::convert::transmission_zeros;
use crate::error::{ModelError, Result};
use crate::linalg;
use crate::model::{self, PoleProperty};
use crate::sampling::{
    ensure_same_sampling, Discretization, DiscretizationMethod, Sampling, SamplingSet,
};

/// State-space representation of an LTI model
#[derive(Clone, Debug)]
pub struct State {
    a: Array2<f64>,
    b: Array2<f64>,
    c: Array2<f64>,
    d: Array2<f64>,
    sampling: Sampling,
    discretization: Discretization,
    poles: Vec<Complex64>,
    zeros: Vec<Complex64>,
    stable: bool,
}

/// Check that the four matrices describe one model
pub(crate) fn validate(
    a: &Array2<f64>,
    b: &Array2<f64>,
    c: &Array2<f64>,
    d: &Array2<f64>,
) -> Result<()> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(ModelError::Dimension(format!(
            "A must be square, got {}x{}",
            a.nrows(),
            a.ncols()
        )));
    }
    if b.nrows() != n {
        return Err(ModelError::Dimension(format!(
            "B must have {} rows, got {}",
            n,
            b.nrows()
        )));
    }
    if c.ncols() != n {
        return Err(ModelError::Dimension(format!(
            "C must have {} columns, got {}",
            n,
            c.ncols()
        )));
    }
    let (p, m) = d.dim();
    if p == 0 || m == 0 {
        return Err(ModelError::Dimension(
            "a model needs at least one input and one output".to_string(),
        ));
    }
    if c.nrows() != p || b.ncols() != m {
        return Err(ModelError::ShapeMismatch {
            operation: "state construction",
            left: (c.nrows(), b.ncols()),
            right: (p, m),
        });
    }
    let finite = |x: &Array2<f64>| x.iter().all(|v| v.is_finite());
    if !(finite(a) && finite(b) && finite(c) && finite(d)) {
        return Err(ModelError::Dimension(
            "model matrices must have finite entries".to_string(),
        ));
    }
    Ok(())
}

/// `[[tl, tr], [bl, br]]`
fn block2(
    tl: &Array2<f64>,
    tr: &Array2<f64>,
    bl: &Array2<f64>,
    br: &Array2<f64>,
) -> Result<Array2<f64>> {
    linalg::vstack(&linalg::hstack(tl, tr)?, &linalg::hstack(bl, br)?)
}

impl State {
    /// Create a model from its four matrices.
    ///
    /// # Errors
    ///
    /// `ModelError::Dimension` or `ShapeMismatch` if the matrices are not
    /// conformable, or the model has no inputs or outputs.
    ///
    /// # Examples
    ///
    /// ```
    /// use lti_rs::State;
    /// use ndarray::arr2;
    ///
    /// let g = State::new(
    ///     arr2(&[[0.0, 1.0], [-2.0, -3.0]]),
    ///     arr2(&[[0.0], [1.0]]),
    ///     arr2(&[[3.0, 1.0]]),
    ///     arr2(&[[0.0]]),
    /// ).unwrap();
    /// assert_eq!(g.states(), 2);
    /// assert!(g.is_stable());
    /// assert!((g.zeros()[0].re + 3.0).abs() < 1e-8);
    /// ```
    pub fn new(a: Array2<f64>, b: Array2<f64>, c: Array2<f64>, d: Array2<f64>) -> Result<Self> {
        Self::from_parts(a, b, c, d, Sampling::Continuous)
    }

    /// Strictly proper model with a zero feedthrough
    pub fn from_abc(a: Array2<f64>, b: Array2<f64>, c: Array2<f64>) -> Result<Self> {
        let d = Array2::zeros((c.nrows(), b.ncols()));
        Self::new(a, b, c, d)
    }

    /// Static gain `y = D u`
    pub fn gain(d: Array2<f64>) -> Result<Self> {
        let (p, m) = d.dim();
        Self::new(Array2::zeros((0, 0)), Array2::zeros((0, m)), Array2::zeros((p, 0)), d)
    }

    pub fn with_sampling(mut self, sampling: Sampling) -> Result<Self> {
        self.set_sampling(sampling)?;
        Ok(self)
    }

    pub(crate) fn from_parts(
        a: Array2<f64>,
        b: Array2<f64>,
        c: Array2<f64>,
        d: Array2<f64>,
        sampling: Sampling,
    ) -> Result<Self> {
        validate(&a, &b, &c, &d)?;
        let mut g = State {
            a,
            b,
            c,
            d,
            sampling: Sampling::Continuous,
            discretization: Discretization::default(),
            poles: Vec::new(),
            zeros: Vec::new(),
            stable: true,
        };
        g.recalc()?;
        g.set_sampling(sampling)?;
        Ok(g)
    }

    fn recalc(&mut self) -> Result<()> {
        if self.is_gain() {
            self.poles.clear();
            self.zeros.clear();
        } else {
            self.poles = linalg::eigenvalues(&self.a)?;
            self.zeros = transmission_zeros(&self.a, &self.b, &self.c, &self.d)?;
        }
        self.stable = model::poles_are_stable(&self.poles, self.sampling);
        Ok(())
    }

    // ===== Properties =====

    pub fn a(&self) -> &Array2<f64> {
        &self.a
    }

    pub fn b(&self) -> &Array2<f64> {
        &self.b
    }

    pub fn c(&self) -> &Array2<f64> {
        &self.c
    }

    pub fn d(&self) -> &Array2<f64> {
        &self.d
    }

    /// `(A, B, C, D)`
    pub fn matrices(&self) -> (&Array2<f64>, &Array2<f64>, &Array2<f64>, &Array2<f64>) {
        (&self.a, &self.b, &self.c, &self.d)
    }

    /// Number of states
    pub fn states(&self) -> usize {
        self.a.nrows()
    }

    /// `(outputs, inputs)`
    pub fn shape(&self) -> (usize, usize) {
        self.d.dim()
    }

    pub fn outputs(&self) -> usize {
        self.d.nrows()
    }

    pub fn inputs(&self) -> usize {
        self.d.ncols()
    }

    pub fn is_siso(&self) -> bool {
        self.shape() == (1, 1)
    }

    pub fn is_gain(&self) -> bool {
        self.states() == 0
    }

    pub fn is_stable(&self) -> bool {
        self.stable
    }

    pub fn poles(&self) -> &[Complex64] {
        &self.poles
    }

    pub fn zeros(&self) -> &[Complex64] {
        &self.zeros
    }

    pub fn sampling(&self) -> Sampling {
        self.sampling
    }

    pub fn sampling_period(&self) -> Option<f64> {
        self.sampling.period()
    }

    pub fn sampling_set(&self) -> SamplingSet {
        self.sampling.set()
    }

    pub fn discretization(&self) -> &Discretization {
        &self.discretization
    }

    /// Change the time domain. Going back to continuous time discards any
    /// discretization data.
    pub fn set_sampling(&mut self, sampling: Sampling) -> Result<()> {
        if let Sampling::Discrete(dt) = sampling {
            Sampling::discrete(dt)?;
        } else {
            self.discretization.clear();
        }
        self.sampling = sampling;
        self.stable = model::poles_are_stable(&self.poles, self.sampling);
        Ok(())
    }

    pub fn set_discretization_method(&mut self, method: DiscretizationMethod) -> Result<()> {
        self.discretization.set_method(self.sampling, method)
    }

    pub fn set_discretization_matrix(&mut self, q: Array2<f64>) -> Result<()> {
        self.discretization.set_matrix(q)
    }

    pub fn set_prewarp_frequency(&mut self, w: f64) -> Result<()> {
        self.discretization.set_prewarp_frequency(self.sampling, w)
    }

    /// Swap in one matrix. Poles and zeros are recomputed on a copy, so a
    /// failure leaves the model untouched.
    fn replace<F>(&mut self, operation: &'static str, new: Array2<f64>, slot: F) -> Result<()>
    where
        F: Fn(&mut State) -> &mut Array2<f64>,
    {
        let mut candidate = self.clone();
        let target = slot(&mut candidate);
        if new.dim() != target.dim() {
            return Err(ModelError::ShapeMismatch {
                operation,
                left: target.dim(),
                right: new.dim(),
            });
        }
        if new.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::Dimension(
                "model matrices must have finite entries".to_string(),
            ));
        }
        *target = new;
        candidate.recalc()?;
        *self = candidate;
        Ok(())
    }

    pub fn set_a(&mut self, a: Array2<f64>) -> Result<()> {
        self.replace("set_a", a, |g| &mut g.a)
    }

    pub fn set_b(&mut self, b: Array2<f64>) -> Result<()> {
        self.replace("set_b", b, |g| &mut g.b)
    }

    pub fn set_c(&mut self, c: Array2<f64>) -> Result<()> {
        self.replace("set_c", c, |g| &mut g.c)
    }

    pub fn set_d(&mut self, d: Array2<f64>) -> Result<()> {
        self.replace("set_d", d, |g| &mut g.d)
    }

    /// Model formed from the selected outputs and inputs. The state
    /// matrix is kept, so the result need not be minimal.
    pub fn subsystem(&self, rows: &[usize], cols: &[usize]) -> Result<State> {
        let (p, m) = self.shape();
        if rows.is_empty() || cols.is_empty() {
            return Err(ModelError::Dimension(
                "subsystem needs at least one row and one column".to_string(),
            ));
        }
        if let Some(&r) = rows.iter().find(|&&r| r >= p) {
            return Err(ModelError::IndexOutOfRange(format!(
                "output {} of a model with {} outputs",
                r, p
            )));
        }
        if let Some(&c) = cols.iter().find(|&&c| c >= m) {
            return Err(ModelError::IndexOutOfRange(format!(
                "input {} of a model with {} inputs",
                c, m
            )));
        }
        State::from_parts(
            self.a.clone(),
            self.b.select(Axis(1), cols),
            self.c.select(Axis(0), rows),
            self.d.select(Axis(0), rows).select(Axis(1), cols),
            self.sampling,
        )
    }

    /// Feedthrough matrix of a static gain.
    ///
    /// # Errors
    ///
    /// `ModelError::NotAStaticGain` if the model has states.
    pub fn to_array(&self) -> Result<Array2<f64>> {
        if self.is_gain() {
            Ok(self.d.clone())
        } else {
            Err(ModelError::NotAStaticGain)
        }
    }

    pub fn pole_properties(&self) -> Vec<PoleProperty> {
        model::pole_properties(&self.poles, self.sampling)
    }

    // ===== Interconnections =====

    fn with_same(
        &self,
        a: Array2<f64>,
        b: Array2<f64>,
        c: Array2<f64>,
        d: Array2<f64>,
    ) -> Result<State> {
        State::from_parts(a, b, c, d, self.sampling)
    }

    fn gain_like(&self, k: &Array2<f64>) -> Result<State> {
        State::gain(k.clone())?.with_sampling(self.sampling)
    }

    /// Parallel connection: both models see the same input and their
    /// outputs are summed.
    ///
    /// ```text
    /// A = diag(A1, A2)   B = [B1; B2]   C = [C1, C2]   D = D1 + D2
    /// ```
    pub fn try_add(&self, other: &State) -> Result<State> {
        ensure_same_sampling(self.sampling, other.sampling, "addition")?;
        if self.shape() != other.shape() {
            return Err(ModelError::ShapeMismatch {
                operation: "addition",
                left: self.shape(),
                right: other.shape(),
            });
        }
        let a = linalg::block_diag(&[self.a.view(), other.a.view()]);
        let b = linalg::vstack(&self.b, &other.b)?;
        let c = linalg::hstack(&self.c, &other.c)?;
        let d = &self.d + &other.d;
        self.with_same(a, b, c, d)
    }

    pub fn try_sub(&self, other: &State) -> Result<State> {
        self.try_add(&-other)
    }

    /// Add a constant matrix of the same shape. A 1×1 matrix is added as a
    /// scalar.
    pub fn add_array(&self, k: &Array2<f64>) -> Result<State> {
        if k.dim() == (1, 1) && self.shape() != (1, 1) {
            return self.add_scalar(k[(0, 0)]);
        }
        if k.dim() != self.shape() {
            return Err(ModelError::ShapeMismatch {
                operation: "addition",
                left: self.shape(),
                right: k.dim(),
            });
        }
        self.with_same(
            self.a.clone(),
            self.b.clone(),
            self.c.clone(),
            &self.d + k,
        )
    }

    /// Add `k` to every entry (a matrix of ones times `k`, not `k*I`)
    pub fn add_scalar(&self, k: f64) -> Result<State> {
        self.add_array(&Array2::from_elem(self.shape(), k))
    }

    /// Entrywise product `G∘H`.
    ///
    /// Each entry is realized as the series connection of the two scalar
    /// channels, and the channels are stacked block-diagonally with their
    /// input and output routing. A SISO operand multiplies every entry of
    /// the other one. The result is generally not minimal.
    pub fn mul_elementwise(&self, other: &State) -> Result<State> {
        ensure_same_sampling(self.sampling, other.sampling, "multiplication")?;
        let (p, m) = if self.is_siso() {
            other.shape()
        } else if other.is_siso() || other.shape() == self.shape() {
            self.shape()
        } else {
            return Err(ModelError::ShapeMismatch {
                operation: "elementwise multiplication",
                left: self.shape(),
                right: other.shape(),
            });
        };

        let pick = |g: &State, r: usize, c: usize| -> (usize, usize) {
            if g.is_siso() {
                (0, 0)
            } else {
                (r, c)
            }
        };

        let mut blocks = Vec::with_capacity(p * m);
        for r in 0..p {
            for c in 0..m {
                let left = self.channel(pick(self, r, c));
                let right = other.channel(pick(other, r, c));
                blocks.push((r, c, series(&left, &right)?));
            }
        }

        let n: usize = blocks.iter().map(|(_, _, ch)| ch.a.nrows()).sum();
        let a_views: Vec<ArrayView2<f64>> = blocks.iter().map(|(_, _, ch)| ch.a.view()).collect();
        let a = linalg::block_diag(&a_views);
        let mut b = Array2::zeros((n, m));
        let mut cm = Array2::zeros((p, n));
        let mut d = Array2::zeros((p, m));

        let mut offset = 0;
        for (r, c, ch) in &blocks {
            let k = ch.a.nrows();
            b.slice_mut(s![offset..offset + k, *c..*c + 1]).assign(&ch.b);
            cm.slice_mut(s![*r..*r + 1, offset..offset + k]).assign(&ch.c);
            d[(*r, *c)] = ch.d[(0, 0)];
            offset += k;
        }
        log::debug!("elementwise product realized with {} states", n);
        self.with_same(a, b, cm, d)
    }

    /// Entrywise product with a constant matrix. A 1×1 matrix scales the
    /// model, and a SISO model is broadcast to the shape of `k`.
    pub fn mul_array(&self, k: &Array2<f64>) -> Result<State> {
        if k.dim() == (1, 1) {
            return self.scale(k[(0, 0)]);
        }
        self.mul_elementwise(&self.gain_like(k)?)
    }

    /// Multiply the model by `k` (scales B and D)
    pub fn scale(&self, k: f64) -> Result<State> {
        self.with_same(self.a.clone(), &self.b * k, self.c.clone(), &self.d * k)
    }

    pub fn div_scalar(&self, k: f64) -> Result<State> {
        if k == 0.0 {
            return Err(ModelError::DivisionByZero);
        }
        self.scale(1.0 / k)
    }

    /// Series connection `self * other`; `other` acts first.
    ///
    /// ```text
    /// A = [A1  B1 C2]   B = [B1 D2]   C = [C1  D1 C2]   D = D1 D2
    ///     [0   A2   ]       [B2   ]
    /// ```
    ///
    /// A SISO operand on either side is treated as a scalar and the
    /// product degrades to the entrywise one.
    pub fn matmul(&self, other: &State) -> Result<State> {
        ensure_same_sampling(self.sampling, other.sampling, "matrix multiplication")?;
        if self.is_siso() || other.is_siso() {
            return self.mul_elementwise(other);
        }
        if self.inputs() != other.outputs() {
            return Err(ModelError::ShapeMismatch {
                operation: "matrix multiplication",
                left: self.shape(),
                right: other.shape(),
            });
        }
        let conn = series(
            &Channel::from_state(self),
            &Channel::from_state(other),
        )?;
        self.with_same(conn.a, conn.b, conn.c, conn.d)
    }

    /// `self * K`: the constant matrix acts on the input first
    pub fn matmul_array(&self, k: &Array2<f64>) -> Result<State> {
        if self.is_siso() || k.dim() == (1, 1) {
            return self.mul_array(k);
        }
        if k.nrows() != self.inputs() {
            return Err(ModelError::ShapeMismatch {
                operation: "matrix multiplication",
                left: self.shape(),
                right: k.dim(),
            });
        }
        self.with_same(self.a.clone(), self.b.dot(k), self.c.clone(), self.d.dot(k))
    }

    /// `K * self`: the constant matrix acts on the output
    pub fn rmatmul_array(&self, k: &Array2<f64>) -> Result<State> {
        if self.is_siso() || k.dim() == (1, 1) {
            return self.mul_array(k);
        }
        if k.ncols() != self.outputs() {
            return Err(ModelError::ShapeMismatch {
                operation: "matrix multiplication",
                left: k.dim(),
                right: self.shape(),
            });
        }
        self.with_same(self.a.clone(), self.b.clone(), k.dot(&self.c), k.dot(&self.d))
    }

    /// Scalar channel from input `col` to output `row`
    fn channel(&self, (row, col): (usize, usize)) -> Channel {
        Channel {
            a: self.a.clone(),
            b: self.b.slice(s![.., col..col + 1]).to_owned(),
            c: self.c.slice(s![row..row + 1, ..]).to_owned(),
            d: self.d.slice(s![row..row + 1, col..col + 1]).to_owned(),
        }
    }
}

/// Bare matrices of a model, used while assembling interconnections
struct Channel {
    a: Array2<f64>,
    b: Array2<f64>,
    c: Array2<f64>,
    d: Array2<f64>,
}

impl Channel {
    fn from_state(g: &State) -> Self {
        Channel {
            a: g.a.clone(),
            b: g.b.clone(),
            c: g.c.clone(),
            d: g.d.clone(),
        }
    }
}

/// Series connection of bare matrices, `g1` after `g2`
fn series(g1: &Channel, g2: &Channel) -> Result<Channel> {
    let n2 = g2.a.nrows();
    let n1 = g1.a.nrows();
    let a = block2(
        &g1.a,
        &g1.b.dot(&g2.c),
        &Array2::zeros((n2, n1)),
        &g2.a,
    )?;
    let b = linalg::vstack(&g1.b.dot(&g2.d), &g2.b)?;
    let c = linalg::hstack(&g1.c, &g1.d.dot(&g2.c))?;
    let d = g1.d.dot(&g2.d);
    Ok(Channel { a, b, c, d })
}

impl Neg for &State {
    type Output = State;

    fn neg(self) -> State {
        let mut g = self.clone();
        g.c.mapv_inplace(|x| -x);
        g.d.mapv_inplace(|x| -x);
        g
    }
}

impl Neg for State {
    type Output = State;

    fn neg(self) -> State {
        -&self
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", model::header("State Representation", self.sampling))?;
        let (p, m) = self.shape();
        if self.is_gain() {
            writeln!(f, "\n{}x{} Static Gain", p, m)?;
        } else {
            writeln!(
                f,
                " {} input(s), {} output(s), and {} state(s)\n",
                m,
                p,
                self.states()
            )?;
            write!(f, "{}", model::pole_zero_table(&self.poles, &self.zeros))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr2;

    fn first_order(pole: f64) -> State {
        State::new(
            arr2(&[[pole]]),
            arr2(&[[1.0]]),
            arr2(&[[1.0]]),
            arr2(&[[0.0]]),
        )
        .unwrap()
    }

    fn sorted_re(z: &[Complex64]) -> Vec<f64> {
        let mut v: Vec<f64> = z.iter().map(|z| z.re).collect();
        v.sort_by(|a, b| a.partial_cmp(b).unwrap());
        v
    }

    // ===== Construction =====

    #[test]
    fn test_dimension_checks() {
        assert!(State::new(
            arr2(&[[1.0, 0.0]]),
            arr2(&[[1.0]]),
            arr2(&[[1.0]]),
            arr2(&[[0.0]])
        )
        .is_err());
        assert!(State::new(
            arr2(&[[1.0]]),
            arr2(&[[1.0], [1.0]]),
            arr2(&[[1.0]]),
            arr2(&[[0.0]])
        )
        .is_err());
        assert!(matches!(
            State::new(
                arr2(&[[1.0]]),
                arr2(&[[1.0]]),
                arr2(&[[1.0]]),
                arr2(&[[0.0, 0.0]])
            ),
            Err(ModelError::ShapeMismatch { .. })
        ));
        assert!(State::gain(Array2::zeros((0, 2))).is_err());
    }

    #[test]
    fn test_gain_has_no_states() {
        let g = State::gain(arr2(&[[1.0, 2.0]])).unwrap();
        assert!(g.is_gain());
        assert_eq!(g.states(), 0);
        assert_eq!(g.shape(), (1, 2));
        assert!(g.poles().is_empty());
        assert_eq!(g.to_array().unwrap(), arr2(&[[1.0, 2.0]]));
        assert!(matches!(
            first_order(-1.0).to_array(),
            Err(ModelError::NotAStaticGain)
        ));
    }

    #[test]
    fn test_from_abc_zero_feedthrough() {
        let g = State::from_abc(
            arr2(&[[-1.0]]),
            arr2(&[[1.0, 2.0]]),
            arr2(&[[1.0], [0.0], [3.0]]),
        )
        .unwrap();
        assert_eq!(g.shape(), (3, 2));
        assert_eq!(g.d(), &Array2::<f64>::zeros((3, 2)));
    }

    #[test]
    fn test_setters_keep_dimensions() {
        let mut g = first_order(-1.0);
        assert!(g.set_a(arr2(&[[1.0, 0.0], [0.0, 1.0]])).is_err());
        g.set_a(arr2(&[[2.0]])).unwrap();
        assert_abs_diff_eq!(g.poles()[0].re, 2.0, epsilon = 1e-14);
        assert!(!g.is_stable());
        assert!(g.set_d(arr2(&[[f64::NAN]])).is_err());
    }

    #[test]
    fn test_discrete_stability() {
        let g = first_order(0.5).with_sampling(Sampling::Discrete(0.1)).unwrap();
        assert!(g.is_stable());
        assert_eq!(g.sampling_period(), Some(0.1));
        let h = first_order(-0.5);
        assert!(h.is_stable());
        let k = first_order(0.5);
        assert!(!k.is_stable());
    }

    // ===== Connections =====

    #[test]
    fn test_parallel_connection() {
        let g = first_order(-1.0).try_add(&first_order(-2.0)).unwrap();
        assert_eq!(g.states(), 2);
        let p = sorted_re(g.poles());
        assert_abs_diff_eq!(p[0], -2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p[1], -1.0, epsilon = 1e-12);
        // 1/(s+1) + 1/(s+2) has its zero at -1.5
        assert_eq!(g.zeros().len(), 1);
        assert_abs_diff_eq!(g.zeros()[0].re, -1.5, epsilon = 1e-8);
    }

    #[test]
    fn test_series_connection_matrices() {
        let g1 = State::new(
            arr2(&[[-1.0, 0.0], [0.0, -2.0]]),
            arr2(&[[1.0, 0.0], [0.0, 1.0]]),
            arr2(&[[1.0, 1.0]]),
            arr2(&[[0.0, 1.0]]),
        )
        .unwrap();
        let g2 = State::new(
            arr2(&[[-3.0]]),
            arr2(&[[1.0]]),
            arr2(&[[1.0], [2.0]]),
            arr2(&[[0.0], [1.0]]),
        )
        .unwrap();
        let g = g1.matmul(&g2).unwrap();
        assert_eq!(g.shape(), (1, 1));
        assert_eq!(g.states(), 3);
        // A = [A1 B1*C2; 0 A2]
        assert_eq!(g.a()[(0, 2)], 1.0);
        assert_eq!(g.a()[(1, 2)], 2.0);
        assert_eq!(g.a()[(2, 0)], 0.0);
        assert_eq!(g.a()[(2, 2)], -3.0);
        // B = [B1*D2; B2], C = [C1, D1*C2], D = D1*D2
        assert_eq!(g.b().column(0).to_vec(), vec![0.0, 1.0, 1.0]);
        assert_eq!(g.c().row(0).to_vec(), vec![1.0, 1.0, 2.0]);
        assert_eq!(g.d()[(0, 0)], 1.0);
    }

    #[test]
    fn test_series_with_gain() {
        let k = State::gain(arr2(&[[2.0, 0.0], [0.0, 3.0]])).unwrap();
        let g = State::new(
            arr2(&[[-1.0, 0.0], [0.0, -2.0]]),
            arr2(&[[1.0, 0.0], [0.0, 1.0]]),
            arr2(&[[1.0, 0.0], [0.0, 1.0]]),
            arr2(&[[0.0, 0.0], [0.0, 0.0]]),
        )
        .unwrap();
        let kg = k.matmul(&g).unwrap();
        assert_eq!(kg.states(), 2);
        assert_eq!(kg.c(), &arr2(&[[2.0, 0.0], [0.0, 3.0]]));
        assert!(k.matmul(&State::gain(arr2(&[[1.0, 2.0, 3.0]])).unwrap()).is_err());
    }

    #[test]
    fn test_elementwise_product() {
        let g = State::new(
            arr2(&[[-1.0, 0.0], [0.0, -2.0]]),
            arr2(&[[1.0, 0.0], [0.0, 1.0]]),
            arr2(&[[1.0, 0.0], [0.0, 1.0]]),
            arr2(&[[0.0, 0.0], [0.0, 0.0]]),
        )
        .unwrap();
        let k = State::gain(arr2(&[[2.0, 5.0], [7.0, 3.0]])).unwrap();
        let h = g.mul_elementwise(&k).unwrap();
        assert_eq!(h.shape(), (2, 2));
        // each of the four channels keeps both states of g
        assert_eq!(h.states(), 8);
        assert_eq!(h.d(), &Array2::<f64>::zeros((2, 2)));
    }

    #[test]
    fn test_siso_times_array_broadcasts() {
        let g = first_order(-1.0);
        let h = g.mul_array(&arr2(&[[1.0, 2.0]])).unwrap();
        assert_eq!(h.shape(), (1, 2));
        assert_eq!(h.states(), 2);
    }

    #[test]
    fn test_scale_and_negation() {
        let g = first_order(-1.0).scale(3.0).unwrap();
        assert_eq!(g.b()[(0, 0)], 3.0);
        let n = -&g;
        assert_eq!(n.c()[(0, 0)], -1.0);
        assert!(matches!(g.div_scalar(0.0), Err(ModelError::DivisionByZero)));
    }

    #[test]
    fn test_add_scalar_and_sub() {
        let g = first_order(-1.0).add_scalar(2.0).unwrap();
        assert_eq!(g.d()[(0, 0)], 2.0);
        let z = g.try_sub(&g).unwrap();
        assert_eq!(z.states(), 2);
        assert_eq!(z.d()[(0, 0)], 0.0);
    }

    #[test]
    fn test_array_products() {
        let g = State::from_abc(
            arr2(&[[-1.0]]),
            arr2(&[[1.0, 1.0]]),
            arr2(&[[1.0], [2.0]]),
        )
        .unwrap();
        let right = g.matmul_array(&arr2(&[[1.0], [2.0]])).unwrap();
        assert_eq!(right.b(), &arr2(&[[3.0]]));
        let left = g.rmatmul_array(&arr2(&[[1.0, 1.0]])).unwrap();
        assert_eq!(left.c(), &arr2(&[[3.0]]));
        assert!(g.matmul_array(&arr2(&[[1.0, 2.0]])).is_err());
    }

    #[test]
    fn test_one_by_one_array_acts_as_scalar() {
        let g = State::from_abc(
            arr2(&[[-1.0]]),
            arr2(&[[1.0, 1.0]]),
            arr2(&[[1.0], [2.0]]),
        )
        .unwrap();
        let k = arr2(&[[2.0]]);

        let sum = g.add_array(&k).unwrap();
        assert_eq!(sum.d(), &arr2(&[[2.0, 2.0], [2.0, 2.0]]));
        assert_eq!(sum.states(), 1);

        for h in [
            g.mul_array(&k).unwrap(),
            g.matmul_array(&k).unwrap(),
            g.rmatmul_array(&k).unwrap(),
        ] {
            assert_eq!(h.shape(), (2, 2));
            assert_eq!(h.states(), 1);
            assert_eq!(h.b(), &arr2(&[[2.0, 2.0]]));
        }
    }

    #[test]
    fn test_failed_setter_keeps_model() {
        let mut g = State::new(
            arr2(&[[0.0, 1.0], [-2.0, -3.0]]),
            arr2(&[[0.0], [1.0]]),
            arr2(&[[3.0, 1.0]]),
            arr2(&[[0.0]]),
        )
        .unwrap();
        let before = g.clone();

        assert!(matches!(
            g.set_c(arr2(&[[1.0, 2.0, 3.0]])),
            Err(ModelError::ShapeMismatch { operation: "set_c", .. })
        ));
        assert!(g.set_b(arr2(&[[0.0], [f64::INFINITY]])).is_err());
        assert_eq!(g.b(), before.b());
        assert_eq!(g.c(), before.c());
        assert_eq!(g.poles(), before.poles());
        assert_eq!(g.zeros(), before.zeros());

        // only C changes, and the zero moves with it
        g.set_c(arr2(&[[4.0, 1.0]])).unwrap();
        assert_eq!(g.a(), before.a());
        assert_eq!(g.d(), before.d());
        assert_abs_diff_eq!(g.zeros()[0].re, -4.0, epsilon = 1e-8);
    }

    #[test]
    fn test_sampling_mismatch() {
        let g = first_order(-1.0);
        let h = first_order(0.5).with_sampling(Sampling::Discrete(0.1)).unwrap();
        assert!(matches!(
            g.try_add(&h),
            Err(ModelError::SamplingMismatch { .. })
        ));
        assert!(g.matmul(&h).is_err());
    }

    #[test]
    fn test_subsystem() {
        let g = State::from_abc(
            arr2(&[[-1.0]]),
            arr2(&[[1.0, 2.0]]),
            arr2(&[[1.0], [3.0]]),
        )
        .unwrap();
        let s = g.subsystem(&[1], &[1]).unwrap();
        assert_eq!(s.b(), &arr2(&[[2.0]]));
        assert_eq!(s.c(), &arr2(&[[3.0]]));
        assert!(g.subsystem(&[2], &[0]).is_err());
    }

    #[test]
    fn test_display() {
        let text = first_order(-1.0).to_string();
        assert!(text.starts_with("Continuous-Time State Representation"));
        assert!(text.contains("1 input(s), 1 output(s), and 1 state(s)"));
    }
}
