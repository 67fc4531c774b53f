//! Transfer Function Models
//!
//! A `Transfer` is a p×m matrix of proper rational functions, stored as
//! two grids of polynomials (numerators and denominators) in descending
//! powers of `s` (or `z` for discrete-time models).
//!
//! Poles, zeros and stability are computed on construction and kept in
//! sync by every setter. Multi-input multi-output models obtain them from
//! a state realization since entrywise roots are meaningless there.

use std::fmt;
use std::ops::Neg;

use ndarray::Array2;
use num_complex::Complex64;

use crate::config::Tolerances;
use crate::convert::{transfer_to_state_matrices, transmission_zeros};
use crate::error::{ModelError, Result};
use crate::linalg;
use crate::model::{self, PoleProperty};
use crate::poly::{self, Polynomial, PolynomialGrid};
use crate::sampling::{
    ensure_same_sampling, Discretization, DiscretizationMethod, Sampling, SamplingSet,
};

/// Transfer function representation of an LTI model
#[derive(Clone, Debug)]
pub struct Transfer {
    num: PolynomialGrid,
    den: PolynomialGrid,
    shape: (usize, usize),
    is_gain: bool,
    sampling: Sampling,
    discretization: Discretization,
    poles: Vec<Complex64>,
    zeros: Vec<Complex64>,
    stable: bool,
}

/// Check grid shapes, trim every polynomial and enforce properness.
fn validate(num: PolynomialGrid, den: PolynomialGrid) -> Result<(PolynomialGrid, PolynomialGrid)> {
    let p = num.len();
    let m = num.first().map_or(0, |row| row.len());
    if p == 0 || m == 0 {
        return Err(ModelError::Dimension(
            "numerator grid must have at least one row and one column".to_string(),
        ));
    }
    if num.iter().any(|row| row.len() != m) {
        return Err(ModelError::Dimension(
            "numerator rows must all have the same length".to_string(),
        ));
    }
    let den_m = den.first().map_or(0, |row| row.len());
    if den.len() != p || den.iter().any(|row| row.len() != den_m) || den_m != m {
        return Err(ModelError::ShapeMismatch {
            operation: "transfer construction",
            left: (p, m),
            right: (den.len(), den_m),
        });
    }

    let mut num_out = Vec::with_capacity(p);
    let mut den_out = Vec::with_capacity(p);
    for (r, (nrow, drow)) in num.iter().zip(den.iter()).enumerate() {
        let mut nr = Vec::with_capacity(m);
        let mut dr = Vec::with_capacity(m);
        for (c, (n, d)) in nrow.iter().zip(drow.iter()).enumerate() {
            if n.is_empty() || d.is_empty() {
                return Err(ModelError::InvalidPolynomial(format!(
                    "entry ({}, {}) has an empty coefficient list",
                    r, c
                )));
            }
            if n.iter().chain(d.iter()).any(|x| !x.is_finite()) {
                return Err(ModelError::InvalidPolynomial(format!(
                    "entry ({}, {}) has non-finite coefficients",
                    r, c
                )));
            }
            let n = poly::trim_left_zeros(n);
            let d = poly::trim_left_zeros(d);
            if poly::is_zero(&d) {
                return Err(ModelError::InvalidPolynomial(format!(
                    "entry ({}, {}) has a zero denominator",
                    r, c
                )));
            }
            if n.len() > d.len() {
                return Err(ModelError::Noncausal {
                    row: r,
                    col: c,
                    num_degree: n.len() - 1,
                    den_degree: d.len() - 1,
                });
            }
            nr.push(n);
            dr.push(d);
        }
        num_out.push(nr);
        den_out.push(dr);
    }
    Ok((num_out, den_out))
}

/// `a_num/a_den + b_num/b_den` over the least common denominator
fn rational_add(
    a: (&[f64], &[f64]),
    b: (&[f64], &[f64]),
    tol: &Tolerances,
) -> Result<(Polynomial, Polynomial)> {
    if poly::is_zero(a.0) {
        return Ok((b.0.to_vec(), b.1.to_vec()));
    }
    if poly::is_zero(b.0) {
        return Ok((a.0.to_vec(), a.1.to_vec()));
    }

    let (den, mults) = poly::lcm(&[a.1.to_vec(), b.1.to_vec()], tol.root_merge)?;
    let num = poly::add(&poly::mul(a.0, &mults[0]), &poly::mul(b.0, &mults[1]));
    if poly::is_zero(&num) {
        Ok((vec![0.0], vec![1.0]))
    } else {
        Ok((num, den))
    }
}

fn rational_mul(a: (&[f64], &[f64]), b: (&[f64], &[f64])) -> (Polynomial, Polynomial) {
    let num = poly::mul(a.0, b.0);
    if poly::is_zero(&num) {
        (vec![0.0], vec![1.0])
    } else {
        (num, poly::mul(a.1, b.1))
    }
}

fn grid_of<T: Clone>(rows: usize, cols: usize, value: T) -> Vec<Vec<T>> {
    vec![vec![value; cols]; rows]
}

impl Transfer {
    /// Create a model from numerator and denominator grids.
    ///
    /// # Arguments
    ///
    /// * `num` - p×m grid of numerator polynomials
    /// * `den` - p×m grid of denominator polynomials
    ///
    /// # Errors
    ///
    /// * `ModelError::Dimension` / `ShapeMismatch` for empty, ragged or
    ///   mismatched grids
    /// * `ModelError::InvalidPolynomial` for empty coefficient lists or
    ///   zero denominators
    /// * `ModelError::Noncausal` if a numerator outgrows its denominator
    pub fn new(num: PolynomialGrid, den: PolynomialGrid) -> Result<Self> {
        Self::from_parts(num, den, Sampling::Continuous)
    }

    /// Single-input single-output model `num(s)/den(s)`
    ///
    /// # Examples
    ///
    /// ```
    /// use lti_rs::Transfer;
    ///
    /// let g = Transfer::siso(&[1.0, 3.0], &[1.0, 3.0, 2.0]).unwrap();
    /// assert!(g.is_siso());
    /// assert_eq!(g.zeros().len(), 1);
    /// assert!(Transfer::siso(&[1.0, 0.0, 0.0], &[1.0, 1.0]).is_err());
    /// ```
    pub fn siso(num: &[f64], den: &[f64]) -> Result<Self> {
        Self::new(vec![vec![num.to_vec()]], vec![vec![den.to_vec()]])
    }

    /// MIMO model whose entries all share the denominator `den`
    pub fn with_common_denominator(num: PolynomialGrid, den: &[f64]) -> Result<Self> {
        let p = num.len();
        let m = num.first().map_or(0, |row| row.len());
        Self::new(num, grid_of(p, m, den.to_vec()))
    }

    /// MIMO model whose entries all share the numerator `num`
    pub fn with_common_numerator(num: &[f64], den: PolynomialGrid) -> Result<Self> {
        let p = den.len();
        let m = den.first().map_or(0, |row| row.len());
        Self::new(grid_of(p, m, num.to_vec()), den)
    }

    /// 1×1 static gain
    pub fn static_gain(k: f64) -> Result<Self> {
        Self::siso(&[k], &[1.0])
    }

    /// Static gain with the given matrix
    pub fn from_gain_matrix(k: &Array2<f64>) -> Result<Self> {
        let (p, m) = k.dim();
        let num = (0..p)
            .map(|r| (0..m).map(|c| vec![k[(r, c)]]).collect())
            .collect();
        Self::new(num, grid_of(p, m, vec![1.0]))
    }

    pub fn with_sampling(mut self, sampling: Sampling) -> Result<Self> {
        self.set_sampling(sampling)?;
        Ok(self)
    }

    pub(crate) fn from_parts(
        num: PolynomialGrid,
        den: PolynomialGrid,
        sampling: Sampling,
    ) -> Result<Self> {
        let (num, den) = validate(num, den)?;
        let shape = (num.len(), num[0].len());
        let is_gain = den.iter().flatten().all(|d| d.len() == 1);
        let mut g = Transfer {
            num,
            den,
            shape,
            is_gain,
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

    /// Recompute the cached poles, zeros and stability flag
    fn recalc(&mut self) -> Result<()> {
        self.is_gain = self.den.iter().flatten().all(|d| d.len() == 1);
        if self.is_gain {
            self.poles.clear();
            self.zeros.clear();
        } else if self.is_siso() {
            self.poles = poly::roots(&self.den[0][0])?;
            self.zeros = poly::roots(&self.num[0][0])?;
        } else {
            let (a, b, c, d) =
                transfer_to_state_matrices(&self.num, &self.den, &Tolerances::default())?;
            self.poles = linalg::eigenvalues(&a)?;
            self.zeros = transmission_zeros(&a, &b, &c, &d)?;
        }
        self.stable = model::poles_are_stable(&self.poles, self.sampling);
        Ok(())
    }

    // ===== Properties =====

    pub fn num(&self) -> &PolynomialGrid {
        &self.num
    }

    pub fn den(&self) -> &PolynomialGrid {
        &self.den
    }

    /// `(num, den)` grids
    pub fn polynomials(&self) -> (&PolynomialGrid, &PolynomialGrid) {
        (&self.num, &self.den)
    }

    /// `(outputs, inputs)`
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn outputs(&self) -> usize {
        self.shape.0
    }

    pub fn inputs(&self) -> usize {
        self.shape.1
    }

    pub fn is_siso(&self) -> bool {
        self.shape == (1, 1)
    }

    pub fn is_gain(&self) -> bool {
        self.is_gain
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

    /// Replace the numerators; the shape must stay the same
    pub fn set_num(&mut self, num: PolynomialGrid) -> Result<()> {
        let (num, den) = validate(num, self.den.clone())?;
        self.replace(num, den, "set_num")
    }

    /// Replace the denominators; the shape must stay the same
    pub fn set_den(&mut self, den: PolynomialGrid) -> Result<()> {
        let (num, den) = validate(self.num.clone(), den)?;
        self.replace(num, den, "set_den")
    }

    /// Commit new grids once their poles and zeros are known
    fn replace(
        &mut self,
        num: PolynomialGrid,
        den: PolynomialGrid,
        operation: &'static str,
    ) -> Result<()> {
        let shape = (num.len(), num[0].len());
        if shape != self.shape {
            return Err(ModelError::ShapeMismatch {
                operation,
                left: self.shape,
                right: shape,
            });
        }
        let mut candidate = self.clone();
        candidate.num = num;
        candidate.den = den;
        candidate.recalc()?;
        *self = candidate;
        Ok(())
    }

    /// Numerator and denominator of entry `(row, col)`
    pub fn entry(&self, row: usize, col: usize) -> Result<(&Polynomial, &Polynomial)> {
        if row >= self.shape.0 || col >= self.shape.1 {
            return Err(ModelError::IndexOutOfRange(format!(
                "entry ({}, {}) of a {}x{} model",
                row, col, self.shape.0, self.shape.1
            )));
        }
        Ok((&self.num[row][col], &self.den[row][col]))
    }

    /// Model formed from the selected outputs and inputs
    pub fn subsystem(&self, rows: &[usize], cols: &[usize]) -> Result<Transfer> {
        if rows.is_empty() || cols.is_empty() {
            return Err(ModelError::Dimension(
                "subsystem needs at least one row and one column".to_string(),
            ));
        }
        let mut num = Vec::with_capacity(rows.len());
        let mut den = Vec::with_capacity(rows.len());
        for &r in rows {
            let mut nr = Vec::with_capacity(cols.len());
            let mut dr = Vec::with_capacity(cols.len());
            for &c in cols {
                let (n, d) = self.entry(r, c)?;
                nr.push(n.clone());
                dr.push(d.clone());
            }
            num.push(nr);
            den.push(dr);
        }
        Transfer::from_parts(num, den, self.sampling)
    }

    /// Gain matrix of a static gain model.
    ///
    /// # Errors
    ///
    /// `ModelError::NotAStaticGain` if the model has dynamics.
    pub fn to_array(&self) -> Result<Array2<f64>> {
        if !self.is_gain {
            return Err(ModelError::NotAStaticGain);
        }
        Ok(Array2::from_shape_fn(self.shape, |(r, c)| {
            self.num[r][c][0] / self.den[r][c][0]
        }))
    }

    pub fn pole_properties(&self) -> Vec<PoleProperty> {
        model::pole_properties(&self.poles, self.sampling)
    }

    // ===== Arithmetic =====

    fn map_entries<F>(&self, shape: (usize, usize), mut f: F) -> Result<Transfer>
    where
        F: FnMut(usize, usize) -> Result<(Polynomial, Polynomial)>,
    {
        let mut num = grid_of(shape.0, shape.1, Vec::new());
        let mut den = grid_of(shape.0, shape.1, Vec::new());
        for r in 0..shape.0 {
            for c in 0..shape.1 {
                let (n, d) = f(r, c)?;
                num[r][c] = n;
                den[r][c] = d;
            }
        }
        Transfer::from_parts(num, den, self.sampling)
    }

    fn entry_pair(&self, r: usize, c: usize) -> (&[f64], &[f64]) {
        (&self.num[r][c], &self.den[r][c])
    }

    /// Entry `(r, c)`, or the single entry of a SISO model
    fn broadcast_pair(&self, r: usize, c: usize) -> (&[f64], &[f64]) {
        if self.is_siso() {
            self.entry_pair(0, 0)
        } else {
            self.entry_pair(r, c)
        }
    }

    /// Parallel connection, entry by entry.
    ///
    /// # Errors
    ///
    /// `SamplingMismatch` or `ShapeMismatch` if the models are not
    /// compatible.
    pub fn try_add(&self, other: &Transfer) -> Result<Transfer> {
        ensure_same_sampling(self.sampling, other.sampling, "addition")?;
        if self.shape != other.shape {
            return Err(ModelError::ShapeMismatch {
                operation: "addition",
                left: self.shape,
                right: other.shape,
            });
        }
        let tol = Tolerances::default();
        self.map_entries(self.shape, |r, c| {
            rational_add(self.entry_pair(r, c), other.entry_pair(r, c), &tol)
        })
    }

    pub fn try_sub(&self, other: &Transfer) -> Result<Transfer> {
        self.try_add(&-other)
    }

    /// Add `k` to every entry (a matrix of ones times `k`, not `k*I`)
    pub fn add_scalar(&self, k: f64) -> Result<Transfer> {
        self.add_array(&Array2::from_elem(self.shape, k))
    }

    /// Add a constant matrix of the same shape. A 1×1 matrix is added as a
    /// scalar.
    pub fn add_array(&self, k: &Array2<f64>) -> Result<Transfer> {
        if k.dim() == (1, 1) && self.shape != (1, 1) {
            return self.add_scalar(k[(0, 0)]);
        }
        if k.dim() != self.shape {
            return Err(ModelError::ShapeMismatch {
                operation: "addition",
                left: self.shape,
                right: k.dim(),
            });
        }
        self.map_entries(self.shape, |r, c| {
            let (n, d) = self.entry_pair(r, c);
            let num = poly::add(n, &poly::scale(d, k[(r, c)]));
            if poly::is_zero(&num) {
                Ok((vec![0.0], vec![1.0]))
            } else {
                Ok((num, d.to_vec()))
            }
        })
    }

    /// Entrywise product. A SISO operand multiplies every entry of the
    /// other one.
    pub fn mul_elementwise(&self, other: &Transfer) -> Result<Transfer> {
        ensure_same_sampling(self.sampling, other.sampling, "multiplication")?;
        let shape = if self.is_siso() {
            other.shape
        } else if other.is_siso() || other.shape == self.shape {
            self.shape
        } else {
            return Err(ModelError::ShapeMismatch {
                operation: "elementwise multiplication",
                left: self.shape,
                right: other.shape,
            });
        };
        self.map_entries(shape, |r, c| {
            Ok(rational_mul(self.broadcast_pair(r, c), other.broadcast_pair(r, c)))
        })
    }

    /// Entrywise product with a constant matrix. A 1×1 matrix scales the
    /// model, and a SISO model is broadcast to the shape of `k`.
    pub fn mul_array(&self, k: &Array2<f64>) -> Result<Transfer> {
        if k.dim() == (1, 1) {
            return self.scale(k[(0, 0)]);
        }
        let shape = if self.is_siso() { k.dim() } else { self.shape };
        if k.dim() != shape {
            return Err(ModelError::ShapeMismatch {
                operation: "elementwise multiplication",
                left: self.shape,
                right: k.dim(),
            });
        }
        self.map_entries(shape, |r, c| {
            Ok(rational_mul(self.broadcast_pair(r, c), (&[k[(r, c)]], &[1.0])))
        })
    }

    /// Multiply every entry by `k`
    pub fn scale(&self, k: f64) -> Result<Transfer> {
        self.map_entries(self.shape, |r, c| {
            Ok(rational_mul(self.entry_pair(r, c), (&[k], &[1.0])))
        })
    }

    pub fn div_scalar(&self, k: f64) -> Result<Transfer> {
        if k == 0.0 {
            return Err(ModelError::DivisionByZero);
        }
        self.scale(1.0 / k)
    }

    /// Series connection `self * other`, where `other` acts first.
    ///
    /// A SISO operand on either side is treated as a scalar and the
    /// product degrades to the entrywise one.
    ///
    /// # Examples
    ///
    /// ```
    /// use lti_rs::Transfer;
    ///
    /// let row = Transfer::new(
    ///     vec![vec![vec![1.0], vec![1.0]]],
    ///     vec![vec![vec![1.0, 1.0], vec![1.0, 2.0]]],
    /// ).unwrap();
    /// let col = Transfer::new(
    ///     vec![vec![vec![1.0]], vec![vec![1.0]]],
    ///     vec![vec![vec![1.0]], vec![vec![1.0]]],
    /// ).unwrap();
    ///
    /// let g = row.matmul(&col).unwrap();
    /// assert_eq!(g.shape(), (1, 1));
    /// assert_eq!(g.entry(0, 0).unwrap().0, &vec![2.0, 3.0]);
    /// ```
    pub fn matmul(&self, other: &Transfer) -> Result<Transfer> {
        ensure_same_sampling(self.sampling, other.sampling, "matrix multiplication")?;
        if self.is_siso() || other.is_siso() {
            return self.mul_elementwise(other);
        }
        if self.shape.1 != other.shape.0 {
            return Err(ModelError::ShapeMismatch {
                operation: "matrix multiplication",
                left: self.shape,
                right: other.shape,
            });
        }
        let tol = Tolerances::default();
        let inner = self.shape.1;
        self.map_entries((self.shape.0, other.shape.1), |r, c| {
            let mut acc: (Polynomial, Polynomial) = (vec![0.0], vec![1.0]);
            for k in 0..inner {
                let term = rational_mul(self.entry_pair(r, k), other.entry_pair(k, c));
                acc = rational_add((&acc.0, &acc.1), (&term.0, &term.1), &tol)?;
            }
            Ok(acc)
        })
    }

    /// `self * K` for a constant matrix `K`
    pub fn matmul_array(&self, k: &Array2<f64>) -> Result<Transfer> {
        if self.is_siso() || k.dim() == (1, 1) {
            return self.mul_array(k);
        }
        let gain = Transfer::from_gain_matrix(k)?.with_sampling(self.sampling)?;
        self.matmul(&gain)
    }

    /// `K * self` for a constant matrix `K`
    pub fn rmatmul_array(&self, k: &Array2<f64>) -> Result<Transfer> {
        if self.is_siso() || k.dim() == (1, 1) {
            return self.mul_array(k);
        }
        let gain = Transfer::from_gain_matrix(k)?.with_sampling(self.sampling)?;
        gain.matmul(self)
    }
}

impl Neg for &Transfer {
    type Output = Transfer;

    fn neg(self) -> Transfer {
        let mut g = self.clone();
        for n in g.num.iter_mut().flatten() {
            for x in n.iter_mut() {
                *x = -*x;
            }
        }
        g
    }
}

impl Neg for Transfer {
    type Output = Transfer;

    fn neg(self) -> Transfer {
        -&self
    }
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", model::header("Transfer function", self.sampling))?;
        if self.is_gain {
            writeln!(f, "\n{}x{} Static Gain", self.shape.0, self.shape.1)?;
        } else {
            writeln!(
                f,
                " {} input(s) and {} output(s)\n",
                self.shape.1, self.shape.0
            )?;
            write!(f, "{}", model::pole_zero_table(&self.poles, &self.zeros))?;
        }
        Ok(())
    }
}
