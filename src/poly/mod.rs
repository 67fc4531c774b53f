//! Polynomial Routines
//!
//! Real polynomials are stored as coefficient vectors in **descending**
//! powers of the variable:
//! ```text
//! p(s) = p[0]*s^n + p[1]*s^(n-1) + ... + p[n]
//! ```
//! Routines in this module return trimmed polynomials (no leading zeros);
//! the zero polynomial is `[0.0]`.

use ndarray::Array2;
use num_complex::Complex64;

use crate::error::{ModelError, Result};
use crate::linalg;

/// Coefficients in descending powers
pub type Polynomial = Vec<f64>;

/// Row-major grid of polynomials, one per (output, input) pair
pub type PolynomialGrid = Vec<Vec<Polynomial>>;

/// Strip leading zero coefficients. An empty or all-zero input gives `[0.0]`.
pub fn trim_left_zeros(p: &[f64]) -> Polynomial {
    match p.iter().position(|&x| x != 0.0) {
        Some(first) => p[first..].to_vec(),
        None => vec![0.0],
    }
}

/// True if every coefficient is zero
pub fn is_zero(p: &[f64]) -> bool {
    p.iter().all(|&x| x == 0.0)
}

/// Degree after trimming; the zero polynomial has degree 0
pub fn degree(p: &[f64]) -> usize {
    trim_left_zeros(p).len() - 1
}

/// Sum of two polynomials, aligned at the constant term
pub fn add(a: &[f64], b: &[f64]) -> Polynomial {
    let len = a.len().max(b.len());
    let mut out = vec![0.0; len];
    for (i, &x) in a.iter().enumerate() {
        out[len - a.len() + i] += x;
    }
    for (i, &x) in b.iter().enumerate() {
        out[len - b.len() + i] += x;
    }
    trim_left_zeros(&out)
}

/// Product of two polynomials (discrete convolution of the coefficients)
pub fn mul(a: &[f64], b: &[f64]) -> Polynomial {
    if a.is_empty() || b.is_empty() {
        return vec![0.0];
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    trim_left_zeros(&out)
}

/// Multiply every coefficient by `k`
pub fn scale(p: &[f64], k: f64) -> Polynomial {
    trim_left_zeros(&p.iter().map(|x| x * k).collect::<Vec<_>>())
}

/// Polynomial long division.
///
/// Returns `(quotient, remainder)` with `num = quotient * den + remainder`
/// and `degree(remainder) < degree(den)`. Remainder coefficients at the
/// round-off level of the operands are flushed to zero so that exact
/// cancellations such as `(s+1)/(s+1)` leave a zero remainder.
///
/// # Errors
///
/// `ModelError::InvalidPolynomial` if `den` is the zero polynomial.
///
/// # Examples
///
/// ```
/// use lti_rs::poly::div;
///
/// // (s^2 + 3s + 2) / (s + 1) = s + 2
/// let (q, r) = div(&[1.0, 3.0, 2.0], &[1.0, 1.0]).unwrap();
/// assert_eq!(q, vec![1.0, 2.0]);
/// assert_eq!(r, vec![0.0]);
/// ```
pub fn div(num: &[f64], den: &[f64]) -> Result<(Polynomial, Polynomial)> {
    let num = trim_left_zeros(num);
    let den = trim_left_zeros(den);

    if is_zero(&den) {
        return Err(ModelError::InvalidPolynomial(
            "division by the zero polynomial".to_string(),
        ));
    }

    if num.len() < den.len() {
        return Ok((vec![0.0], num));
    }

    let qlen = num.len() - den.len() + 1;
    let mut quotient = vec![0.0; qlen];
    let mut rem = num.clone();

    for i in 0..qlen {
        let coef = rem[i] / den[0];
        quotient[i] = coef;
        for (j, &d) in den.iter().enumerate() {
            rem[i + j] -= coef * d;
        }
    }

    let q_scale = quotient.iter().map(|x| x.abs()).fold(0.0, f64::max);
    let d_scale = den.iter().map(|x| x.abs()).fold(0.0, f64::max);
    let n_scale = num.iter().map(|x| x.abs()).fold(0.0, f64::max);
    let cutoff = 100.0 * f64::EPSILON * n_scale.max(q_scale * d_scale);

    let remainder: Vec<f64> = rem[qlen..]
        .iter()
        .map(|&x| if x.abs() <= cutoff { 0.0 } else { x })
        .collect();

    Ok((trim_left_zeros(&quotient), trim_left_zeros(&remainder)))
}

/// Monic real polynomial with the given roots.
///
/// Roots are expected to be closed under conjugation; the imaginary
/// residue of the expanded product is discarded.
pub fn from_roots(roots: &[Complex64]) -> Polynomial {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];
    for &r in roots {
        let mut next = vec![Complex64::new(0.0, 0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * r;
        }
        coeffs = next;
    }
    coeffs.iter().map(|c| c.re).collect()
}

/// Controllable companion matrix of `p`.
///
/// For the monic-normalized `s^n + a1*s^(n-1) + ... + an` the result has
/// ones on the superdiagonal and last row `[-an, ..., -a1]`, so that with
/// `B = e_n` the numerator coefficients go into `C` in ascending order.
///
/// # Errors
///
/// `ModelError::InvalidPolynomial` if `p` has degree zero.
pub fn companion(p: &[f64]) -> Result<Array2<f64>> {
    let p = trim_left_zeros(p);
    let n = p.len() - 1;
    if n == 0 {
        return Err(ModelError::InvalidPolynomial(
            "companion matrix of a constant polynomial".to_string(),
        ));
    }

    let lead = p[0];
    let mut a = Array2::zeros((n, n));
    for i in 0..n - 1 {
        a[(i, i + 1)] = 1.0;
    }
    for j in 0..n {
        a[(n - 1, j)] = -p[n - j] / lead;
    }
    Ok(a)
}

/// Roots of `p` as eigenvalues of its companion matrix.
///
/// Trailing zero coefficients produce exact zero roots.
pub fn roots(p: &[f64]) -> Result<Vec<Complex64>> {
    let p = trim_left_zeros(p);
    if p.len() <= 1 {
        return Ok(Vec::new());
    }

    let trailing = p.iter().rev().take_while(|&&x| x == 0.0).count();
    let core = &p[..p.len() - trailing];

    let mut out = if core.len() > 1 {
        linalg::eigenvalues(&companion(core)?)?
    } else {
        Vec::new()
    };
    out.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(trailing));
    Ok(out)
}

/// Evaluate `p(s)` with Horner's method
pub fn eval(p: &[f64], s: Complex64) -> Complex64 {
    p.iter().fold(Complex64::new(0.0, 0.0), |acc, &c| acc * s + c)
}

/// A root and the number of times it occurs
#[derive(Clone, Copy, Debug)]
struct RootCluster {
    center: Complex64,
    multiplicity: usize,
}

/// Group the computed roots of one polynomial by multiplicity.
///
/// A root of multiplicity k comes back from the eigenvalue solver spread
/// over a radius of about `eps^(1/k)`, while the mean of the spread copies
/// stays accurate. Starting from each unassigned root, the largest group of
/// its nearest neighbours lying within `max(root_tol, 10 eps^(1/k))` of
/// their mean (relative) becomes one cluster centered at that mean.
fn cluster_roots(roots: &[Complex64], root_tol: f64) -> Vec<RootCluster> {
    let mut free = roots.to_vec();
    let mut clusters = Vec::new();

    while let Some(&seed) = free.first() {
        let mut by_distance: Vec<usize> = (0..free.len()).collect();
        by_distance.sort_by(|&i, &j| (free[i] - seed).norm().total_cmp(&(free[j] - seed).norm()));

        let mut size = 1;
        let mut center = seed;
        for k in (2..=free.len()).rev() {
            let members = &by_distance[..k];
            let mean = members.iter().map(|&i| free[i]).sum::<Complex64>() / k as f64;
            let spread = 10.0 * f64::EPSILON.powf(1.0 / k as f64);
            let radius = root_tol.max(spread) * mean.norm().max(1.0);
            if members.iter().all(|&i| (free[i] - mean).norm() <= radius) {
                size = k;
                center = mean;
                break;
            }
        }

        let mut taken = by_distance[..size].to_vec();
        taken.sort_unstable_by(|a, b| b.cmp(a));
        for i in taken {
            free.swap_remove(i);
        }
        clusters.push(RootCluster {
            center,
            multiplicity: size,
        });
    }
    clusters
}

/// Least common multiple of several polynomials.
///
/// Returns the monic LCM `l` and one multiplier per input such that
/// `polys[i] * multipliers[i] == l` up to round-off.
///
/// When all inputs are proportional the first one (made monic) is the
/// LCM and the multipliers are constants; this keeps common denominators
/// exact. Otherwise the roots of each input are first grouped into
/// clusters of repeated roots, and the cluster centers are matched across
/// inputs, treating centers closer than `root_tol * max(1, |r|)` as the
/// same root. Each root enters the LCM with the largest multiplicity it
/// has in any input.
///
/// # Errors
///
/// `ModelError::InvalidPolynomial` if the input is empty or any input is
/// the zero polynomial.
///
/// # Examples
///
/// ```
/// use lti_rs::poly::lcm;
///
/// let (l, mults) = lcm(&[vec![1.0, 1.0], vec![1.0, 2.0]], 1e-6).unwrap();
/// assert_eq!(l, vec![1.0, 3.0, 2.0]);
/// assert_eq!(mults[0], vec![1.0, 2.0]);
/// assert_eq!(mults[1], vec![1.0, 1.0]);
/// ```
pub fn lcm(polys: &[Polynomial], root_tol: f64) -> Result<(Polynomial, Vec<Polynomial>)> {
    if polys.is_empty() {
        return Err(ModelError::InvalidPolynomial(
            "LCM of an empty set of polynomials".to_string(),
        ));
    }

    let trimmed: Vec<Polynomial> = polys.iter().map(|p| trim_left_zeros(p)).collect();
    if trimmed.iter().any(|p| is_zero(p)) {
        return Err(ModelError::InvalidPolynomial(
            "LCM involving the zero polynomial".to_string(),
        ));
    }

    let monic: Vec<Polynomial> = trimmed.iter().map(|p| scale(p, 1.0 / p[0])).collect();
    if monic.iter().all(|p| p == &monic[0]) {
        let mults = trimmed.iter().map(|p| vec![1.0 / p[0]]).collect();
        return Ok((monic[0].clone(), mults));
    }

    let cluster_sets: Vec<Vec<RootCluster>> = trimmed
        .iter()
        .map(|p| Ok(cluster_roots(&roots(p)?, root_tol)))
        .collect::<Result<_>>()?;

    let same = |a: Complex64, b: Complex64| (a - b).norm() <= root_tol * b.norm().max(1.0);

    let mut lcm_clusters: Vec<RootCluster> = Vec::new();
    for set in &cluster_sets {
        for cl in set {
            match lcm_clusters.iter_mut().find(|l| same(cl.center, l.center)) {
                Some(l) => l.multiplicity = l.multiplicity.max(cl.multiplicity),
                None => lcm_clusters.push(*cl),
            }
        }
    }

    let mut mults = Vec::with_capacity(trimmed.len());
    for (p, set) in trimmed.iter().zip(&cluster_sets) {
        let mut rest = Vec::new();
        for l in &lcm_clusters {
            let have: usize = set
                .iter()
                .filter(|cl| same(cl.center, l.center))
                .map(|cl| cl.multiplicity)
                .sum();
            rest.extend(std::iter::repeat(l.center).take(l.multiplicity.saturating_sub(have)));
        }
        mults.push(scale(&from_roots(&rest), 1.0 / p[0]));
    }

    let lcm_roots: Vec<Complex64> = lcm_clusters
        .iter()
        .flat_map(|l| std::iter::repeat(l.center).take(l.multiplicity))
        .collect();

    log::debug!(
        "lcm of {} polynomials has degree {} ({} distinct roots)",
        trimmed.len(),
        lcm_roots.len(),
        lcm_clusters.len()
    );

    Ok((from_roots(&lcm_roots), mults))
}
