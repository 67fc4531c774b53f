//! Conversion Routines
//!
//! Transfer ⇄ state conversions and the transmission zeros they rely on.
//!
//! # Algorithms
//!
//! * State to transfer: every (i, j) channel `c_i (sI - A)^-1 b_j + d_ij`
//!   shares the characteristic polynomial of `A` as denominator. The
//!   numerator is the zero polynomial of the channel scaled so that both
//!   sides agree at a real point away from every pole and zero.
//! * Transfer to state: proper parts are split off into `D`, every column
//!   gets the least common multiple of its denominators and a companion
//!   block. Fat systems are realized through their transpose.
//! * Transmission zeros: the staircase deflation of Emami-Naeini and
//!   Van Dooren (1982) reduces the system matrix to a square regular
//!   pencil whose finite generalized eigenvalues are the zeros.

use ndarray::{s, Array1, Array2};
use ndarray_linalg::Solve;
use num_complex::Complex64;

use crate::config::Tolerances;
use crate::error::{ModelError, Result};
use crate::linalg;
use crate::poly::{self, Polynomial, PolynomialGrid};
use crate::state::{self, State};
use crate::transfer::Transfer;

/// `(A, B, C, D)`
pub type StateMatrices = (Array2<f64>, Array2<f64>, Array2<f64>, Array2<f64>);

// ===== State to transfer =====

/// Convert a state model into a transfer model with the same sampling.
///
/// The result is not simplified: every entry keeps the full
/// characteristic polynomial as denominator.
///
/// # Examples
///
/// ```
/// use lti_rs::{state_to_transfer, State};
/// use ndarray::arr2;
///
/// let g = State::new(
///     arr2(&[[0.0, 1.0], [-2.0, -3.0]]),
///     arr2(&[[0.0], [1.0]]),
///     arr2(&[[3.0, 1.0]]),
///     arr2(&[[0.0]]),
/// ).unwrap();
/// let tf = state_to_transfer(&g).unwrap();
/// let (num, den) = tf.entry(0, 0).unwrap();
/// assert!((num[0] - 1.0).abs() < 1e-8 && (num[1] - 3.0).abs() < 1e-8);
/// assert!((den[1] - 3.0).abs() < 1e-8 && (den[2] - 2.0).abs() < 1e-8);
/// ```
pub fn state_to_transfer(g: &State) -> Result<Transfer> {
    let (a, b, c, d) = g.matrices();
    let (num, den) = state_to_transfer_polynomials(a, b, c, d)?;
    Transfer::from_parts(num, den, g.sampling())
}

/// Numerator and denominator grids of `C (sI - A)^-1 B + D`
pub fn state_to_transfer_polynomials(
    a: &Array2<f64>,
    b: &Array2<f64>,
    c: &Array2<f64>,
    d: &Array2<f64>,
) -> Result<(PolynomialGrid, PolynomialGrid)> {
    state::validate(a, b, c, d)?;
    let n = a.nrows();
    let (p, m) = d.dim();

    if n == 0 {
        let num = (0..p)
            .map(|r| (0..m).map(|col| vec![d[(r, col)]]).collect())
            .collect();
        return Ok((num, vec![vec![vec![1.0]; m]; p]));
    }

    let poles = linalg::eigenvalues(a)?;
    let den = poly::from_roots(&poles);
    let zero_d = Array2::zeros((1, 1));

    let mut num_grid = Vec::with_capacity(p);
    for row in 0..p {
        let mut num_row = Vec::with_capacity(m);
        let ci = c.slice(s![row..row + 1, ..]).to_owned();
        for col in 0..m {
            let bj = b.slice(s![.., col..col + 1]).to_owned();
            let zeros = transmission_zeros(a, &bj, &ci, &zero_d)?;

            // Match the gain at a real point to the right of every pole
            // and zero
            let reach = poles
                .iter()
                .chain(zeros.iter())
                .map(|z| z.re.abs())
                .fold(1.0, f64::max);
            let s0 = 2.0 * reach;

            let shifted = Array2::<f64>::eye(n) * s0 - a;
            let x = shifted.solve(&bj.column(0).to_owned())?;
            let cab = ci.row(0).dot(&x);

            let s0c = Complex64::new(s0, 0.0);
            let pole_prod: Complex64 = poles.iter().map(|&p| s0c - p).product();
            let zero_prod: Complex64 = zeros.iter().map(|&z| s0c - z).product();
            let gain = cab * pole_prod.re / zero_prod.re;

            let channel = poly::scale(&poly::from_roots(&zeros), gain);
            num_row.push(poly::add(&channel, &poly::scale(&den, d[(row, col)])));
        }
        num_grid.push(num_row);
    }

    log::debug!("state model of order {} converted to {}x{} transfer", n, p, m);
    Ok((num_grid, vec![vec![den; m]; p]))
}

// ===== Transfer to state =====

/// Realize a transfer model. A model without dynamics becomes a static
/// gain.
pub fn transfer_to_state(g: &Transfer) -> Result<State> {
    let (a, b, c, d) = transfer_to_state_matrices(g.num(), g.den(), &Tolerances::default())?;
    State::from_parts(a, b, c, d, g.sampling())
}

/// Realize numerator/denominator grids as `(A, B, C, D)`.
///
/// The grids are assumed to be validated (equal shape, proper entries,
/// nonzero denominators). The realization is controllable for tall and
/// square systems (observable for fat ones) but not necessarily minimal.
pub fn transfer_to_state_matrices(
    num: &PolynomialGrid,
    den: &PolynomialGrid,
    tol: &Tolerances,
) -> Result<StateMatrices> {
    let p = num.len();
    let m = num.first().map_or(0, |row| row.len());
    if p == 0 || m == 0 || den.len() != p || den.iter().any(|row| row.len() != m) {
        return Err(ModelError::Dimension(
            "numerator and denominator grids must be nonempty and of equal shape".to_string(),
        ));
    }

    let mut d = Array2::zeros((p, m));
    let mut sp_num: PolynomialGrid = vec![vec![Vec::new(); m]; p];
    let mut sp_den: PolynomialGrid = vec![vec![Vec::new(); m]; p];

    for r in 0..p {
        for col in 0..m {
            let (feedthrough, mut n_sp, mut d_sp) =
                split_proper(&num[r][col], &den[r][col], r, col)?;
            d[(r, col)] = feedthrough;

            if poly::is_zero(&n_sp) {
                n_sp = vec![0.0];
                d_sp = vec![1.0];
            }

            let lead = d_sp[0];
            if lead != 1.0 {
                if lead.abs() < tol.leading_coefficient_warning {
                    log::warn!(
                        "leading coefficient of the ({}, {}) denominator is tiny ({:e}); \
                         the realization is likely ill-conditioned",
                        r,
                        col,
                        lead
                    );
                }
                n_sp = poly::scale(&n_sp, 1.0 / lead);
                d_sp = poly::scale(&d_sp, 1.0 / lead);
            }
            sp_num[r][col] = n_sp;
            sp_den[r][col] = d_sp;
        }
    }

    let transposed = p < m;
    let (rows, cols) = if transposed {
        sp_num = transpose_grid(&sp_num);
        sp_den = transpose_grid(&sp_den);
        (m, p)
    } else {
        (p, m)
    };

    let mut a_blocks = Vec::with_capacity(cols);
    let mut b_blocks = Vec::with_capacity(cols);
    let mut c_blocks = Vec::with_capacity(cols);

    for col in 0..cols {
        let col_dens: Vec<Polynomial> = (0..rows).map(|r| sp_den[r][col].clone()).collect();
        let (lcm, mults) = poly::lcm(&col_dens, tol.root_merge)?;
        let k = lcm.len() - 1;

        if k == 0 {
            a_blocks.push(Array2::zeros((0, 0)));
            b_blocks.push(Array2::zeros((0, 1)));
            c_blocks.push(Array2::zeros((rows, 0)));
            continue;
        }

        let a_col = poly::companion(&lcm)?;
        let mut b_col = Array2::zeros((k, 1));
        b_col[(k - 1, 0)] = 1.0;

        let mut c_col = Array2::zeros((rows, k));
        for r in 0..rows {
            let numerator = poly::mul(&sp_num[r][col], &mults[r]);
            if poly::is_zero(&numerator) {
                continue;
            }
            if numerator.len() > k {
                return Err(ModelError::Numerical(format!(
                    "numerator of degree {} does not fit a block of order {}",
                    numerator.len() - 1,
                    k
                )));
            }
            for (offset, &coef) in numerator.iter().rev().enumerate() {
                c_col[(r, offset)] = coef;
            }
        }
        a_blocks.push(a_col);
        b_blocks.push(b_col);
        c_blocks.push(c_col);
    }

    let a = linalg::block_diag(&a_blocks.iter().map(|x| x.view()).collect::<Vec<_>>());
    let b = linalg::block_diag(&b_blocks.iter().map(|x| x.view()).collect::<Vec<_>>());
    let c = ndarray::concatenate(
        ndarray::Axis(1),
        &c_blocks.iter().map(|x| x.view()).collect::<Vec<_>>(),
    )?;

    log::debug!(
        "realized {}x{} transfer model with {} states{}",
        p,
        m,
        a.nrows(),
        if transposed { " through its transpose" } else { "" }
    );

    if transposed {
        Ok((a.t().to_owned(), c.t().to_owned(), b.t().to_owned(), d))
    } else {
        Ok((a, b, c, d))
    }
}

/// Split `num/den` into a feedthrough and a strictly proper remainder.
///
/// Returns `(feedthrough, numerator, denominator)`. Entries that cancel
/// completely come back as `0/1`.
fn split_proper(
    num: &[f64],
    den: &[f64],
    row: usize,
    col: usize,
) -> Result<(f64, Polynomial, Polynomial)> {
    let num = poly::trim_left_zeros(num);
    let den = poly::trim_left_zeros(den);

    if num.len() > den.len() {
        return Err(ModelError::Noncausal {
            row,
            col,
            num_degree: num.len() - 1,
            den_degree: den.len() - 1,
        });
    }
    if den.len() == 1 {
        return Ok((num[0] / den[0], vec![0.0], vec![1.0]));
    }
    if den.len() > num.len() {
        return Ok((0.0, num, den));
    }

    let (quotient, remainder) = poly::div(&num, &den)?;
    if poly::is_zero(&remainder) {
        Ok((quotient[0], vec![0.0], vec![1.0]))
    } else {
        Ok((quotient[0], remainder, den))
    }
}

fn transpose_grid(grid: &PolynomialGrid) -> PolynomialGrid {
    let rows = grid.len();
    let cols = grid.first().map_or(0, |r| r.len());
    (0..cols)
        .map(|c| (0..rows).map(|r| grid[r][c].clone()).collect())
        .collect()
}

// ===== Transmission zeros =====

/// Transmission zeros of the system `(A, B, C, D)`.
///
/// Returns an empty vector when `B` or `C` vanishes, when the system has
/// no states, or when the deflation shows the system matrix has no finite
/// zeros. Values within `1e-9` (relative) of the real axis are returned
/// as real numbers. Infinite zeros are not reported.
///
/// # Examples
///
/// ```
/// use lti_rs::transmission_zeros;
/// use ndarray::arr2;
///
/// let z = transmission_zeros(
///     &arr2(&[[-2.0, 0.0], [0.0, -3.0]]),
///     &arr2(&[[1.0, 0.0], [0.0, 1.0]]),
///     &arr2(&[[1.0, 0.0], [0.0, 1.0]]),
///     &arr2(&[[1.0, 0.0], [0.0, 1.0]]),
/// ).unwrap();
/// let mut re: Vec<f64> = z.iter().map(|z| z.re).collect();
/// re.sort_by(|a, b| a.partial_cmp(b).unwrap());
/// assert!((re[0] + 4.0).abs() < 1e-8 && (re[1] + 3.0).abs() < 1e-8);
/// ```
pub fn transmission_zeros(
    a: &Array2<f64>,
    b: &Array2<f64>,
    c: &Array2<f64>,
    d: &Array2<f64>,
) -> Result<Vec<Complex64>> {
    state::validate(a, b, c, d)?;
    if a.is_empty() || linalg::is_all_zero(b) || linalg::is_all_zero(c) {
        return Ok(Vec::new());
    }

    let (p, m) = d.dim();
    let r = linalg::matrix_rank(d)?;

    let (ar, br, cr, dr) = if (p == 1 && m == 1 && r > 0) || (r == p.min(m) && p == m) {
        (a.clone(), b.clone(), c.clone(), d.clone())
    } else {
        let reduced = if r == p {
            Some((a.clone(), b.clone(), c.clone(), d.clone()))
        } else {
            deflate(a.clone(), b.clone(), c.clone(), d.clone())?
        };
        let (ar, br, cr, dr) = match reduced {
            Some(sys) => sys,
            None => return Ok(Vec::new()),
        };

        let (pr, mr) = dr.dim();
        if pr != mr || linalg::is_all_zero(&linalg::hstack(&cr, &dr)?) {
            let dual = deflate(
                ar.t().to_owned(),
                cr.t().to_owned(),
                br.t().to_owned(),
                dr.t().to_owned(),
            )?;
            match dual {
                Some((at, ct, bt, dt)) => (
                    at.t().to_owned(),
                    bt.t().to_owned(),
                    ct.t().to_owned(),
                    dt.t().to_owned(),
                ),
                None => return Ok(Vec::new()),
            }
        } else {
            (ar, br, cr, dr)
        }
    };

    if ar.is_empty() {
        return Ok(Vec::new());
    }
    if dr.nrows() != dr.ncols() {
        log::warn!(
            "deflation ended with a {}x{} feedthrough; no zeros reported",
            dr.nrows(),
            dr.ncols()
        );
        return Ok(Vec::new());
    }

    square_pencil_zeros(&ar, &br, &cr, &dr)
}

/// Unit in the last place of a positive number
fn ulp(x: f64) -> f64 {
    2f64.powi(x.log2().floor() as i32) * f64::EPSILON
}

/// One staircase pass: deflate until the feedthrough has full row rank.
///
/// Returns `None` when the system collapses entirely, which means it has
/// no finite zeros.
fn deflate(
    mut a: Array2<f64>,
    mut b: Array2<f64>,
    mut c: Array2<f64>,
    mut d: Array2<f64>,
) -> Result<Option<StateMatrices>> {
    let n0 = a.nrows();
    let dims = 100.0 * (((n0 + c.nrows()) * (n0 + b.ncols())) as f64).sqrt();
    let m_eps = ulp(dims) * linalg::frobenius_norm(&a);
    let rank_of = |sv: &Array1<f64>, rows: usize, cols: usize| {
        let smax = sv.iter().cloned().fold(0.0, f64::max);
        let tol = m_eps.max((rows.max(cols) as f64) * f64::EPSILON * smax);
        linalg::rank_from_singular_values(sv, tol)
    };

    for step in 0..n0 {
        let n = a.nrows();
        let (p, m) = d.dim();

        let (sigma, cbd, r_of_d) = if linalg::is_all_zero(&d) {
            (0, c.clone(), Array2::zeros((0, m)))
        } else {
            let svd = linalg::full_svd(&d)?;
            let sigma = rank_of(&svd.s, p, m);
            if sigma == p {
                break;
            }
            let mut r_of_d = Array2::<f64>::zeros((sigma, m));
            for i in 0..sigma {
                r_of_d.row_mut(i).assign(&(&svd.vt.row(i) * svd.s[i]));
            }
            (sigma, svd.u.t().dot(&c), r_of_d)
        };

        let cbar = cbd.slice(s![..sigma, ..]).to_owned();
        let ctilde_t = cbd.slice(s![sigma.., ..]).t().to_owned();
        let svd_c = linalg::full_svd(&ctilde_t)?;
        let rho = rank_of(&svd_c.s, ctilde_t.nrows(), ctilde_t.ncols());
        if rho == 0 {
            break;
        }
        let nu = n - rho;
        if nu == 0 {
            log::debug!("system matrix collapsed after {} deflation steps", step + 1);
            return Ok(None);
        }

        let q = linalg::fliplr(&svd_c.u);
        if sigma > 0 {
            let ac = linalg::vstack(&q.t().dot(&a), &cbar)?.dot(&q);
            let bd = linalg::vstack(&q.t().dot(&b), &r_of_d)?;
            a = ac.slice(s![..nu, ..nu]).to_owned();
            c = ac.slice(s![nu.., ..nu]).to_owned();
            b = bd.slice(s![..nu, ..]).to_owned();
            d = bd.slice(s![nu.., ..]).to_owned();
        } else {
            let abcd = q.t().dot(&linalg::hstack(&a.dot(&q), &b)?);
            a = abcd.slice(s![..nu, ..nu]).to_owned();
            b = abcd.slice(s![..nu, n..]).to_owned();
            c = abcd.slice(s![nu.., ..nu]).to_owned();
            d = abcd.slice(s![nu.., n..]).to_owned();
        }
        log::debug!(
            "deflation step {}: order {} -> {}, feedthrough rank {}",
            step + 1,
            n,
            nu,
            sigma
        );
    }

    Ok(Some((a, b, c, d)))
}

/// Zeros of a system whose feedthrough is square after deflation.
///
/// Compresses `[D C]` from the right, which turns the system pencil into
/// `T11 - z V11` with `T = [A B] V`.
fn square_pencil_zeros(
    a: &Array2<f64>,
    b: &Array2<f64>,
    c: &Array2<f64>,
    d: &Array2<f64>,
) -> Result<Vec<Complex64>> {
    let n = a.nrows();
    let m = d.ncols();

    let svd = linalg::full_svd(&linalg::hstack(d, c)?)?;
    let v = linalg::roll_both(&svd.vt.t().to_owned(), m);
    let t = linalg::hstack(a, b)?.dot(&v);

    let t11 = t.slice(s![..n, ..n]).to_owned();
    let v11 = v.slice(s![..n, ..n]).to_owned();
    generalized_eigenvalues(&t11, &v11)
}

/// Finite `z` with `T x = z E x`, by shift and invert.
///
/// With `M = T - s0 E` regular, `M^-1 E x = x / (z - s0)`, so every
/// eigenvalue `mu` of `M^-1 E` gives `z = s0 + 1/mu`. Vanishing `mu`
/// belong to infinite eigenvalues and are dropped. The shift is picked
/// from a fixed set by the conditioning of `M`.
fn generalized_eigenvalues(t: &Array2<f64>, e: &Array2<f64>) -> Result<Vec<Complex64>> {
    let n = t.nrows();
    let scale = (linalg::frobenius_norm(t) / linalg::frobenius_norm(e).max(f64::EPSILON)).max(1.0);

    let mut best = (-1.0, 0.0);
    for k in [0.0, 0.37, -0.61, 1.19, -1.53, 2.71] {
        let s0 = k * scale;
        let sv = linalg::singular_values(&(t - &(e * s0)))?;
        let smax = sv.iter().cloned().fold(0.0, f64::max);
        let smin = sv.iter().cloned().fold(f64::INFINITY, f64::min);
        let rcond = if smax > 0.0 { smin / smax } else { 0.0 };
        if rcond > best.0 {
            best = (rcond, s0);
        }
    }

    let (rcond, s0) = best;
    if rcond <= 100.0 * (n as f64) * f64::EPSILON {
        log::debug!("system pencil is singular (rcond {:e}); no zeros reported", rcond);
        return Ok(Vec::new());
    }

    let k = linalg::inverse(&(t - &(e * s0)))?.dot(e);
    let cutoff = (n as f64) * 100.0 * f64::EPSILON * linalg::frobenius_norm(&k).max(1.0);

    let zeros = linalg::eigenvalues(&k)?
        .into_iter()
        .filter(|mu| mu.norm() > cutoff)
        .map(|mu| {
            let z = Complex64::new(s0, 0.0) + mu.inv();
            if z.im.abs() <= 1e-9 * z.norm().max(1.0) {
                Complex64::new(z.re, 0.0)
            } else {
                z
            }
        })
        .collect();
    Ok(zeros)
}

/// `[[A, B], [C, D]]`, or just `D` for a static gain
pub fn concatenate_state_matrices(g: &State) -> Result<Array2<f64>> {
    let (a, b, c, d) = g.matrices();
    if g.is_gain() {
        return Ok(d.clone());
    }
    linalg::vstack(&linalg::hstack(a, b)?, &linalg::hstack(c, d)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr2;

    fn sorted_re(z: &[Complex64]) -> Vec<f64> {
        let mut v: Vec<f64> = z.iter().map(|z| z.re).collect();
        v.sort_by(|a, b| a.partial_cmp(b).unwrap());
        v
    }

    // ===== Transmission zeros =====

    #[test]
    fn test_tzeros_siso_strictly_proper() {
        let z = transmission_zeros(
            &arr2(&[[0.0, 1.0], [-2.0, -3.0]]),
            &arr2(&[[0.0], [1.0]]),
            &arr2(&[[3.0, 1.0]]),
            &arr2(&[[0.0]]),
        )
        .unwrap();
        assert_eq!(z.len(), 1);
        assert_abs_diff_eq!(z[0].re, -3.0, epsilon = 1e-8);
        assert_eq!(z[0].im, 0.0);
    }

    #[test]
    fn test_tzeros_with_feedthrough() {
        // 1/(s+1) + 1 = (s+2)/(s+1)
        let z = transmission_zeros(
            &arr2(&[[-1.0]]),
            &arr2(&[[1.0]]),
            &arr2(&[[1.0]]),
            &arr2(&[[1.0]]),
        )
        .unwrap();
        assert_eq!(z.len(), 1);
        assert_abs_diff_eq!(z[0].re, -2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_tzeros_square_mimo() {
        let z = transmission_zeros(
            &arr2(&[[-2.0, 0.0], [0.0, -3.0]]),
            &Array2::eye(2),
            &Array2::eye(2),
            &Array2::eye(2),
        )
        .unwrap();
        let re = sorted_re(&z);
        assert_eq!(re.len(), 2);
        assert_abs_diff_eq!(re[0], -4.0, epsilon = 1e-8);
        assert_abs_diff_eq!(re[1], -3.0, epsilon = 1e-8);
    }

    #[test]
    fn test_tzeros_complex_pair() {
        // (s^2 + 2s + 5)/(s+1)^3 in controllable companion form
        let z = transmission_zeros(
            &arr2(&[[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [-1.0, -3.0, -3.0]]),
            &arr2(&[[0.0], [0.0], [1.0]]),
            &arr2(&[[5.0, 2.0, 1.0]]),
            &arr2(&[[0.0]]),
        )
        .unwrap();
        assert_eq!(z.len(), 2);
        for zi in &z {
            assert_abs_diff_eq!(zi.re, -1.0, epsilon = 1e-8);
            assert_abs_diff_eq!(zi.im.abs(), 2.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_tzeros_trivial_cases() {
        let a = arr2(&[[-1.0]]);
        let z = transmission_zeros(&a, &arr2(&[[0.0]]), &arr2(&[[1.0]]), &arr2(&[[0.0]])).unwrap();
        assert!(z.is_empty());
        let z = transmission_zeros(&a, &arr2(&[[1.0]]), &arr2(&[[0.0]]), &arr2(&[[0.0]])).unwrap();
        assert!(z.is_empty());
        // 1/(s+1) has no finite zeros
        let z = transmission_zeros(&a, &arr2(&[[1.0]]), &arr2(&[[1.0]]), &arr2(&[[0.0]])).unwrap();
        assert!(z.is_empty());
    }

    #[test]
    fn test_tzeros_rejects_bad_dimensions() {
        assert!(transmission_zeros(
            &arr2(&[[-1.0]]),
            &arr2(&[[1.0], [1.0]]),
            &arr2(&[[1.0]]),
            &arr2(&[[0.0]])
        )
        .is_err());
    }

    // ===== State to transfer =====

    #[test]
    fn test_state_to_transfer_with_feedthrough() {
        let (num, den) = state_to_transfer_polynomials(
            &arr2(&[[-1.0]]),
            &arr2(&[[1.0]]),
            &arr2(&[[1.0]]),
            &arr2(&[[1.0]]),
        )
        .unwrap();
        assert_abs_diff_eq!(num[0][0][0], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(num[0][0][1], 2.0, epsilon = 1e-10);
        assert_eq!(den[0][0].len(), 2);
        assert_abs_diff_eq!(den[0][0][1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_state_to_transfer_gain() {
        let (num, den) = state_to_transfer_polynomials(
            &Array2::zeros((0, 0)),
            &Array2::zeros((0, 2)),
            &Array2::zeros((1, 0)),
            &arr2(&[[2.0, 3.0]]),
        )
        .unwrap();
        assert_eq!(num, vec![vec![vec![2.0], vec![3.0]]]);
        assert_eq!(den, vec![vec![vec![1.0], vec![1.0]]]);
    }

    #[test]
    fn test_state_to_transfer_decoupled_channel() {
        // second input does not reach the output
        let (num, _) = state_to_transfer_polynomials(
            &arr2(&[[-1.0, 0.0], [0.0, -2.0]]),
            &arr2(&[[1.0, 0.0], [0.0, 1.0]]),
            &arr2(&[[1.0, 0.0]]),
            &arr2(&[[0.0, 0.0]]),
        )
        .unwrap();
        assert_eq!(num[0][1], vec![0.0]);
        // 1/(s+1) = (s+2)/((s+1)(s+2))
        assert_abs_diff_eq!(num[0][0][0], 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(num[0][0][1], 2.0, epsilon = 1e-8);
    }

    // ===== Transfer to state =====

    #[test]
    fn test_siso_companion_form() {
        let (a, b, c, d) = transfer_to_state_matrices(
            &vec![vec![vec![1.0, 3.0]]],
            &vec![vec![vec![1.0, 3.0, 2.0]]],
            &Tolerances::default(),
        )
        .unwrap();
        assert_eq!(a, arr2(&[[0.0, 1.0], [-2.0, -3.0]]));
        assert_eq!(b, arr2(&[[0.0], [1.0]]));
        assert_eq!(c, arr2(&[[3.0, 1.0]]));
        assert_eq!(d, arr2(&[[0.0]]));
    }

    #[test]
    fn test_proper_entry_splits_feedthrough() {
        // (2s + 3)/(s + 1) = 2 + 1/(s + 1)
        let (a, _, c, d) = transfer_to_state_matrices(
            &vec![vec![vec![2.0, 3.0]]],
            &vec![vec![vec![1.0, 1.0]]],
            &Tolerances::default(),
        )
        .unwrap();
        assert_eq!(a, arr2(&[[-1.0]]));
        assert_eq!(c, arr2(&[[1.0]]));
        assert_eq!(d, arr2(&[[2.0]]));
    }

    #[test]
    fn test_full_cancellation_goes_to_feedthrough() {
        let (a, b, c, d) = transfer_to_state_matrices(
            &vec![vec![vec![2.0, 2.0]]],
            &vec![vec![vec![1.0, 1.0]]],
            &Tolerances::default(),
        )
        .unwrap();
        assert_eq!(a.dim(), (0, 0));
        assert_eq!(b.dim(), (0, 1));
        assert_eq!(c.dim(), (1, 0));
        assert_eq!(d, arr2(&[[2.0]]));
    }

    #[test]
    fn test_non_monic_denominator() {
        // 2/(2s + 4) = 1/(s + 2)
        let (a, _, c, _) = transfer_to_state_matrices(
            &vec![vec![vec![2.0]]],
            &vec![vec![vec![2.0, 4.0]]],
            &Tolerances::default(),
        )
        .unwrap();
        assert_eq!(a, arr2(&[[-2.0]]));
        assert_eq!(c, arr2(&[[1.0]]));
    }

    #[test]
    fn test_fat_system_is_dualized() {
        // [1/(s+1), 1/(s+2)]
        let (a, b, c, d) = transfer_to_state_matrices(
            &vec![vec![vec![1.0], vec![1.0]]],
            &vec![vec![vec![1.0, 1.0], vec![1.0, 2.0]]],
            &Tolerances::default(),
        )
        .unwrap();
        assert_eq!(a.dim(), (2, 2));
        assert_eq!(b.dim(), (2, 2));
        assert_eq!(c.dim(), (1, 2));
        assert_eq!(d.dim(), (1, 2));

        let (num, den) = state_to_transfer_polynomials(&a, &b, &c, &d).unwrap();
        // entry (0, 0): (s+2)/((s+1)(s+2))
        assert_abs_diff_eq!(num[0][0][0], 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(num[0][0][1], 2.0, epsilon = 1e-8);
        assert_abs_diff_eq!(num[0][1][1], 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(den[0][0][1], 3.0, epsilon = 1e-8);
    }

    #[test]
    fn test_concatenate() {
        let g = State::new(
            arr2(&[[-1.0]]),
            arr2(&[[2.0]]),
            arr2(&[[3.0]]),
            arr2(&[[4.0]]),
        )
        .unwrap();
        assert_eq!(
            concatenate_state_matrices(&g).unwrap(),
            arr2(&[[-1.0, 2.0], [3.0, 4.0]])
        );
        let k = State::gain(arr2(&[[5.0]])).unwrap();
        assert_eq!(concatenate_state_matrices(&k).unwrap(), arr2(&[[5.0]]));
    }
}
