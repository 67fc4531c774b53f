//! Minimal Realization
//!
//! Removal of uncontrollable and unobservable modes from a state model.
//! Both reductions project the model onto an orthonormal basis of a
//! Krylov subspace computed with the SVD.

use ndarray::{s, Array2};

use crate::config::Tolerances;
use crate::error::{ModelError, Result};
use crate::linalg;
use crate::state::State;

/// Krylov matrix `[B AB A²B ... A^(n-1)B]`
fn krylov_matrix(a: &Array2<f64>, b: &Array2<f64>) -> Array2<f64> {
    let n = a.nrows();
    let m = b.ncols();
    let mut k = Array2::zeros((n, n * m));

    let mut block = b.clone();
    for step in 0..n {
        if step > 0 {
            block = a.dot(&block);
        }
        k.slice_mut(s![.., step * m..(step + 1) * m]).assign(&block);
    }
    k
}

/// Orthonormal basis of the Krylov subspace of `(a, b)` and its dimension.
///
/// The first `rank` columns of the returned matrix span the subspace; the
/// remaining columns span its orthogonal complement.
fn krylov_basis(
    a: &Array2<f64>,
    b: &Array2<f64>,
    tol: Option<f64>,
) -> Result<(Array2<f64>, usize)> {
    let n = a.nrows();
    if n == 0 {
        return Ok((Array2::zeros((0, 0)), 0));
    }
    let k = krylov_matrix(a, b);
    let svd = linalg::full_svd(&k)?;
    let sigma_max = svd.s.iter().cloned().fold(0.0, f64::max);
    let tol = tol.unwrap_or_else(|| {
        Tolerances::default().rank_threshold(k.nrows(), k.ncols(), sigma_max)
    });
    Ok((svd.u, linalg::rank_from_singular_values(&svd.s, tol)))
}

fn check_square(a: &Array2<f64>) -> Result<()> {
    if a.nrows() != a.ncols() {
        return Err(ModelError::Dimension(format!(
            "A must be square, got {}x{}",
            a.nrows(),
            a.ncols()
        )));
    }
    Ok(())
}

/// Dimension of the controllable subspace of `(A, B)`
///
/// # Arguments
///
/// * `a` - N×N state matrix
/// * `b` - N×M input matrix
/// * `tol` - Rank threshold on the singular values of the controllability
///   matrix. `None` uses `Tolerances::rank_threshold`.
///
/// # Returns
///
/// Numerical rank of `[B AB ... A^(n-1)B]`, between 0 and N.
///
/// # Examples
///
/// ```
/// use lti_rs::realization::controllable_order;
/// use ndarray::arr2;
///
/// // second state is not driven by the input
/// let a = arr2(&[[-1.0, 0.0], [0.0, -2.0]]);
/// let b = arr2(&[[1.0], [0.0]]);
/// assert_eq!(controllable_order(&a, &b, None).unwrap(), 1);
/// ```
pub fn controllable_order(a: &Array2<f64>, b: &Array2<f64>, tol: Option<f64>) -> Result<usize> {
    check_square(a)?;
    if b.nrows() != a.nrows() {
        return Err(ModelError::Dimension(format!(
            "B must have {} rows, got {}",
            a.nrows(),
            b.nrows()
        )));
    }
    Ok(krylov_basis(a, b, tol)?.1)
}

/// Dimension of the observable subspace of `(A, C)`, by duality with
/// `controllable_order(A', C')`.
pub fn observable_order(a: &Array2<f64>, c: &Array2<f64>, tol: Option<f64>) -> Result<usize> {
    check_square(a)?;
    if c.ncols() != a.nrows() {
        return Err(ModelError::Dimension(format!(
            "C must have {} columns, got {}",
            a.nrows(),
            c.ncols()
        )));
    }
    Ok(krylov_basis(&a.t().to_owned(), &c.t().to_owned(), tol)?.1)
}

/// Keep the leading `r` coordinates after the change of basis `x = U z`
fn project(
    a: &Array2<f64>,
    b: &Array2<f64>,
    c: &Array2<f64>,
    u: &Array2<f64>,
    r: usize,
) -> (Array2<f64>, Array2<f64>, Array2<f64>) {
    let ut = u.t();
    let a_new = ut.dot(a).dot(u).slice(s![..r, ..r]).to_owned();
    let b_new = ut.dot(b).slice(s![..r, ..]).to_owned();
    let c_new = c.dot(u).slice(s![.., ..r]).to_owned();
    (a_new, b_new, c_new)
}

/// Minimal realization of a state model
///
/// # Arguments
///
/// * `g` - Model to reduce
/// * `tol` - Rank threshold for both reductions. `None` picks one from
///   the size and scale of each Krylov matrix.
///
/// # Returns
///
/// A model with the same transfer matrix, sampling and feedthrough whose
/// states are all controllable and observable. Static gains come back
/// unchanged, and models whose dynamics vanish entirely become static
/// gains.
///
/// # Algorithm
///
/// 1. The range of `[B AB ... A^(n-1)B]` is `A`-invariant. Projecting on
///    an orthonormal basis of it (left singular vectors) drops the
///    uncontrollable modes.
/// 2. The same step on the dual `(A', C', B')` drops the unobservable
///    modes, since the range of the transposed observability matrix is
///    `A'`-invariant.
///
/// # Examples
///
/// ```
/// use lti_rs::{minimal_realization, transfer_to_state, Transfer};
///
/// // (s + 1)/((s + 1)(s + 2))
/// let g = Transfer::siso(&[1.0, 1.0], &[1.0, 3.0, 2.0]).unwrap();
/// let ss = transfer_to_state(&g).unwrap();
/// assert_eq!(ss.states(), 2);
///
/// let reduced = minimal_realization(&ss, None).unwrap();
/// assert_eq!(reduced.states(), 1);
/// assert!((reduced.poles()[0].re + 2.0).abs() < 1e-8);
/// ```
pub fn minimal_realization(g: &State, tol: Option<f64>) -> Result<State> {
    if g.is_gain() {
        return Ok(g.clone());
    }
    let (a, b, c, d) = g.matrices();
    let n = a.nrows();

    let (u, r) = krylov_basis(a, b, tol)?;
    let (a1, b1, c1) = if r < n {
        project(a, b, c, &u, r)
    } else {
        (a.clone(), b.clone(), c.clone())
    };

    let (v, r2) = krylov_basis(&a1.t().to_owned(), &c1.t().to_owned(), tol)?;
    let (a2, b2, c2) = if r2 < a1.nrows() {
        project(&a1, &b1, &c1, &v, r2)
    } else {
        (a1, b1, c1)
    };

    log::debug!(
        "minimal realization: {} states -> {} controllable -> {} minimal",
        n,
        r,
        r2
    );

    State::from_parts(a2, b2, c2, d.clone(), g.sampling())
}
