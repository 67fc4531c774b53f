//! Matrix helpers shared by the model routines
//!
//! Thin wrappers over `ndarray-linalg` that tolerate zero-sized operands,
//! which LAPACK does not, plus block assembly routines.

use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use ndarray_linalg::{EigVals, Inverse, SVD};
use num_complex::Complex64;

use crate::error::{ModelError, Result};

/// Full singular value decomposition `a = u * diag(s) * vt`
pub(crate) struct FullSvd {
    pub u: Array2<f64>,
    pub s: Array1<f64>,
    pub vt: Array2<f64>,
}

pub(crate) fn full_svd(a: &Array2<f64>) -> Result<FullSvd> {
    let (rows, cols) = a.dim();
    if rows == 0 || cols == 0 {
        return Ok(FullSvd {
            u: Array2::eye(rows),
            s: Array1::zeros(0),
            vt: Array2::eye(cols),
        });
    }

    let (u, s, vt) = a.svd(true, true)?;
    let u = u.ok_or_else(|| ModelError::Numerical("SVD did not return U".to_string()))?;
    let vt = vt.ok_or_else(|| ModelError::Numerical("SVD did not return V'".to_string()))?;
    Ok(FullSvd { u, s, vt })
}

/// Singular values only
pub(crate) fn singular_values(a: &Array2<f64>) -> Result<Array1<f64>> {
    if a.is_empty() {
        return Ok(Array1::zeros(0));
    }
    let (_, s, _) = a.svd(false, false)?;
    Ok(s)
}

/// Number of singular values strictly above `tol`
pub(crate) fn rank_from_singular_values(s: &Array1<f64>, tol: f64) -> usize {
    s.iter().filter(|&&sv| sv > tol).count()
}

/// Numerical rank with the usual `sigma_max * max(rows, cols) * eps` cutoff
pub(crate) fn matrix_rank(a: &Array2<f64>) -> Result<usize> {
    let s = singular_values(a)?;
    let sigma_max = s.iter().cloned().fold(0.0, f64::max);
    let tol = sigma_max * (a.nrows().max(a.ncols()) as f64) * f64::EPSILON;
    Ok(rank_from_singular_values(&s, tol))
}

pub(crate) fn eigenvalues(a: &Array2<f64>) -> Result<Vec<Complex64>> {
    if a.is_empty() {
        return Ok(Vec::new());
    }
    Ok(a.eigvals()?.to_vec())
}

pub(crate) fn inverse(a: &Array2<f64>) -> Result<Array2<f64>> {
    if a.is_empty() {
        return Ok(a.clone());
    }
    Ok(a.inv()?)
}

pub(crate) fn frobenius_norm(a: &Array2<f64>) -> f64 {
    a.iter().map(|x| x * x).sum::<f64>().sqrt()
}

pub(crate) fn is_all_zero(a: &Array2<f64>) -> bool {
    a.iter().all(|&x| x == 0.0)
}

/// Block diagonal matrix `diag(B1, B2, ...)`; blocks may be zero-sized
/// or rectangular.
pub(crate) fn block_diag(blocks: &[ArrayView2<f64>]) -> Array2<f64> {
    let rows = blocks.iter().map(|b| b.nrows()).sum();
    let cols = blocks.iter().map(|b| b.ncols()).sum();
    let mut out = Array2::zeros((rows, cols));

    let (mut r, mut c) = (0, 0);
    for block in blocks {
        let (br, bc) = block.dim();
        out.slice_mut(s![r..r + br, c..c + bc]).assign(block);
        r += br;
        c += bc;
    }
    out
}

/// `[top; bottom]`
pub(crate) fn vstack(top: &Array2<f64>, bottom: &Array2<f64>) -> Result<Array2<f64>> {
    Ok(ndarray::concatenate(Axis(0), &[top.view(), bottom.view()])?)
}

/// `[left, right]`
pub(crate) fn hstack(left: &Array2<f64>, right: &Array2<f64>) -> Result<Array2<f64>> {
    Ok(ndarray::concatenate(Axis(1), &[left.view(), right.view()])?)
}

/// Reverse the column order
pub(crate) fn fliplr(a: &Array2<f64>) -> Array2<f64> {
    a.slice(s![.., ..;-1]).to_owned()
}

/// Circularly shift rows and columns up/left by `k`, i.e.
/// `out[i, j] = a[(i + k) % rows, (j + k) % cols]`.
pub(crate) fn roll_both(a: &Array2<f64>, k: usize) -> Array2<f64> {
    let (rows, cols) = a.dim();
    Array2::from_shape_fn((rows, cols), |(i, j)| a[((i + k) % rows, (j + k) % cols)])
}
