//! Error types for lti-rs

use ndarray::ShapeError;
use ndarray_linalg::error::LinalgError;
use thiserror::Error;

/// Errors raised while building or combining system models
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid polynomial: {0}")]
    InvalidPolynomial(String),

    #[error(
        "Noncausal entry at row {row}, column {col}: numerator degree {num_degree} \
         exceeds denominator degree {den_degree}"
    )]
    Noncausal {
        row: usize,
        col: usize,
        num_degree: usize,
        den_degree: usize,
    },

    #[error("Shapes don't match for {operation}: {left:?} vs. {right:?}")]
    ShapeMismatch {
        operation: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("Dimension error: {0}")]
    Dimension(String),

    #[error("Sampling periods of the models don't match for {operation}")]
    SamplingMismatch { operation: &'static str },

    #[error("Sampling period must be a finite positive number, got {0}")]
    InvalidSamplingPeriod(f64),

    #[error("Discretization error: {0}")]
    Discretization(String),

    #[error("Only static gain models can be converted to arrays")]
    NotAStaticGain,

    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Numerical failure: {0}")]
    Numerical(String),

    #[error("Linear algebra failure: {0}")]
    Linalg(#[from] LinalgError),

    #[error("Array shape error: {0}")]
    Shape(#[from] ShapeError),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ModelError>;
