//! lti-rs: transfer function and state-space models of LTI systems
//!
//! This crate provides the two classical representations of linear
//! time-invariant systems together with their algebra and the conversions
//! between them. Numerical kernels (eigenvalues, SVD, linear solves) are
//! delegated to LAPACK through `ndarray-linalg`.
//!
//! # Organization
//!
//! - `poly`: polynomial routines (arithmetic, roots, companion matrices, LCM)
//! - `sampling`: continuous/discrete sampling and discretization metadata
//! - `transfer`: the `Transfer` model (matrices of rational functions)
//! - `state`: the `State` model (A, B, C, D matrices)
//! - `convert`: conversions between the two and transmission zeros
//! - `realization`: controllable/observable orders and minimal realizations
//! - `model`: the `Lti` sum type for mixed arithmetic and pole properties
//! - `config`: numerical tolerances
//! - `error`: the crate error type
//!
//! # Example
//!
//! ```
//! use lti_rs::Transfer;
//!
//! let g = Transfer::siso(&[1.0], &[1.0, 1.0]).unwrap();
//! let h = Transfer::siso(&[1.0], &[1.0, 2.0]).unwrap();
//! let sum = g.try_add(&h).unwrap();
//!
//! let (num, den) = sum.entry(0, 0).unwrap();
//! assert_eq!(num, &vec![2.0, 3.0]);
//! assert_eq!(den, &vec![1.0, 3.0, 2.0]);
//! assert!(sum.is_stable());
//! ```

pub mod config;
pub mod convert;
pub mod error;
mod linalg;
pub mod model;
pub mod poly;
pub mod realization;
pub mod sampling;
pub mod state;
pub mod transfer;

pub use config::Tolerances;
pub use convert::{
    concatenate_state_matrices, state_to_transfer, transfer_to_state, transmission_zeros,
};
pub use error::{ModelError, Result};
pub use model::{pole_properties, Lti, PoleProperty};
pub use realization::minimal_realization;
pub use sampling::{Discretization, DiscretizationMethod, Sampling, SamplingSet};
pub use state::State;
pub use transfer::Transfer;
