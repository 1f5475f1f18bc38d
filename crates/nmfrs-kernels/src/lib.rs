//! # nmfrs-kernels
//!
//! Numerical kernels for the nmfrs factorization engines.
//!
//! ## Overview
//!
//! - **Divergences** ([`divergence`]): elementwise Euclidean, generalized KL,
//!   Itakura-Saito, Cauchy and Student-t losses, plus the multichannel
//!   Itakura-Saito divergence between batches of covariance matrices.
//! - **Hermitian kernels** ([`hermitian`]): inversion, eigenvalues and
//!   spectral matrix functions of small Hermitian matrices, batched over
//!   frequency bins.
//! - **Riccati solver** ([`riccati`]): the PSD solution of `H·A·H = B`, used
//!   by the multichannel spatial covariance update.
//! - **Utilities** ([`utils`]): `eps` flooring and shape checks.
//!
//! ## Quick Start
//!
//! ```rust
//! use scirs2_core::ndarray_ext::array;
//! use nmfrs_kernels::divergence::itakura_saito;
//!
//! let reconstruction = array![[1.0_f64, 2.0], [0.5, 4.0]];
//! let observation = array![[1.0, 1.0], [1.0, 4.0]];
//! let loss = itakura_saito(&reconstruction.view(), &observation.view(), 1e-12).unwrap();
//! assert_eq!(loss.shape(), &[2, 2]);
//! assert!(loss[[0, 0]].abs() < 1e-12);
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel`: batched inversions and Riccati solves run across frequency
//!   bins through `scirs2_core::parallel_ops`.

pub mod divergence;
pub mod error;
pub mod hermitian;
pub mod riccati;
pub mod utils;

#[cfg(test)]
mod property_tests;

pub use error::{KernelError, KernelResult};
pub use riccati::{solve_riccati, solve_riccati_batch};
pub use utils::{check_same_shape, floor_inplace, floored, is_nonnegative_finite};
