//! # nmfrs-decomp - Non-negative Matrix Factorization Engines
//!
//! Iterative multiplicative-update solvers that decompose audio spectrograms
//! (or multichannel covariance tensors) into a few non-negative components.
//!
//! ## Overview
//!
//! ### Real-valued NMF
//!
//! Approximates a non-negative `(bins, frames)` matrix as `(T·V)^(2/domain)`
//! under one of five divergences:
//!
//! | Divergence | Algorithms | Domain |
//! |---|---|---|
//! | Euclidean | MM | [1, 2] |
//! | Generalized KL | MM | [1, 2] |
//! | Itakura-Saito | MM, ME | [1, 2] (ME: 2) |
//! | Student-t | MM | 2 |
//! | Cauchy | naive multiplicative, MM, ME, MM fast | 2 |
//!
//! ### Complex NMF
//!
//! Fits non-negative amplitudes plus a free phase per component and
//! time-frequency cell to a complex spectrogram, with an L_p sparsity
//! penalty on the activations.
//!
//! ### Multichannel IS-NMF
//!
//! Fits per-bin spatial covariance matrices together with the basis and
//! activations to a `(bins, frames, channels, channels)` covariance tensor.
//!
//! ## Quick Start
//!
//! ```
//! use scirs2_core::ndarray_ext::Array2;
//! use nmfrs_decomp::{Algorithm, RealNmf, RealNmfConfig};
//!
//! let spectrogram = Array2::from_shape_fn((16, 20), |(i, j)| 1.0 + ((i * j) % 5) as f64);
//!
//! let config = RealNmfConfig::cauchy(3).with_algorithm(Algorithm::Mm).with_seed(42);
//! let mut nmf = RealNmf::new(config)?;
//! let factors = nmf.run(&spectrogram, 50)?;
//!
//! assert_eq!(factors.basis.dim(), (16, 3));
//! println!("final loss: {:?}", nmf.loss().last());
//! # Ok::<(), nmfrs_decomp::NmfError>(())
//! ```
//!
//! ## Iteration Model
//!
//! Every engine runs a fixed number of iterations through [`driver::iterate`]
//! and records one loss per iteration. There is no convergence test; inspect
//! the loss trace afterwards.
//!
//! ## Feature Flags
//!
//! - `parallel`: batched small-matrix kernels run across frequency bins in
//!   parallel
//! - `serde`: `Serialize`/`Deserialize` for the configuration types

pub mod complex;
pub mod config;
pub mod driver;
pub mod error;
pub mod factors;
pub mod multichannel;
pub mod real;
pub mod separation;

mod init;


// Re-exports
pub use complex::ComplexNmf;
pub use config::{
    Algorithm, ComplexNmfConfig, Divergence, MultichannelNmfConfig, PhaseInit, RealNmfConfig, EPS,
};
pub use driver::{iterate, Factorization};
pub use error::{NmfError, NmfResult};
pub use factors::{ComplexFactors, NmfFactors, SpatialFactors};
pub use multichannel::{MultichannelNmf, MultichannelState};
pub use real::{CauchyAlgorithm, RealNmf, UpdateRule};
pub use separation::{apply_amplitude_ratio, separate};
