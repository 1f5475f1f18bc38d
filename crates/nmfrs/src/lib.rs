//! # nmfrs - Nonnegative Matrix Factorization for Audio Spectrograms
//!
//! This is the **meta crate** re-exporting the nmfrs components.
//!
//! ## Quick Start
//!
//! ```
//! use nmfrs::prelude::*;
//! use scirs2_core::ndarray_ext::Array2;
//!
//! // A (bins, frames) power spectrogram
//! let spectrogram = Array2::from_shape_fn((32, 40), |(i, j)| 1.0 + ((i + 3 * j) % 7) as f64);
//!
//! let mut nmf = RealNmf::new(RealNmfConfig::itakura_saito(4).with_seed(1))?;
//! let factors = nmf.run(&spectrogram, 30)?;
//! assert_eq!(factors.activation.dim(), (4, 40));
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Components
//!
//! ### Kernels ([`kernels`])
//!
//! Elementwise divergences, batched Hermitian matrix kernels and the
//! small-matrix Riccati solver.
//!
//! ```
//! use nmfrs::kernels::divergence::generalized_kl;
//! use scirs2_core::ndarray_ext::array;
//!
//! let x = array![[1.0_f64, 2.0]];
//! let d = generalized_kl(&x.view(), &x.view(), 1e-12).unwrap();
//! assert!(d.sum().abs() < 1e-12);
//! ```
//!
//! ### Engines ([`decomp`])
//!
//! - [`RealNmf`](decomp::RealNmf): Euclidean, KL, Itakura-Saito, Student-t
//!   and Cauchy NMF
//! - [`ComplexNmf`](decomp::ComplexNmf): amplitude and phase of complex
//!   spectrograms
//! - [`MultichannelNmf`](decomp::MultichannelNmf): multichannel IS-NMF with
//!   spatial covariances
//!
//! ### Logging ([`tracing_support`])
//!
//! Subscriber initialization for the structured `tracing` events the engines
//! emit.
//!
//! ## Feature Flags
//!
//! - `tracing` (default): [`tracing_support::init_tracing`] installs a
//!   `tracing-subscriber` registry
//! - `parallel`: per-bin small-matrix kernels run in parallel
//! - `serde`: serialization of the configuration types

pub use nmfrs_decomp as decomp;
pub use nmfrs_kernels as kernels;

pub mod tracing_support;

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```
    //! use nmfrs::prelude::*;
    //!
    //! let config = RealNmfConfig::kl(3).with_domain(1.0);
    //! assert!(RealNmf::new(config).is_ok());
    //! ```

    // Engines and their configuration
    pub use crate::decomp::{
        Algorithm, ComplexNmf, ComplexNmfConfig, Divergence, MultichannelNmf,
        MultichannelNmfConfig, PhaseInit, RealNmf, RealNmfConfig,
    };

    // Results
    pub use crate::decomp::{
        apply_amplitude_ratio, separate, ComplexFactors, NmfFactors, SpatialFactors,
    };

    // Errors
    pub use crate::decomp::{NmfError, NmfResult};
    pub use crate::kernels::{KernelError, KernelResult};
}
