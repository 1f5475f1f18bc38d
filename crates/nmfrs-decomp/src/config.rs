//! Engine configuration
//!
//! One explicit configuration struct per engine, validated when the engine is
//! constructed. The real-valued engine resolves its `(divergence, algorithm)`
//! pair into an [`UpdateRule`] once; the iteration loop never re-dispatches on
//! configuration.

use crate::error::{NmfError, NmfResult};
use crate::real::{CauchyAlgorithm, UpdateRule};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default numerical floor
pub const EPS: f64 = 1e-12;

/// Divergence minimized by the real-valued engine
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Divergence {
    /// Squared error
    Euclidean,
    /// Generalized Kullback-Leibler
    KullbackLeibler,
    /// Itakura-Saito
    ItakuraSaito,
    /// Student-t with `nu` degrees of freedom
    StudentT { nu: f64 },
    /// Cauchy
    Cauchy,
}

impl Divergence {
    pub fn name(&self) -> &'static str {
        match self {
            Divergence::Euclidean => "euclidean",
            Divergence::KullbackLeibler => "kl",
            Divergence::ItakuraSaito => "is",
            Divergence::StudentT { .. } => "t",
            Divergence::Cauchy => "cauchy",
        }
    }
}

/// Update algorithm family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Algorithm {
    /// Majorize-minimize
    Mm,
    /// Minorize-equalize
    Me,
    /// Heuristic multiplicative update without the MM exponent (Cauchy only)
    NaiveMultiplicative,
    /// MM restructured to share intermediate ratios (Cauchy only)
    MmFast,
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Mm => "mm",
            Algorithm::Me => "me",
            Algorithm::NaiveMultiplicative => "naive-multiplicative",
            Algorithm::MmFast => "mm_fast",
        }
    }
}

fn check_common(n_basis: usize, eps: f64) -> NmfResult<()> {
    if n_basis == 0 {
        return Err(NmfError::InvalidConfiguration(
            "n_basis must be at least 1".into(),
        ));
    }
    if !(eps.is_finite() && eps > 0.0) {
        return Err(NmfError::InvalidConfiguration(format!(
            "eps must be finite and positive, got {}",
            eps
        )));
    }
    Ok(())
}

/// Configuration for the real-valued NMF engine
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RealNmfConfig {
    /// Number of basis components
    pub n_basis: usize,

    /// Domain exponent in [1, 2]: the model is `(T·V)^(2/domain)`,
    /// 1 for amplitude-like and 2 for power-like factorization
    pub domain: f64,

    /// Numerical floor applied before divisions, logarithms and powers
    pub eps: f64,

    pub divergence: Divergence,

    pub algorithm: Algorithm,

    /// Seed for the random initialization; `None` draws a fresh seed
    pub seed: Option<u64>,
}

impl Default for RealNmfConfig {
    fn default() -> Self {
        Self {
            n_basis: 2,
            domain: 2.0,
            eps: EPS,
            divergence: Divergence::Euclidean,
            algorithm: Algorithm::Mm,
            seed: None,
        }
    }
}

impl RealNmfConfig {
    /// Euclidean NMF with the MM update
    pub fn euclidean(n_basis: usize) -> Self {
        Self {
            n_basis,
            ..Default::default()
        }
    }

    /// Generalized-KL NMF with the MM update
    pub fn kl(n_basis: usize) -> Self {
        Self {
            n_basis,
            divergence: Divergence::KullbackLeibler,
            ..Default::default()
        }
    }

    /// Itakura-Saito NMF with the MM update
    pub fn itakura_saito(n_basis: usize) -> Self {
        Self {
            n_basis,
            divergence: Divergence::ItakuraSaito,
            ..Default::default()
        }
    }

    /// Student-t NMF (`nu = 1e3`)
    pub fn student_t(n_basis: usize) -> Self {
        Self {
            n_basis,
            divergence: Divergence::StudentT { nu: 1e3 },
            ..Default::default()
        }
    }

    /// Cauchy NMF with the naive multiplicative update
    pub fn cauchy(n_basis: usize) -> Self {
        Self {
            n_basis,
            divergence: Divergence::Cauchy,
            algorithm: Algorithm::NaiveMultiplicative,
            ..Default::default()
        }
    }

    pub fn with_domain(mut self, domain: f64) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate and resolve the update rule
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if `n_basis` is zero, `eps` is not a positive
    /// finite number, `domain` lies outside [1, 2], or the divergence does not
    /// support the requested algorithm at this domain.
    pub fn resolve(&self) -> NmfResult<UpdateRule> {
        check_common(self.n_basis, self.eps)?;

        let domain = self.domain;
        if !(domain.is_finite() && (1.0..=2.0).contains(&domain)) {
            return Err(NmfError::InvalidConfiguration(format!(
                "1 <= domain <= 2 is not satisfied (domain = {})",
                domain
            )));
        }

        let unsupported = || {
            NmfError::InvalidConfiguration(format!(
                "{} divergence does not support the '{}' algorithm",
                self.divergence.name(),
                self.algorithm.name()
            ))
        };
        let require_power_domain = || -> NmfResult<()> {
            if domain != 2.0 {
                return Err(NmfError::InvalidConfiguration(format!(
                    "{} divergence with '{}' requires domain = 2 (domain = {})",
                    self.divergence.name(),
                    self.algorithm.name(),
                    domain
                )));
            }
            Ok(())
        };

        match (self.divergence, self.algorithm) {
            (Divergence::Euclidean, Algorithm::Mm) => Ok(UpdateRule::EuclideanMm),
            (Divergence::KullbackLeibler, Algorithm::Mm) => Ok(UpdateRule::KlMm),
            (Divergence::ItakuraSaito, Algorithm::Mm) => Ok(UpdateRule::ItakuraSaitoMm),
            (Divergence::ItakuraSaito, Algorithm::Me) => {
                require_power_domain()?;
                Ok(UpdateRule::ItakuraSaitoMe)
            }
            (Divergence::StudentT { nu }, Algorithm::Mm) => {
                if !(nu.is_finite() && nu > 0.0) {
                    return Err(NmfError::InvalidConfiguration(format!(
                        "degrees of freedom must be finite and positive, got {}",
                        nu
                    )));
                }
                require_power_domain()?;
                Ok(UpdateRule::StudentTMm { nu })
            }
            (Divergence::Cauchy, algorithm) => {
                require_power_domain()?;
                let variant = match algorithm {
                    Algorithm::NaiveMultiplicative => CauchyAlgorithm::NaiveMultiplicative,
                    Algorithm::Mm => CauchyAlgorithm::Mm,
                    Algorithm::Me => CauchyAlgorithm::Me,
                    Algorithm::MmFast => CauchyAlgorithm::MmFast,
                };
                Ok(UpdateRule::Cauchy(variant))
            }
            _ => Err(unsupported()),
        }
    }
}

/// Phase initialization for complex NMF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PhaseInit {
    /// Every component starts from the target's phase
    #[default]
    Target,
    /// Uniform random phases in [0, 2π)
    Random,
}

/// Configuration for the complex NMF engine
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComplexNmfConfig {
    pub n_basis: usize,

    /// Weight of the L_p sparsity penalty on the activations
    pub regularizer: f64,

    /// Exponent of the sparsity penalty
    pub p: f64,

    pub eps: f64,

    pub phase_init: PhaseInit,

    pub seed: Option<u64>,
}

impl Default for ComplexNmfConfig {
    fn default() -> Self {
        Self {
            n_basis: 2,
            regularizer: 0.1,
            p: 1.0,
            eps: EPS,
            phase_init: PhaseInit::Target,
            seed: None,
        }
    }
}

impl ComplexNmfConfig {
    pub fn new(n_basis: usize) -> Self {
        Self {
            n_basis,
            ..Default::default()
        }
    }

    pub fn with_regularizer(mut self, regularizer: f64) -> Self {
        self.regularizer = regularizer;
        self
    }

    pub fn with_p(mut self, p: f64) -> Self {
        self.p = p;
        self
    }

    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    pub fn with_phase_init(mut self, phase_init: PhaseInit) -> Self {
        self.phase_init = phase_init;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> NmfResult<()> {
        check_common(self.n_basis, self.eps)?;
        if !(self.regularizer.is_finite() && self.regularizer >= 0.0) {
            return Err(NmfError::InvalidConfiguration(format!(
                "regularizer must be finite and non-negative, got {}",
                self.regularizer
            )));
        }
        if !(self.p.is_finite() && self.p > 0.0) {
            return Err(NmfError::InvalidConfiguration(format!(
                "sparsity exponent p must be finite and positive, got {}",
                self.p
            )));
        }
        Ok(())
    }
}

/// Configuration for the multichannel IS-NMF engine
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MultichannelNmfConfig {
    pub n_basis: usize,

    /// Rescale every spatial covariance block to unit trace after its update
    pub normalize: bool,

    pub eps: f64,

    pub seed: Option<u64>,
}

impl Default for MultichannelNmfConfig {
    fn default() -> Self {
        Self {
            n_basis: 10,
            normalize: true,
            eps: EPS,
            seed: None,
        }
    }
}

impl MultichannelNmfConfig {
    pub fn new(n_basis: usize) -> Self {
        Self {
            n_basis,
            ..Default::default()
        }
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> NmfResult<()> {
        check_common(self.n_basis, self.eps)
    }
}
