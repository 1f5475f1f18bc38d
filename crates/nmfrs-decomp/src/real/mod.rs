//! Real-valued NMF
//!
//! Factorizes a non-negative `(bins, frames)` matrix `Z` as
//! `Z ≈ (T·V)^(2/domain)` with `T ≥ 0` of shape `(bins, n_basis)` and `V ≥ 0`
//! of shape `(n_basis, frames)`.
//!
//! Every update rule is multiplicative: each factor is multiplied elementwise
//! by a ratio of non-negative quantities, possibly raised to a
//! divergence-specific exponent, so non-negativity is preserved by
//! construction. One step updates the basis first and then the activation
//! using the fresh basis.
//!
//! # Example
//!
//! ```
//! use scirs2_core::ndarray_ext::array;
//! use nmfrs_decomp::{RealNmf, RealNmfConfig};
//!
//! let target = array![[1.0, 2.0, 3.0], [2.0, 4.0, 6.0]];
//! let mut nmf = RealNmf::new(RealNmfConfig::euclidean(1).with_seed(0))?;
//! let factors = nmf.run(&target, 100)?;
//!
//! assert_eq!(factors.basis.dim(), (2, 1));
//! assert_eq!(nmf.loss().len(), 100);
//! # Ok::<(), nmfrs_decomp::NmfError>(())
//! ```

mod cauchy;
mod euclidean;
mod itakura_saito;
mod kl;
mod student_t;

use crate::config::{Divergence, RealNmfConfig};
use crate::driver::{iterate, Factorization};
use crate::error::{NmfError, NmfResult};
use crate::factors::NmfFactors;
use crate::init::{rng_from_seed, uniform_matrix};
use nmfrs_kernels::divergence;
use nmfrs_kernels::is_nonnegative_finite;
use scirs2_core::ndarray_ext::{Array2, Zip};

/// Variant of the Cauchy update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CauchyAlgorithm {
    /// Ratio of the gradient terms with no exponent
    NaiveMultiplicative,
    /// Majorize-minimize with square-root exponent
    Mm,
    /// Minorize-equalize, closed-form root of a quadratic
    Me,
    /// Majorize-minimize sharing the `Z / (C·TV)` intermediate
    MmFast,
}

/// Update rule resolved from a `(divergence, algorithm)` pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateRule {
    EuclideanMm,
    KlMm,
    ItakuraSaitoMm,
    ItakuraSaitoMe,
    StudentTMm { nu: f64 },
    Cauchy(CauchyAlgorithm),
}

impl UpdateRule {
    pub fn name(&self) -> &'static str {
        match self {
            UpdateRule::EuclideanMm => "euclidean-mm",
            UpdateRule::KlMm => "kl-mm",
            UpdateRule::ItakuraSaitoMm => "is-mm",
            UpdateRule::ItakuraSaitoMe => "is-me",
            UpdateRule::StudentTMm { .. } => "t-mm",
            UpdateRule::Cauchy(CauchyAlgorithm::NaiveMultiplicative) => "cauchy-naive",
            UpdateRule::Cauchy(CauchyAlgorithm::Mm) => "cauchy-mm",
            UpdateRule::Cauchy(CauchyAlgorithm::Me) => "cauchy-me",
            UpdateRule::Cauchy(CauchyAlgorithm::MmFast) => "cauchy-mm_fast",
        }
    }

    /// Multiplicative factor for one side of the factorization
    fn multiplier(&self, side: Side, factors: &NmfFactors, target: &Array2<f64>, domain: f64, eps: f64) -> Array2<f64> {
        let ctx = UpdateContext {
            side,
            basis: &factors.basis,
            activation: &factors.activation,
            target,
            domain,
            eps,
        };
        match *self {
            UpdateRule::EuclideanMm => euclidean::mm(&ctx),
            UpdateRule::KlMm => kl::mm(&ctx),
            UpdateRule::ItakuraSaitoMm => itakura_saito::mm(&ctx),
            UpdateRule::ItakuraSaitoMe => itakura_saito::me(&ctx),
            UpdateRule::StudentTMm { nu } => student_t::mm(&ctx, nu),
            UpdateRule::Cauchy(algorithm) => cauchy::multiplier(&ctx, algorithm),
        }
    }

    /// One Gauss-Seidel step: basis, then activation with the new basis
    pub(crate) fn step(&self, factors: &mut NmfFactors, target: &Array2<f64>, domain: f64, eps: f64) {
        let factor = self.multiplier(Side::Basis, factors, target, domain, eps);
        factors.basis *= &factor;
        tracing::trace!(rule = self.name(), "basis updated");

        let factor = self.multiplier(Side::Activation, factors, target, domain, eps);
        factors.activation *= &factor;
        tracing::trace!(rule = self.name(), "activation updated");
    }
}

/// Which factor an update produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Basis,
    Activation,
}

/// Inputs shared by every rule for one half-step
pub(crate) struct UpdateContext<'a> {
    pub side: Side,
    pub basis: &'a Array2<f64>,
    pub activation: &'a Array2<f64>,
    pub target: &'a Array2<f64>,
    pub domain: f64,
    pub eps: f64,
}

impl UpdateContext<'_> {
    /// Current product `T·V` floored at `eps`
    pub fn product(&self) -> Array2<f64> {
        let mut tv = self.basis.dot(self.activation);
        nmfrs_kernels::floor_inplace(&mut tv, self.eps);
        tv
    }

    /// Contract a `(bins, frames)` map onto the shape of the factor being
    /// updated: `M·Vᵀ` for the basis, `Tᵀ·M` for the activation
    pub fn project(&self, m: &Array2<f64>) -> Array2<f64> {
        match self.side {
            Side::Basis => m.dot(&self.activation.t()),
            Side::Activation => self.basis.t().dot(m),
        }
    }

    /// `project(m)` floored at `eps`, for use as a denominator
    pub fn project_floored(&self, m: &Array2<f64>) -> Array2<f64> {
        let mut p = self.project(m);
        nmfrs_kernels::floor_inplace(&mut p, self.eps);
        p
    }
}

/// `(num / den)^exponent`, elementwise
pub(crate) fn ratio_pow(num: &Array2<f64>, den: &Array2<f64>, exponent: f64) -> Array2<f64> {
    Zip::from(num).and(den).map_collect(|&n, &d| {
        let r = n / d;
        if exponent == 1.0 {
            r
        } else if exponent == 0.5 {
            r.sqrt()
        } else {
            r.powf(exponent)
        }
    })
}

/// Engine state driven by [`iterate`]
struct RealState {
    factors: NmfFactors,
    rule: UpdateRule,
    divergence: Divergence,
    domain: f64,
    eps: f64,
}

impl Factorization for RealState {
    type Target = Array2<f64>;

    fn update_once(&mut self, target: &Array2<f64>) -> NmfResult<()> {
        self.rule.step(&mut self.factors, target, self.domain, self.eps);
        Ok(())
    }

    fn objective(&self, target: &Array2<f64>) -> NmfResult<f64> {
        let r = self.factors.reconstruct(self.domain);
        let (r, z) = (r.view(), target.view());
        let eps = self.eps;
        let loss = match self.divergence {
            Divergence::Euclidean => divergence::euclidean(&r, &z)?,
            Divergence::KullbackLeibler => divergence::generalized_kl(&r, &z, eps)?,
            Divergence::ItakuraSaito => divergence::itakura_saito(&r, &z, eps)?,
            Divergence::StudentT { nu } => divergence::student_t(&r, &z, nu, eps)?,
            Divergence::Cauchy => divergence::cauchy(&r, &z, eps)?,
        };
        Ok(loss.sum())
    }
}

/// Reject empty, negative or non-finite targets
pub(crate) fn validate_target(target: &Array2<f64>) -> NmfResult<()> {
    if target.is_empty() {
        return Err(NmfError::InvalidShape(format!(
            "target must be non-empty, got shape {:?}",
            target.shape()
        )));
    }
    if !is_nonnegative_finite(target) {
        return Err(NmfError::PreconditionViolation(
            "target must be finite and non-negative".into(),
        ));
    }
    Ok(())
}

/// Real-valued NMF engine
///
/// Holds the configuration, the resolved update rule and, after a run, the
/// factors and the loss trace. Not meant for concurrent use: `run` and
/// `resume` take `&mut self`.
#[derive(Debug, Clone)]
pub struct RealNmf {
    config: RealNmfConfig,
    rule: UpdateRule,
    factors: Option<NmfFactors>,
    loss: Vec<f64>,
}

impl RealNmf {
    /// Create an engine after validating the configuration
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` for an out-of-range domain, `n_basis` or `eps`,
    /// or an unsupported divergence/algorithm pair.
    pub fn new(config: RealNmfConfig) -> NmfResult<Self> {
        let rule = config.resolve()?;
        Ok(Self {
            config,
            rule,
            factors: None,
            loss: Vec::new(),
        })
    }

    pub fn config(&self) -> &RealNmfConfig {
        &self.config
    }

    pub fn rule(&self) -> UpdateRule {
        self.rule
    }

    /// Loss per completed iteration since the last `run`
    pub fn loss(&self) -> &[f64] {
        &self.loss
    }

    /// Current factors, if a run has happened
    pub fn factors(&self) -> Option<&NmfFactors> {
        self.factors.as_ref()
    }

    /// Current model `(T·V)^(2/domain)`, if a run has happened
    pub fn reconstruct(&self) -> Option<Array2<f64>> {
        self.factors
            .as_ref()
            .map(|f| f.reconstruct(self.config.domain))
    }

    /// Initialize the factors randomly and run `iterations` steps
    ///
    /// The loss trace is reset. Returns a copy of the final factors.
    ///
    /// # Errors
    ///
    /// `InvalidShape` for an empty target, `PreconditionViolation` for a
    /// target with negative or non-finite entries, `NumericalInstability` if
    /// the loss stops being finite.
    pub fn run(&mut self, target: &Array2<f64>, iterations: usize) -> NmfResult<NmfFactors> {
        validate_target(target)?;

        let (n_bins, n_frames) = target.dim();
        let n_basis = self.config.n_basis;
        let mut rng = rng_from_seed(self.config.seed);
        let basis = uniform_matrix(&mut rng, (n_bins, n_basis));
        let activation = uniform_matrix(&mut rng, (n_basis, n_frames));

        self.factors = Some(NmfFactors { basis, activation });
        self.loss.clear();
        self.continue_run(target, iterations)
    }

    /// Continue from the factors of the previous run
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` if no run has happened yet or the target shape
    /// differs from the one the factors were fitted to, plus the errors of
    /// [`RealNmf::run`].
    pub fn resume(&mut self, target: &Array2<f64>, iterations: usize) -> NmfResult<NmfFactors> {
        validate_target(target)?;
        let factors = self.factors.as_ref().ok_or_else(|| {
            NmfError::PreconditionViolation("no factorization to resume; call run first".into())
        })?;
        let fitted = (factors.basis.nrows(), factors.activation.ncols());
        if fitted != target.dim() {
            return Err(NmfError::PreconditionViolation(format!(
                "target shape {:?} differs from fitted shape {:?}",
                target.dim(),
                fitted
            )));
        }
        self.continue_run(target, iterations)
    }

    fn continue_run(&mut self, target: &Array2<f64>, iterations: usize) -> NmfResult<NmfFactors> {
        let factors = self.factors.take().ok_or_else(|| {
            NmfError::PreconditionViolation("no factorization state".into())
        })?;

        tracing::info!(
            rule = self.rule.name(),
            bins = target.nrows(),
            frames = target.ncols(),
            n_basis = self.config.n_basis,
            domain = self.config.domain,
            iterations,
            "starting real nmf"
        );

        let mut state = RealState {
            factors,
            rule: self.rule,
            divergence: self.config.divergence,
            domain: self.config.domain,
            eps: self.config.eps,
        };
        let outcome = iterate(&mut state, target, iterations, &mut self.loss);
        self.factors = Some(state.factors);
        outcome?;

        tracing::info!(
            rule = self.rule.name(),
            final_loss = self.loss.last().copied(),
            "finished real nmf"
        );

        self.factors
            .clone()
            .ok_or_else(|| NmfError::PreconditionViolation("no factorization state".into()))
    }
}
