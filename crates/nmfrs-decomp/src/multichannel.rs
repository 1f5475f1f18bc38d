//! Multichannel Itakura-Saito NMF
//!
//! Factorizes a tensor of per-bin, per-frame channel covariance matrices
//! `X[i,j]` (shape `(bins, frames, n, n)`) as
//!
//! ```text
//! X̂[i,j] = Σ_k H[i,k] · T[i,k] · V[k,j]
//! ```
//!
//! where each spatial covariance `H[i,k]` is an `n × n` Hermitian PSD
//! matrix. One step runs three sub-updates, each against a freshly computed
//! `X̂` and its conditioned inverse `P = (X̂ + eps·I)⁻¹`:
//!
//! - basis: `T ← T · sqrt(Σ_j V·tr(P X P H) / Σ_j V·tr(P H))`
//! - activation: `V ← V · sqrt(Σ_i T·tr(P X P H) / Σ_i T·tr(P H))`
//! - spatial: `H ← riccati(Σ_j V·P, H·(Σ_j V·P X P)·H) + eps·I`,
//!   optionally rescaled to unit trace with the scale moved into `T`
//!
//! Previous factors can be passed back in through `prior` to continue a
//! factorization.

use crate::config::MultichannelNmfConfig;
use crate::driver::{iterate, Factorization};
use crate::error::{NmfError, NmfResult};
use crate::factors::{covariance_model, SpatialFactors};
use crate::init::{rng_from_seed, uniform_matrix};
use nmfrs_kernels::divergence::multichannel_is;
use nmfrs_kernels::hermitian::{
    add_scaled_identity, batch_inverse, batch_sandwich, identity, trace, trace_product,
};
use nmfrs_kernels::solve_riccati_batch;
use scirs2_core::ndarray_ext::{s, Array2, Array3, Array4, Axis};
use scirs2_core::numeric::Complex64;

/// Mutable factorization state, exposed so that the three sub-updates can be
/// driven and inspected one at a time
#[derive(Debug, Clone)]
pub struct MultichannelState {
    factors: SpatialFactors,
    normalize: bool,
    eps: f64,
}

/// `P` and `P·X·P` for the current model
struct Precision {
    inv: Array4<Complex64>,
    sandwich: Array4<Complex64>,
}

/// Check a `(bins, frames, n, n)` covariance target; returns `(bins, frames, n)`
fn validate_covariance_target(target: &Array4<Complex64>) -> NmfResult<(usize, usize, usize)> {
    let (n_bins, n_frames, n, m) = target.dim();
    if n != m {
        return Err(NmfError::InvalidShape(format!(
            "trailing dimensions must be square, got {:?}",
            target.shape()
        )));
    }
    if n_bins == 0 || n_frames == 0 || n == 0 {
        return Err(NmfError::InvalidShape(format!(
            "target must be non-empty, got shape {:?}",
            target.shape()
        )));
    }
    if target.iter().any(|z| !(z.re.is_finite() && z.im.is_finite())) {
        return Err(NmfError::PreconditionViolation(
            "target must be finite".into(),
        ));
    }
    Ok((n_bins, n_frames, n))
}

impl MultichannelState {
    /// Build the state for `target`, from `prior` if given, otherwise from
    /// random amplitudes and identity spatial covariances
    ///
    /// # Errors
    ///
    /// `InvalidShape` if the target is not a non-empty stack of square
    /// matrices or `prior` does not match the target and `n_basis`;
    /// `PreconditionViolation` for non-finite target entries.
    pub fn initialize(
        target: &Array4<Complex64>,
        config: &MultichannelNmfConfig,
        prior: Option<SpatialFactors>,
    ) -> NmfResult<Self> {
        config.validate()?;
        let (n_bins, n_frames, n) = validate_covariance_target(target)?;
        let n_basis = config.n_basis;

        let factors = match prior {
            Some(prior) => {
                let expected_spatial = [n_bins, n_basis, n, n];
                if prior.basis.dim() != (n_bins, n_basis)
                    || prior.activation.dim() != (n_basis, n_frames)
                    || prior.spatial.shape() != expected_spatial
                {
                    tracing::warn!(
                        basis = ?prior.basis.dim(),
                        activation = ?prior.activation.dim(),
                        spatial = ?prior.spatial.shape(),
                        "rejecting warm-start factors"
                    );
                    return Err(NmfError::InvalidShape(format!(
                        "prior factors do not match target {:?} with {} bases",
                        target.shape(),
                        n_basis
                    )));
                }
                prior
            }
            None => {
                let mut rng = rng_from_seed(config.seed);
                let basis = uniform_matrix(&mut rng, (n_bins, n_basis));
                let activation = uniform_matrix(&mut rng, (n_basis, n_frames));
                let eye = identity(n);
                let mut spatial = Array4::<Complex64>::zeros((n_bins, n_basis, n, n));
                for mut block in spatial.outer_iter_mut() {
                    for mut h in block.outer_iter_mut() {
                        h.assign(&eye);
                    }
                }
                SpatialFactors {
                    basis,
                    activation,
                    spatial,
                }
            }
        };

        Ok(Self {
            factors,
            normalize: config.normalize,
            eps: config.eps,
        })
    }

    pub fn factors(&self) -> &SpatialFactors {
        &self.factors
    }

    pub fn into_factors(self) -> SpatialFactors {
        self.factors
    }

    fn check_target(&self, target: &Array4<Complex64>) -> NmfResult<()> {
        let (n_bins, n_basis) = self.factors.basis.dim();
        let n_frames = self.factors.activation.ncols();
        let n = self.factors.n_channels();
        if target.shape() != [n_bins, n_frames, n, n] {
            return Err(NmfError::InvalidShape(format!(
                "target shape {:?} does not match state with {} bases, {} bins, {} frames, {} channels",
                target.shape(),
                n_basis,
                n_bins,
                n_frames,
                n
            )));
        }
        Ok(())
    }

    fn precision(&self, target: &Array4<Complex64>) -> NmfResult<Precision> {
        self.check_target(target)?;
        let x_hat = self.factors.reconstruct();
        let inv = batch_inverse(&x_hat.view(), self.eps)?;
        let sandwich = batch_sandwich(&inv.view(), &target.view())?;
        Ok(Precision { inv, sandwich })
    }

    /// `(tr(P X P H), tr(P H))` per `(bin, basis, frame)`; the first is
    /// clamped at zero against rounding
    fn trace_terms(&self, precision: &Precision) -> (Array3<f64>, Array3<f64>) {
        let (n_bins, n_basis) = self.factors.basis.dim();
        let n_frames = self.factors.activation.ncols();
        let h = &self.factors.spatial;

        let mut num = Array3::<f64>::zeros((n_bins, n_basis, n_frames));
        let mut den = Array3::<f64>::zeros((n_bins, n_basis, n_frames));
        for i in 0..n_bins {
            for k in 0..n_basis {
                let hk = h.slice(s![i, k, .., ..]);
                for j in 0..n_frames {
                    let sandwich = precision.sandwich.slice(s![i, j, .., ..]);
                    let inv = precision.inv.slice(s![i, j, .., ..]);
                    num[[i, k, j]] = trace_product(&sandwich, &hk).re.max(0.0);
                    den[[i, k, j]] = trace_product(&inv, &hk).re;
                }
            }
        }
        (num, den)
    }

    /// Multiplicative update of the basis
    pub fn update_basis(&mut self, target: &Array4<Complex64>) -> NmfResult<()> {
        let precision = self.precision(target)?;
        let (num, den) = self.trace_terms(&precision);
        let eps = self.eps;
        let activation = &self.factors.activation;

        for ((i, k), t) in self.factors.basis.indexed_iter_mut() {
            let (mut n_sum, mut d_sum) = (0.0, 0.0);
            for (j, &v) in activation.row(k).iter().enumerate() {
                n_sum += v * num[[i, k, j]];
                d_sum += v * den[[i, k, j]];
            }
            *t *= (n_sum / d_sum.max(eps)).sqrt();
        }
        tracing::trace!("multichannel basis updated");
        Ok(())
    }

    /// Multiplicative update of the activations
    pub fn update_activation(&mut self, target: &Array4<Complex64>) -> NmfResult<()> {
        let precision = self.precision(target)?;
        let (num, den) = self.trace_terms(&precision);
        let eps = self.eps;
        let basis = &self.factors.basis;

        for ((k, j), v) in self.factors.activation.indexed_iter_mut() {
            let (mut n_sum, mut d_sum) = (0.0, 0.0);
            for (i, &t) in basis.column(k).iter().enumerate() {
                n_sum += t * num[[i, k, j]];
                d_sum += t * den[[i, k, j]];
            }
            *v *= (n_sum / d_sum.max(eps)).sqrt();
        }
        tracing::trace!("multichannel activation updated");
        Ok(())
    }

    /// Riccati update of the spatial covariances
    pub fn update_spatial(&mut self, target: &Array4<Complex64>) -> NmfResult<()> {
        let precision = self.precision(target)?;
        let (n_bins, n_basis) = self.factors.basis.dim();
        let n = self.factors.n_channels();
        let activation = &self.factors.activation;

        let mut a = Array4::<Complex64>::zeros((n_bins, n_basis, n, n));
        let mut b = Array4::<Complex64>::zeros((n_bins, n_basis, n, n));
        for i in 0..n_bins {
            for k in 0..n_basis {
                let mut a_ik = a.slice_mut(s![i, k, .., ..]);
                let mut weighted = Array2::<Complex64>::zeros((n, n));
                for (j, &v) in activation.row(k).iter().enumerate() {
                    a_ik.scaled_add(Complex64::new(v, 0.0), &precision.inv.slice(s![i, j, .., ..]));
                    weighted.scaled_add(
                        Complex64::new(v, 0.0),
                        &precision.sandwich.slice(s![i, j, .., ..]),
                    );
                }
                let h = self.factors.spatial.slice(s![i, k, .., ..]);
                b.slice_mut(s![i, k, .., ..])
                    .assign(&h.dot(&weighted).dot(&h));
            }
        }

        let mut spatial = solve_riccati_batch(&a.view(), &b.view(), self.eps)?;
        for (i, mut block) in spatial.outer_iter_mut().enumerate() {
            for (k, mut h) in block.outer_iter_mut().enumerate() {
                add_scaled_identity(&mut h, self.eps);
                if self.normalize {
                    // The basis absorbs the trace so X̂ is unchanged
                    let tr = trace(&h.view()).re;
                    h.mapv_inplace(|z| z / tr);
                    self.factors.basis[[i, k]] *= tr;
                }
            }
        }
        self.factors.spatial = spatial;
        tracing::trace!("multichannel spatial covariance updated");
        Ok(())
    }

    /// Multichannel IS divergence between the model and `target`, summed
    pub fn divergence(&self, target: &Array4<Complex64>) -> NmfResult<f64> {
        self.check_target(target)?;
        let x_hat = covariance_model(
            &self.factors.spatial,
            &self.factors.basis,
            &self.factors.activation,
        );
        Ok(multichannel_is(&x_hat.view(), &target.view(), self.eps)?.sum())
    }
}

impl Factorization for MultichannelState {
    type Target = Array4<Complex64>;

    fn update_once(&mut self, target: &Array4<Complex64>) -> NmfResult<()> {
        self.update_basis(target)?;
        self.update_activation(target)?;
        self.update_spatial(target)
    }

    fn objective(&self, target: &Array4<Complex64>) -> NmfResult<f64> {
        self.divergence(target)
    }
}

/// Multichannel IS-NMF engine
#[derive(Debug, Clone)]
pub struct MultichannelNmf {
    config: MultichannelNmfConfig,
    state: Option<MultichannelState>,
    loss: Vec<f64>,
}

impl MultichannelNmf {
    /// # Errors
    ///
    /// `InvalidConfiguration` if the configuration does not validate.
    pub fn new(config: MultichannelNmfConfig) -> NmfResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: None,
            loss: Vec::new(),
        })
    }

    pub fn config(&self) -> &MultichannelNmfConfig {
        &self.config
    }

    /// Loss per iteration of the most recent run
    pub fn loss(&self) -> &[f64] {
        &self.loss
    }

    pub fn factors(&self) -> Option<&SpatialFactors> {
        self.state.as_ref().map(MultichannelState::factors)
    }

    /// Current model covariances `X̂`, if a run has happened
    pub fn reconstruct(&self) -> Option<Array4<Complex64>> {
        self.factors().map(SpatialFactors::reconstruct)
    }

    /// Run `iterations` steps, starting from `prior` when given
    ///
    /// The loss trace is reset on every call. Feeding the factors returned by
    /// one call back in as `prior` continues the same trajectory.
    ///
    /// # Errors
    ///
    /// `InvalidShape` for a non-square or empty target or mismatched `prior`,
    /// `PreconditionViolation` for non-finite target entries,
    /// `NumericalInstability` if a conditioned inverse fails or the loss
    /// stops being finite.
    pub fn run(
        &mut self,
        target: &Array4<Complex64>,
        iterations: usize,
        prior: Option<SpatialFactors>,
    ) -> NmfResult<SpatialFactors> {
        let warm = prior.is_some();
        let mut state = MultichannelState::initialize(target, &self.config, prior)?;

        tracing::info!(
            bins = target.len_of(Axis(0)),
            frames = target.len_of(Axis(1)),
            channels = target.len_of(Axis(2)),
            n_basis = self.config.n_basis,
            normalize = self.config.normalize,
            warm,
            iterations,
            "starting multichannel nmf"
        );

        self.loss.clear();
        let outcome = iterate(&mut state, target, iterations, &mut self.loss);
        let factors = state.factors().clone();
        self.state = Some(state);
        outcome?;

        tracing::info!(final_loss = self.loss.last().copied(), "finished multichannel nmf");
        Ok(factors)
    }
}
