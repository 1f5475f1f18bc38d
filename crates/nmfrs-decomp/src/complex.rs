//! Complex NMF
//!
//! Models a complex spectrogram `Y` as a sum of components
//! `X_k[i,j] = T[i,k]·V[k,j]·e^{iΦ[i,k,j]}` with non-negative amplitudes and
//! free per-component phases. The squared-magnitude error is minimized
//! through the auxiliary variables
//!
//! ```text
//! Z̄_k = X_k + β_k · (Y - Σ_k X_k)
//! ```
//!
//! where `β_k` is the share of component `k` in the current amplitude sum.
//! One step recomputes `Z̄`, takes the new phase from `arg Z̄`, solves for
//! `T` and then `V` in closed form (with an L_p sparsity penalty on `V`),
//! rescales the basis columns to unit sum and refreshes `β`.

use crate::config::{ComplexNmfConfig, PhaseInit};
use crate::driver::{iterate, Factorization};
use crate::error::{NmfError, NmfResult};
use crate::factors::{component_sum, ComplexFactors};
use crate::init::{rng_from_seed, uniform_matrix, uniform_tensor};
use scirs2_core::ndarray_ext::{Array2, Array3, Axis};
use scirs2_core::numeric::Complex64;
use std::f64::consts::PI;

struct ComplexState {
    basis: Array2<f64>,
    activation: Array2<f64>,
    phase: Array3<f64>,
    beta: Array3<f64>,
    regularizer: f64,
    p: f64,
    eps: f64,
}

impl ComplexState {
    fn new(basis: Array2<f64>, activation: Array2<f64>, phase: Array3<f64>, config: &ComplexNmfConfig) -> Self {
        let mut state = Self {
            beta: Array3::zeros(phase.raw_dim()),
            basis,
            activation,
            phase,
            regularizer: config.regularizer,
            p: config.p,
            eps: config.eps,
        };
        state.update_beta();
        state
    }

    /// `β[i,k,j] = T[i,k]·V[k,j] / Σ_k T[i,k]·V[k,j]`, floored at `eps`
    fn update_beta(&mut self) {
        let (n_bins, n_basis) = self.basis.dim();
        let n_frames = self.activation.ncols();
        let eps = self.eps;

        for i in 0..n_bins {
            for j in 0..n_frames {
                let total: f64 = (0..n_basis)
                    .map(|k| self.basis[[i, k]] * self.activation[[k, j]])
                    .sum();
                let total = total.max(eps);
                for k in 0..n_basis {
                    let share = self.basis[[i, k]] * self.activation[[k, j]] / total;
                    self.beta[[i, k, j]] = share.max(eps);
                }
            }
        }
    }

    /// Auxiliary variables `Z̄`, shape (bins, n_basis, frames)
    fn auxiliary(&self, target: &Array2<Complex64>) -> Array3<Complex64> {
        let residual = target - &component_sum(&self.basis, &self.activation, &self.phase);
        Array3::from_shape_fn(self.phase.raw_dim(), |(i, k, j)| {
            let x = Complex64::from_polar(self.basis[[i, k]] * self.activation[[k, j]], self.phase[[i, k, j]]);
            x + residual[[i, j]] * self.beta[[i, k, j]]
        })
    }

    fn normalize_basis(&mut self) {
        let eps = self.eps;
        let sums = self.basis.sum_axis(Axis(0));
        for (k, &s) in sums.iter().enumerate() {
            let s = s.max(eps);
            self.basis.column_mut(k).mapv_inplace(|t| t / s);
            self.activation.row_mut(k).mapv_inplace(|v| v * s);
        }
    }

    fn factors(&self) -> ComplexFactors {
        ComplexFactors {
            basis: self.basis.clone(),
            activation: self.activation.clone(),
            phase: self.phase.clone(),
        }
    }
}

impl Factorization for ComplexState {
    type Target = Array2<Complex64>;

    fn update_once(&mut self, target: &Array2<Complex64>) -> NmfResult<()> {
        let eps = self.eps;
        let (n_bins, n_basis) = self.basis.dim();
        let n_frames = self.activation.ncols();

        nmfrs_kernels::floor_inplace(&mut self.beta, eps);
        nmfrs_kernels::floor_inplace(&mut self.activation, eps);

        let z_bar = self.auxiliary(target);
        self.phase = z_bar.mapv(|z| z.arg());
        let magnitude = z_bar.mapv(|z| z.norm());
        let beta = &self.beta;

        for i in 0..n_bins {
            for k in 0..n_basis {
                let (mut num, mut den) = (0.0, 0.0);
                for j in 0..n_frames {
                    let v = self.activation[[k, j]];
                    num += v / beta[[i, k, j]] * magnitude[[i, k, j]];
                    den += v * v / beta[[i, k, j]];
                }
                self.basis[[i, k]] = num / den.max(eps);
            }
        }

        for k in 0..n_basis {
            for j in 0..n_frames {
                let (mut num, mut den) = (0.0, 0.0);
                for i in 0..n_bins {
                    let t = self.basis[[i, k]];
                    num += t / beta[[i, k, j]] * magnitude[[i, k, j]];
                    den += t * t / beta[[i, k, j]];
                }
                let v = self.activation[[k, j]];
                den += self.regularizer * self.p * v.powf(self.p - 2.0);
                self.activation[[k, j]] = num / den.max(eps);
            }
        }

        self.normalize_basis();
        self.update_beta();
        tracing::trace!("complex nmf step applied");
        Ok(())
    }

    fn objective(&self, target: &Array2<Complex64>) -> NmfResult<f64> {
        let model = component_sum(&self.basis, &self.activation, &self.phase);
        Ok(model
            .iter()
            .zip(target.iter())
            .map(|(x, y)| (x - y).norm_sqr())
            .sum())
    }
}

fn validate_complex_target(target: &Array2<Complex64>) -> NmfResult<()> {
    if target.is_empty() {
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
    Ok(())
}

/// Complex NMF engine with an Euclidean criterion and L_p sparsity on the
/// activations
#[derive(Debug, Clone)]
pub struct ComplexNmf {
    config: ComplexNmfConfig,
    factors: Option<ComplexFactors>,
    loss: Vec<f64>,
}

impl ComplexNmf {
    /// # Errors
    ///
    /// `InvalidConfiguration` if the configuration does not validate.
    pub fn new(config: ComplexNmfConfig) -> NmfResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            factors: None,
            loss: Vec::new(),
        })
    }

    pub fn config(&self) -> &ComplexNmfConfig {
        &self.config
    }

    pub fn loss(&self) -> &[f64] {
        &self.loss
    }

    pub fn factors(&self) -> Option<&ComplexFactors> {
        self.factors.as_ref()
    }

    /// Current complex model `Σ_k T_k·V_k·e^{iΦ_k}`, if a run has happened
    pub fn reconstruct(&self) -> Option<Array2<Complex64>> {
        self.factors.as_ref().map(ComplexFactors::reconstruct)
    }

    /// Initialize and run `iterations` steps against `target`
    ///
    /// # Errors
    ///
    /// `InvalidShape` for an empty target, `PreconditionViolation` for
    /// non-finite entries, `NumericalInstability` if the loss stops being
    /// finite.
    pub fn run(&mut self, target: &Array2<Complex64>, iterations: usize) -> NmfResult<ComplexFactors> {
        validate_complex_target(target)?;

        let (n_bins, n_frames) = target.dim();
        let n_basis = self.config.n_basis;
        let mut rng = rng_from_seed(self.config.seed);
        let basis = uniform_matrix(&mut rng, (n_bins, n_basis));
        let activation = uniform_matrix(&mut rng, (n_basis, n_frames));
        let phase = match self.config.phase_init {
            PhaseInit::Target => {
                Array3::from_shape_fn((n_bins, n_basis, n_frames), |(i, _, j)| target[[i, j]].arg())
            }
            PhaseInit::Random => uniform_tensor(&mut rng, (n_bins, n_basis, n_frames), 2.0 * PI),
        };

        self.loss.clear();
        self.factors = None;
        let state = ComplexState::new(basis, activation, phase, &self.config);
        self.drive(state, target, iterations)
    }

    /// Continue from the factors of the previous run
    ///
    /// `β` is rebuilt from the retained amplitudes, so a resumed run follows
    /// the same trajectory as an uninterrupted one.
    ///
    /// # Errors
    ///
    /// `PreconditionViolation` if no run has happened yet or the target shape
    /// differs from the fitted one.
    pub fn resume(&mut self, target: &Array2<Complex64>, iterations: usize) -> NmfResult<ComplexFactors> {
        validate_complex_target(target)?;
        let factors = self.factors.take().ok_or_else(|| {
            NmfError::PreconditionViolation("no factorization to resume; call run first".into())
        })?;
        let fitted = (factors.basis.nrows(), factors.activation.ncols());
        if fitted != target.dim() {
            let err = NmfError::PreconditionViolation(format!(
                "target shape {:?} differs from fitted shape {:?}",
                target.dim(),
                fitted
            ));
            self.factors = Some(factors);
            return Err(err);
        }

        let state = ComplexState::new(factors.basis, factors.activation, factors.phase, &self.config);
        self.drive(state, target, iterations)
    }

    fn drive(&mut self, mut state: ComplexState, target: &Array2<Complex64>, iterations: usize) -> NmfResult<ComplexFactors> {
        tracing::info!(
            bins = target.nrows(),
            frames = target.ncols(),
            n_basis = self.config.n_basis,
            regularizer = self.config.regularizer,
            p = self.config.p,
            iterations,
            "starting complex nmf"
        );

        let outcome = iterate(&mut state, target, iterations, &mut self.loss);
        let factors = state.factors();
        self.factors = Some(factors.clone());
        outcome?;

        tracing::info!(final_loss = self.loss.last().copied(), "finished complex nmf");
        Ok(factors)
    }
}
