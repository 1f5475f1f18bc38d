//! Factorization results
//!
//! Plain owned tensors returned by the engines, with the reconstruction
//! helpers that turn them back into spectrogram-shaped data.

use crate::error::{NmfError, NmfResult};
use scirs2_core::ndarray_ext::{s, Array2, Array3, Array4, Axis, Zip};
use scirs2_core::numeric::Complex64;

fn check_component(k: usize, n_basis: usize) -> NmfResult<()> {
    if k >= n_basis {
        return Err(NmfError::InvalidShape(format!(
            "component {} out of range for {} bases",
            k, n_basis
        )));
    }
    Ok(())
}

/// Basis and activation of a real-valued factorization
#[derive(Debug, Clone, PartialEq)]
pub struct NmfFactors {
    /// Basis matrix T, shape (bins, n_basis)
    pub basis: Array2<f64>,

    /// Activation matrix V, shape (n_basis, frames)
    pub activation: Array2<f64>,
}

impl NmfFactors {
    pub fn n_basis(&self) -> usize {
        self.basis.ncols()
    }

    /// Model reconstruction `(T·V)^(2/domain)`
    pub fn reconstruct(&self, domain: f64) -> Array2<f64> {
        to_power_domain(self.basis.dot(&self.activation), domain)
    }

    /// Contribution `(T_k·V_k)^(2/domain)` of a single component
    ///
    /// # Errors
    ///
    /// `InvalidShape` if `k` is not a valid component index.
    pub fn component(&self, k: usize, domain: f64) -> NmfResult<Array2<f64>> {
        check_component(k, self.n_basis())?;
        let column = self.basis.slice(s![.., k..k + 1]);
        let row = self.activation.slice(s![k..k + 1, ..]);
        Ok(to_power_domain(column.dot(&row), domain))
    }
}

pub(crate) fn to_power_domain(mut tv: Array2<f64>, domain: f64) -> Array2<f64> {
    let exponent = 2.0 / domain;
    if exponent != 1.0 {
        tv.mapv_inplace(|x| x.max(0.0).powf(exponent));
    }
    tv
}

/// Amplitude, activation and phase of a complex factorization
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexFactors {
    /// Basis matrix T, shape (bins, n_basis)
    pub basis: Array2<f64>,

    /// Activation matrix V, shape (n_basis, frames)
    pub activation: Array2<f64>,

    /// Per-component phase Φ, shape (bins, n_basis, frames)
    pub phase: Array3<f64>,
}

impl ComplexFactors {
    pub fn n_basis(&self) -> usize {
        self.basis.ncols()
    }

    /// Complex spectrogram `T_k·V_k·e^{iΦ_k}` of a single component
    ///
    /// # Errors
    ///
    /// `InvalidShape` if `k` is not a valid component index.
    pub fn component(&self, k: usize) -> NmfResult<Array2<Complex64>> {
        check_component(k, self.n_basis())?;
        let (n_bins, n_frames) = (self.basis.nrows(), self.activation.ncols());
        Ok(Array2::from_shape_fn((n_bins, n_frames), |(i, j)| {
            Complex64::from_polar(
                self.basis[[i, k]] * self.activation[[k, j]],
                self.phase[[i, k, j]],
            )
        }))
    }

    /// Sum of all components
    pub fn reconstruct(&self) -> Array2<Complex64> {
        component_sum(&self.basis, &self.activation, &self.phase)
    }
}

/// `Σ_k T[i,k]·V[k,j]·e^{iΦ[i,k,j]}`
pub(crate) fn component_sum(
    basis: &Array2<f64>,
    activation: &Array2<f64>,
    phase: &Array3<f64>,
) -> Array2<Complex64> {
    let (n_bins, n_basis) = basis.dim();
    let n_frames = activation.ncols();
    Array2::from_shape_fn((n_bins, n_frames), |(i, j)| {
        (0..n_basis)
            .map(|k| Complex64::from_polar(basis[[i, k]] * activation[[k, j]], phase[[i, k, j]]))
            .sum()
    })
}

/// Basis, activation and spatial covariance of a multichannel factorization
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialFactors {
    /// Basis matrix T, shape (bins, n_basis)
    pub basis: Array2<f64>,

    /// Activation matrix V, shape (n_basis, frames)
    pub activation: Array2<f64>,

    /// Spatial covariance H, shape (bins, n_basis, channels, channels)
    pub spatial: Array4<Complex64>,
}

impl SpatialFactors {
    pub fn n_basis(&self) -> usize {
        self.basis.ncols()
    }

    pub fn n_channels(&self) -> usize {
        self.spatial.shape()[3]
    }

    /// Model covariance `X̂[i,j] = Σ_k H[i,k]·T[i,k]·V[k,j]`,
    /// shape (bins, frames, channels, channels)
    pub fn reconstruct(&self) -> Array4<Complex64> {
        covariance_model(&self.spatial, &self.basis, &self.activation)
    }
}

pub(crate) fn covariance_model(
    spatial: &Array4<Complex64>,
    basis: &Array2<f64>,
    activation: &Array2<f64>,
) -> Array4<Complex64> {
    let (n_bins, n_basis) = basis.dim();
    let n_frames = activation.ncols();
    let n = spatial.shape()[3];

    let mut out = Array4::<Complex64>::zeros((n_bins, n_frames, n, n));
    for (i, mut bin) in out.axis_iter_mut(Axis(0)).enumerate() {
        for k in 0..n_basis {
            let h = spatial.slice(s![i, k, .., ..]);
            for (j, mut cell) in bin.axis_iter_mut(Axis(0)).enumerate() {
                let weight = basis[[i, k]] * activation[[k, j]];
                Zip::from(&mut cell)
                    .and(&h)
                    .for_each(|c, &hv| *c += hv * weight);
            }
        }
    }
    out
}
