//! Elementwise divergence functions
//!
//! Each function compares a reconstruction (`input`) against an observation
//! (`target`) and returns the elementwise loss, so callers can sum it, mask it
//! or inspect it per time-frequency cell.
//!
//! | Divergence | d(x, z) |
//! |---|---|
//! | Euclidean | (z - x)² |
//! | Generalized KL | z·ln(z/x) - z + x |
//! | Itakura-Saito | z/x - ln(z/x) - 1 |
//! | Cauchy | ln(z/x) + 3/2·ln((2z² + x²) / 3z²) |
//! | Student-t | ln(x/z) + (2+ν)/2·[ln(1 + 2z/(νx)) - ln(1 + 2/ν)] |
//! | Multichannel IS | tr(X·X̂⁻¹) - ln det(X·X̂⁻¹) - n |
//!
//! All logarithms and ratios see their arguments floored at `eps`. Every
//! divergence vanishes at `x = z`; rounding residue below zero is clamped.

use crate::error::{KernelError, KernelResult};
use crate::hermitian::{add_scaled_identity, check_batch, inverse, logdet, trace_product};
use crate::utils::check_same_shape;
use scirs2_core::ndarray_ext::{s, Array2, ArrayView2, ArrayView4, Zip};
use scirs2_core::numeric::{Complex64, Float};

fn zip_map<T, F>(
    operation: &str,
    input: &ArrayView2<T>,
    target: &ArrayView2<T>,
    f: F,
) -> KernelResult<Array2<T>>
where
    T: Float,
    F: Fn(T, T) -> T,
{
    check_same_shape(operation, input, target)?;
    let mut out = Array2::<T>::zeros(input.raw_dim());
    Zip::from(&mut out)
        .and(input)
        .and(target)
        .for_each(|o, &x, &z| *o = f(x, z));
    Ok(out)
}

#[inline]
fn floor<T: Float>(x: T, eps: T) -> T {
    if x < eps {
        eps
    } else {
        x
    }
}

#[inline]
fn clamp_zero<T: Float>(x: T) -> T {
    if x < T::zero() {
        T::zero()
    } else {
        x
    }
}

/// Squared error `(z - x)²`
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use nmfrs_kernels::divergence::euclidean;
///
/// let x = array![[1.0, 2.0]];
/// let z = array![[1.0, 4.0]];
/// let d = euclidean(&x.view(), &z.view()).unwrap();
/// assert_eq!(d[[0, 1]], 4.0);
/// ```
pub fn euclidean<T: Float>(input: &ArrayView2<T>, target: &ArrayView2<T>) -> KernelResult<Array2<T>> {
    zip_map("euclidean", input, target, |x, z| (z - x) * (z - x))
}

/// Generalized Kullback-Leibler divergence
pub fn generalized_kl<T: Float>(
    input: &ArrayView2<T>,
    target: &ArrayView2<T>,
    eps: T,
) -> KernelResult<Array2<T>> {
    zip_map("generalized_kl", input, target, |x, z| {
        let x = floor(x, eps);
        let z = floor(z, eps);
        clamp_zero(z * (z / x).ln() - z + x)
    })
}

/// Itakura-Saito divergence
pub fn itakura_saito<T: Float>(
    input: &ArrayView2<T>,
    target: &ArrayView2<T>,
    eps: T,
) -> KernelResult<Array2<T>> {
    zip_map("itakura_saito", input, target, |x, z| {
        let r = floor(z, eps) / floor(x, eps);
        clamp_zero(r - r.ln() - T::one())
    })
}

/// Cauchy divergence
pub fn cauchy<T: Float>(
    input: &ArrayView2<T>,
    target: &ArrayView2<T>,
    eps: T,
) -> KernelResult<Array2<T>> {
    let two = T::from(2.0).unwrap_or_else(T::one);
    let three = T::from(3.0).unwrap_or_else(T::one);
    let three_halves = three / two;
    zip_map("cauchy", input, target, |x, z| {
        let x = floor(x, eps);
        let z = floor(z, eps);
        let ratio = (two * z * z + x * x) / (three * z * z);
        clamp_zero((z / x).ln() + three_halves * ratio.ln())
    })
}

/// Student-t divergence with `nu` degrees of freedom
///
/// The negative log-likelihood of the Student-t observation model, shifted by
/// its value at `x = z` so that the divergence is zero there.
pub fn student_t<T: Float>(
    input: &ArrayView2<T>,
    target: &ArrayView2<T>,
    nu: T,
    eps: T,
) -> KernelResult<Array2<T>> {
    let two = T::from(2.0).unwrap_or_else(T::one);
    let weight = (two + nu) / two;
    let offset = (T::one() + two / nu).ln();
    zip_map("student_t", input, target, |x, z| {
        let x = floor(x, eps);
        let z = floor(z, eps);
        clamp_zero((x / z).ln() + weight * ((T::one() + two * z / (nu * x)).ln() - offset))
    })
}

/// Multichannel Itakura-Saito divergence between batches of covariance matrices
///
/// `input` and `target` are `(bins, frames, n, n)` tensors of Hermitian PSD
/// blocks. Both are conditioned with `eps · I` before inversion and
/// log-determinants. Returns the `(bins, frames)` loss map.
pub fn multichannel_is(
    input: &ArrayView4<Complex64>,
    target: &ArrayView4<Complex64>,
    eps: f64,
) -> KernelResult<Array2<f64>> {
    if input.shape() != target.shape() {
        return Err(KernelError::dimension_mismatch(
            "multichannel_is",
            target.shape().to_vec(),
            input.shape().to_vec(),
        ));
    }
    let (n_bins, n_frames, n) = check_batch("multichannel_is", input)?;

    let mut out = Array2::<f64>::zeros((n_bins, n_frames));
    for i in 0..n_bins {
        for j in 0..n_frames {
            let mut x_hat = input.slice(s![i, j, .., ..]).to_owned();
            let mut x = target.slice(s![i, j, .., ..]).to_owned();
            add_scaled_identity(&mut x_hat.view_mut(), eps);
            add_scaled_identity(&mut x.view_mut(), eps);

            let inv = inverse(&x_hat.view())?;
            let tr = trace_product(&x.view(), &inv.view()).re;
            let ld = logdet(&x.view(), eps)? - logdet(&x_hat.view(), eps)?;
            out[[i, j]] = (tr - ld - n as f64).max(0.0);
        }
    }
    Ok(out)
}
