//! Small-matrix Riccati solver
//!
//! Solves `H · A · H = B` for a positive semidefinite `H`, given positive
//! semidefinite `A` and `B`. This is the spatial covariance update of
//! multichannel IS-NMF, applied independently to every (bin, basis) cell.
//!
//! With `A = U Λ Uᴴ`, `A^{1/2} = U Λ^{1/2} Uᴴ` and `A^{-1/2} = U Λ^{-1/2} Uᴴ`,
//! the solution is
//!
//! ```text
//! H = A^{-1/2} · (A^{1/2} · B · A^{1/2})^{1/2} · A^{-1/2}
//! ```
//!
//! Eigenvalues of `A` are clamped below at `eps`; eigenvalues of the inner
//! product are clamped below at zero.

use crate::error::{KernelError, KernelResult};
use crate::hermitian::{check_batch, hermitian_part, map_outer, matrix_function};
use scirs2_core::ndarray_ext::{s, Array2, Array3, Array4, ArrayView2, ArrayView4, Axis};
use scirs2_core::numeric::Complex64;

/// Solve `H · A · H = B` for a single cell
///
/// # Arguments
///
/// * `a` - PSD matrix, inverted through its clamped square root
/// * `b` - PSD right-hand side
/// * `eps` - Eigenvalue floor for `a`
///
/// # Returns
///
/// The Hermitian PSD solution `H`
///
/// # Examples
///
/// ```
/// use nmfrs_kernels::hermitian::identity;
/// use nmfrs_kernels::riccati::solve_riccati;
///
/// // With A = I the solution is the PSD square root of B
/// let a = identity(2);
/// let b = identity(2).mapv(|z| z * 4.0);
/// let h = solve_riccati(&a.view(), &b.view(), 1e-12).unwrap();
/// assert!((h[[0, 0]].re - 2.0).abs() < 1e-10);
/// ```
pub fn solve_riccati(
    a: &ArrayView2<Complex64>,
    b: &ArrayView2<Complex64>,
    eps: f64,
) -> KernelResult<Array2<Complex64>> {
    if a.shape() != b.shape() {
        return Err(KernelError::dimension_mismatch(
            "solve_riccati",
            a.shape().to_vec(),
            b.shape().to_vec(),
        ));
    }

    let a_sqrt = matrix_function(a, |x| x.max(eps).sqrt())?;
    let a_inv_sqrt = matrix_function(a, |x| 1.0 / x.max(eps).sqrt())?;

    let inner = a_sqrt.dot(&hermitian_part(b)).dot(&a_sqrt);
    let inner_sqrt = matrix_function(&inner.view(), |x| x.max(0.0).sqrt())?;

    let h = a_inv_sqrt.dot(&inner_sqrt).dot(&a_inv_sqrt);
    Ok(hermitian_part(&h.view()))
}

/// Batched [`solve_riccati`] over `(bins, n_basis, n, n)` tensors
///
/// Cells are independent; with the `parallel` feature the bins are solved
/// concurrently.
pub fn solve_riccati_batch(
    a: &ArrayView4<Complex64>,
    b: &ArrayView4<Complex64>,
    eps: f64,
) -> KernelResult<Array4<Complex64>> {
    if a.shape() != b.shape() {
        return Err(KernelError::dimension_mismatch(
            "solve_riccati_batch",
            a.shape().to_vec(),
            b.shape().to_vec(),
        ));
    }
    let (outer, inner, n) = check_batch("solve_riccati_batch", a)?;

    let blocks = map_outer(outer, |i| {
        let mut out = Array3::<Complex64>::zeros((inner, n, n));
        for k in 0..inner {
            let h = solve_riccati(
                &a.slice(s![i, k, .., ..]),
                &b.slice(s![i, k, .., ..]),
                eps,
            )
            .map_err(|e| match e {
                KernelError::NonFinite { operation, .. } => {
                    KernelError::non_finite(operation, format!("bin {}, basis {}", i, k))
                }
                other => other,
            })?;
            out.slice_mut(s![k, .., ..]).assign(&h);
        }
        Ok(out)
    })?;

    let mut out = Array4::<Complex64>::zeros((outer, inner, n, n));
    for (i, block) in blocks.iter().enumerate() {
        out.index_axis_mut(Axis(0), i).assign(block);
    }
    Ok(out)
}
