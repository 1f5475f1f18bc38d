//! Small Hermitian matrix kernels
//!
//! Multichannel factorization works on batches of tiny (channels × channels)
//! Hermitian matrices, one per time-frequency cell or per (bin, basis) pair.
//! Every spectral computation here goes through the real symmetric embedding
//!
//! ```text
//! H = A + iB   ↦   M = [ A  -B ]
//!                      [ B   A ]
//! ```
//!
//! which maps matrix products, inverses and matrix functions of `H` onto the
//! same operations on `M`. Each eigenvalue of `H` appears twice in `M`.
//!
//! # SciRS2 Integration
//!
//! Arrays come from `scirs2_core::ndarray_ext`, complex scalars from
//! `scirs2_core::numeric`, eigendecomposition and inversion from `scirs2_linalg`.

use crate::error::{KernelError, KernelResult};
use scirs2_core::ndarray_ext::{s, Array2, Array3, Array4, ArrayView2, ArrayView4, ArrayViewMut2, Axis};
use scirs2_core::numeric::Complex64;

/// Identity matrix of size `n`
pub fn identity(n: usize) -> Array2<Complex64> {
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            Complex64::new(1.0, 0.0)
        } else {
            Complex64::new(0.0, 0.0)
        }
    })
}

/// Add `eps · I` in place
pub fn add_scaled_identity(h: &mut ArrayViewMut2<Complex64>, eps: f64) {
    let n = h.nrows().min(h.ncols());
    for i in 0..n {
        h[[i, i]].re += eps;
    }
}

/// Conjugate transpose
pub fn conj_transpose(h: &ArrayView2<Complex64>) -> Array2<Complex64> {
    h.t().mapv(|z| z.conj())
}

/// Hermitian part `(H + Hᴴ) / 2`
pub fn hermitian_part(h: &ArrayView2<Complex64>) -> Array2<Complex64> {
    let ht = conj_transpose(h);
    (&h.to_owned() + &ht).mapv(|z| z * 0.5)
}

/// Trace of a square complex matrix
pub fn trace(h: &ArrayView2<Complex64>) -> Complex64 {
    h.diag().iter().fold(Complex64::new(0.0, 0.0), |acc, &z| acc + z)
}

/// `tr(A · B)` without forming the product
///
/// # Examples
///
/// ```
/// use nmfrs_kernels::hermitian::{identity, trace_product};
///
/// let a = identity(3);
/// let b = identity(3);
/// assert!((trace_product(&a.view(), &b.view()).re - 3.0).abs() < 1e-12);
/// ```
pub fn trace_product(a: &ArrayView2<Complex64>, b: &ArrayView2<Complex64>) -> Complex64 {
    let n = a.nrows();
    let m = a.ncols();
    let mut acc = Complex64::new(0.0, 0.0);
    for i in 0..n {
        for k in 0..m {
            acc += a[[i, k]] * b[[k, i]];
        }
    }
    acc
}

/// Real symmetric embedding of a complex matrix
pub fn embed(h: &ArrayView2<Complex64>) -> Array2<f64> {
    let n = h.nrows();
    let mut m = Array2::<f64>::zeros((2 * n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            let z = h[[i, j]];
            m[[i, j]] = z.re;
            m[[i, n + j]] = -z.im;
            m[[n + i, j]] = z.im;
            m[[n + i, n + j]] = z.re;
        }
    }
    m
}

/// Inverse of [`embed`]: reads `Re` from the top-left block and `Im` from the
/// bottom-left block
pub fn unembed(m: &ArrayView2<f64>) -> Array2<Complex64> {
    let n = m.nrows() / 2;
    let re = m.slice(s![..n, ..n]);
    let im = m.slice(s![n.., ..n]);
    Array2::from_shape_fn((n, n), |(i, j)| Complex64::new(re[[i, j]], im[[i, j]]))
}

fn check_square(operation: &str, h: &ArrayView2<Complex64>) -> KernelResult<usize> {
    let (n, m) = h.dim();
    if n != m {
        return Err(KernelError::not_square(operation, h.shape()));
    }
    if n == 0 {
        return Err(KernelError::empty_input(operation, "matrix"));
    }
    Ok(n)
}

/// Eigen-decompose the embedding of the Hermitian part of `h`
fn embedded_eigh(operation: &str, h: &ArrayView2<Complex64>) -> KernelResult<(Vec<f64>, Array2<f64>)> {
    check_square(operation, h)?;
    let m = embed(&hermitian_part(h).view());
    let (w, v) = scirs2_linalg::eigh(&m.view(), None)
        .map_err(|e| KernelError::linalg(operation, e))?;
    if w.iter().any(|x| !x.is_finite()) {
        return Err(KernelError::non_finite(operation, "eigenvalues"));
    }
    Ok((w.to_vec(), v))
}

/// Eigenvalues of a Hermitian matrix, ascending
pub fn eigvalsh(h: &ArrayView2<Complex64>) -> KernelResult<Vec<f64>> {
    let (mut w, _) = embedded_eigh("eigvalsh", h)?;
    w.sort_by(|a, b| a.total_cmp(b));
    // Embedding eigenvalues come in equal pairs
    Ok(w.into_iter().step_by(2).collect())
}

/// Smallest eigenvalue of the Hermitian part of `h`
pub fn min_eigenvalue(h: &ArrayView2<Complex64>) -> KernelResult<f64> {
    let (w, _) = embedded_eigh("min_eigenvalue", h)?;
    Ok(w.into_iter().fold(f64::INFINITY, f64::min))
}

/// `log det H` with eigenvalues clamped below at `floor`
pub fn logdet(h: &ArrayView2<Complex64>, floor: f64) -> KernelResult<f64> {
    let (w, _) = embedded_eigh("logdet", h)?;
    // Each eigenvalue of H is counted twice by the embedding
    Ok(0.5 * w.iter().map(|&x| x.max(floor).ln()).sum::<f64>())
}

/// Apply a scalar function to the spectrum of a Hermitian matrix
///
/// Computes `U · diag(f(λ)) · Uᴴ` for `H = U · diag(λ) · Uᴴ`. Only the
/// Hermitian part of `h` is used.
pub fn matrix_function<F>(h: &ArrayView2<Complex64>, f: F) -> KernelResult<Array2<Complex64>>
where
    F: Fn(f64) -> f64,
{
    let (w, v) = embedded_eigh("matrix_function", h)?;
    let fw = scirs2_core::ndarray_ext::Array1::from_iter(w.iter().map(|&x| f(x)));
    if fw.iter().any(|x| !x.is_finite()) {
        return Err(KernelError::non_finite("matrix_function", "f(λ)"));
    }
    let scaled = &v * &fw;
    let m = scaled.dot(&v.t());
    Ok(unembed(&m.view()))
}

/// Inverse of a complex square matrix
pub fn inverse(h: &ArrayView2<Complex64>) -> KernelResult<Array2<Complex64>> {
    check_square("inverse", h)?;
    let m = embed(h);
    let inv = scirs2_linalg::inv(&m.view(), None).map_err(|e| KernelError::linalg("inverse", e))?;
    if inv.iter().any(|x| !x.is_finite()) {
        return Err(KernelError::non_finite("inverse", "inverted matrix"));
    }
    Ok(unembed(&inv.view()))
}

/// Run `f` over `0..n` and collect, in parallel across the outer axis when the
/// `parallel` feature is enabled
pub(crate) fn map_outer<R, F>(n: usize, f: F) -> KernelResult<Vec<R>>
where
    R: Send,
    F: Fn(usize) -> KernelResult<R> + Send + Sync,
{
    #[cfg(feature = "parallel")]
    {
        use scirs2_core::parallel_ops::*;
        (0..n).into_par_iter().map(f).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..n).map(f).collect()
    }
}

/// Validate a batch of square blocks shaped `(outer, inner, n, n)`
pub fn check_batch(operation: &str, x: &ArrayView4<Complex64>) -> KernelResult<(usize, usize, usize)> {
    let (outer, inner, n, m) = x.dim();
    if n != m {
        return Err(KernelError::not_square(operation, x.shape()));
    }
    if outer == 0 || inner == 0 || n == 0 {
        return Err(KernelError::empty_input(operation, "batch"));
    }
    Ok((outer, inner, n))
}

fn assemble(blocks: Vec<Array3<Complex64>>, inner: usize, n: usize) -> Array4<Complex64> {
    let mut out = Array4::<Complex64>::zeros((blocks.len(), inner, n, n));
    for (i, block) in blocks.iter().enumerate() {
        out.index_axis_mut(Axis(0), i).assign(block);
    }
    out
}

/// Batched `(X + eps·I)⁻¹` over a `(bins, frames, n, n)` tensor
///
/// # Errors
///
/// Fails with a numerical error if any block stays singular after the
/// `eps · I` conditioning term.
pub fn batch_inverse(x: &ArrayView4<Complex64>, eps: f64) -> KernelResult<Array4<Complex64>> {
    let (outer, inner, n) = check_batch("batch_inverse", x)?;

    let blocks = map_outer(outer, |i| {
        let mut out = Array3::<Complex64>::zeros((inner, n, n));
        for j in 0..inner {
            let mut cell = x.slice(s![i, j, .., ..]).to_owned();
            add_scaled_identity(&mut cell.view_mut(), eps);
            let inv = inverse(&cell.view()).map_err(|e| match e {
                KernelError::Linalg { message, .. } => KernelError::linalg(
                    "batch_inverse",
                    format!("bin {}, frame {}: {}", i, j, message),
                ),
                other => other,
            })?;
            out.slice_mut(s![j, .., ..]).assign(&inv);
        }
        Ok(out)
    })?;

    Ok(assemble(blocks, inner, n))
}

/// Batched sandwich product `P · X · P` over matching `(outer, inner, n, n)` tensors
pub fn batch_sandwich(
    p: &ArrayView4<Complex64>,
    x: &ArrayView4<Complex64>,
) -> KernelResult<Array4<Complex64>> {
    if p.shape() != x.shape() {
        return Err(KernelError::dimension_mismatch(
            "batch_sandwich",
            p.shape().to_vec(),
            x.shape().to_vec(),
        ));
    }
    let (outer, inner, n) = check_batch("batch_sandwich", p)?;

    let blocks = map_outer(outer, |i| {
        let mut out = Array3::<Complex64>::zeros((inner, n, n));
        for j in 0..inner {
            let pj = p.slice(s![i, j, .., ..]);
            let xj = x.slice(s![i, j, .., ..]);
            out.slice_mut(s![j, .., ..]).assign(&pj.dot(&xj).dot(&pj));
        }
        Ok(out)
    })?;

    Ok(assemble(blocks, inner, n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn sample_hermitian() -> Array2<Complex64> {
        // Positive definite: eigenvalues 1 and 4
        let mut h = Array2::<Complex64>::zeros((2, 2));
        h[[0, 0]] = c(2.5, 0.0);
        h[[1, 1]] = c(2.5, 0.0);
        h[[0, 1]] = c(0.0, 1.5);
        h[[1, 0]] = c(0.0, -1.5);
        h
    }

    fn max_abs_diff(a: &Array2<Complex64>, b: &Array2<Complex64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).norm())
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_embed_roundtrip() {
        let h = sample_hermitian();
        let back = unembed(&embed(&h.view()).view());
        assert!(max_abs_diff(&h, &back) < 1e-15);
    }

    #[test]
    fn test_eigvalsh_known_spectrum() {
        let w = eigvalsh(&sample_hermitian().view()).unwrap();
        assert_eq!(w.len(), 2);
        assert!((w[0] - 1.0).abs() < 1e-10, "got {:?}", w);
        assert!((w[1] - 4.0).abs() < 1e-10, "got {:?}", w);
    }

    #[test]
    fn test_logdet_matches_product_of_eigenvalues() {
        let ld = logdet(&sample_hermitian().view(), 1e-12).unwrap();
        assert!((ld - 4.0_f64.ln()).abs() < 1e-10);
    }

    #[test]
    fn test_inverse_times_matrix_is_identity() {
        let h = sample_hermitian();
        let inv = inverse(&h.view()).unwrap();
        let prod = h.dot(&inv);
        assert!(max_abs_diff(&prod, &identity(2)) < 1e-10);
    }

    #[test]
    fn test_matrix_sqrt_squares_back() {
        let h = sample_hermitian();
        let root = matrix_function(&h.view(), f64::sqrt).unwrap();
        let square = root.dot(&root);
        assert!(max_abs_diff(&square, &h) < 1e-10);
    }

    #[test]
    fn test_trace_product_matches_dense_product() {
        let a = sample_hermitian();
        let mut b = identity(2);
        b[[0, 1]] = c(0.3, -0.2);
        let dense = trace(&a.dot(&b).view());
        let fast = trace_product(&a.view(), &b.view());
        assert!((dense - fast).norm() < 1e-14);
    }

    #[test]
    fn test_batch_inverse_shapes_and_values() {
        let h = sample_hermitian();
        let mut x = Array4::<Complex64>::zeros((3, 2, 2, 2));
        for i in 0..3 {
            for j in 0..2 {
                x.slice_mut(s![i, j, .., ..]).assign(&h);
            }
        }
        let inv = batch_inverse(&x.view(), 0.0).unwrap();
        assert_eq!(inv.shape(), &[3, 2, 2, 2]);
        let expected = inverse(&h.view()).unwrap();
        let cell = inv.slice(s![2, 1, .., ..]).to_owned();
        assert!(max_abs_diff(&cell, &expected) < 1e-12);
    }

    #[test]
    fn test_batch_inverse_rejects_non_square() {
        let x = Array4::<Complex64>::zeros((1, 1, 2, 3));
        let err = batch_inverse(&x.view(), 1e-12).unwrap_err();
        assert!(matches!(err, KernelError::NotSquare { .. }));
    }

    #[test]
    fn test_zero_block_is_conditioned_by_eps() {
        let x = Array4::<Complex64>::zeros((1, 1, 2, 2));
        let inv = batch_inverse(&x.view(), 1e-3).unwrap();
        assert!((inv[[0, 0, 0, 0]].re - 1e3).abs() < 1e-6);
    }
}
