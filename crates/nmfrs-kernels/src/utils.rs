//! Flooring and shape helpers shared by the divergence kernels and the engines
//!
//! Every reciprocal, logarithm and fractional power in the multiplicative
//! updates is taken on a quantity floored at `eps`.

use crate::error::{KernelError, KernelResult};
use scirs2_core::ndarray_ext::{Array, ArrayView2, Dimension};
use scirs2_core::numeric::Float;

/// Raise every entry below `eps` to `eps`, in place
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use nmfrs_kernels::floor_inplace;
///
/// let mut a = array![[0.0, 2.0], [-1.0, 1e-20]];
/// floor_inplace(&mut a, 1e-12);
/// assert_eq!(a[[0, 0]], 1e-12);
/// assert_eq!(a[[0, 1]], 2.0);
/// assert_eq!(a[[1, 0]], 1e-12);
/// ```
pub fn floor_inplace<T, D>(a: &mut Array<T, D>, eps: T)
where
    T: Float,
    D: Dimension,
{
    a.mapv_inplace(|x| if x < eps { eps } else { x });
}

/// Floored copy of `a`
pub fn floored<T, D>(a: &Array<T, D>, eps: T) -> Array<T, D>
where
    T: Float,
    D: Dimension,
{
    a.mapv(|x| if x < eps { eps } else { x })
}

/// Check that two matrices share a shape
pub fn check_same_shape<T>(
    operation: &str,
    a: &ArrayView2<T>,
    b: &ArrayView2<T>,
) -> KernelResult<()> {
    if a.shape() != b.shape() {
        return Err(KernelError::dimension_mismatch(
            operation,
            b.shape().to_vec(),
            a.shape().to_vec(),
        ));
    }
    Ok(())
}

/// True if every entry is finite and non-negative
pub fn is_nonnegative_finite<T, D>(a: &Array<T, D>) -> bool
where
    T: Float,
    D: Dimension,
{
    a.iter().all(|&x| x.is_finite() && x >= T::zero())
}
