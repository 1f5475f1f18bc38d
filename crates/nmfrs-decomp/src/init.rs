//! Random initialization of factor matrices
//!
//! Randomness uses `scirs2_core::random`. A configured seed makes every run
//! reproducible; without one a seed is drawn from the thread RNG.

use scirs2_core::ndarray_ext::{Array2, Array3};
use scirs2_core::random::{rngs::StdRng, thread_rng, Rng, SeedableRng};

pub(crate) fn rng_from_seed(seed: Option<u64>) -> StdRng {
    let seed = seed.unwrap_or_else(|| thread_rng().random::<u64>());
    StdRng::seed_from_u64(seed)
}

/// Matrix with independent entries uniform in [0, 1)
pub(crate) fn uniform_matrix(rng: &mut StdRng, shape: (usize, usize)) -> Array2<f64> {
    Array2::from_shape_fn(shape, |_| rng.random::<f64>())
}

/// Tensor with independent entries uniform in [0, scale)
pub(crate) fn uniform_tensor(rng: &mut StdRng, shape: (usize, usize, usize), scale: f64) -> Array3<f64> {
    Array3::from_shape_fn(shape, |_| scale * rng.random::<f64>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_draws_repeat() {
        let a = uniform_matrix(&mut rng_from_seed(Some(7)), (3, 4));
        let b = uniform_matrix(&mut rng_from_seed(Some(7)), (3, 4));
        assert_eq!(a, b);
        assert!(a.iter().all(|&x| (0.0..1.0).contains(&x)));
    }

    #[test]
    fn test_tensor_scale() {
        let t = uniform_tensor(&mut rng_from_seed(Some(1)), (2, 3, 4), 10.0);
        assert_eq!(t.shape(), &[2, 3, 4]);
        assert!(t.iter().all(|&x| (0.0..10.0).contains(&x)));
    }
}
