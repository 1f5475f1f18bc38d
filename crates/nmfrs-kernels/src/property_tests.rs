//! Property-based tests for the divergence and Riccati kernels

#[cfg(test)]
mod tests {
    use crate::divergence::{cauchy, euclidean, generalized_kl, itakura_saito, student_t};
    use crate::hermitian::min_eigenvalue;
    use crate::riccati::solve_riccati;
    use proptest::prelude::*;
    use scirs2_core::ndarray_ext::Array2;
    use scirs2_core::numeric::Complex64;

    const EPS: f64 = 1e-12;

    fn proptest_config() -> ProptestConfig {
        ProptestConfig {
            cases: 32,
            ..ProptestConfig::default()
        }
    }

    fn matrix(rows: usize, cols: usize, values: &[f64]) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(i, j)| values[(i * cols + j) % values.len()])
    }

    fn psd_from(values: &[f64], shift: f64) -> Array2<Complex64> {
        let m = Array2::from_shape_fn((2, 2), |(i, j)| {
            let k = 2 * (i * 2 + j);
            Complex64::new(values[k % values.len()], values[(k + 1) % values.len()])
        });
        let mut out = m.dot(&m.t().mapv(|z| z.conj()));
        for i in 0..2 {
            out[[i, i]] += Complex64::new(shift, 0.0);
        }
        out
    }

    // Property: every divergence is finite and non-negative on non-negative data
    proptest! {
        #![proptest_config(proptest_config())]
        #[test]
        fn divergences_are_nonnegative(
            rows in 1usize..5,
            cols in 1usize..5,
            xs in prop::collection::vec(0.0f64..10.0, 16),
            zs in prop::collection::vec(0.0f64..10.0, 16),
            nu in 0.5f64..100.0,
        ) {
            let x = matrix(rows, cols, &xs);
            let z = matrix(rows, cols, &zs);

            for d in [
                euclidean(&x.view(), &z.view()).unwrap(),
                generalized_kl(&x.view(), &z.view(), EPS).unwrap(),
                itakura_saito(&x.view(), &z.view(), EPS).unwrap(),
                cauchy(&x.view(), &z.view(), EPS).unwrap(),
                student_t(&x.view(), &z.view(), nu, EPS).unwrap(),
            ] {
                for &val in d.iter() {
                    prop_assert!(val.is_finite() && val >= 0.0, "got {}", val);
                }
            }
        }
    }

    // Property: the Riccati solution is PSD and solves H·A·H = B
    proptest! {
        #![proptest_config(proptest_config())]
        #[test]
        fn riccati_solution_is_psd(
            av in prop::collection::vec(-1.0f64..1.0, 8),
            bv in prop::collection::vec(-1.0f64..1.0, 8),
        ) {
            let a = psd_from(&av, 0.5);
            let b = psd_from(&bv, 0.1);
            let h = solve_riccati(&a.view(), &b.view(), EPS).unwrap();

            prop_assert!(min_eigenvalue(&h.view()).unwrap() > -1e-9);

            let hah = h.dot(&a).dot(&h);
            let err = hah
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y).norm())
                .fold(0.0, f64::max);
            prop_assert!(err < 1e-7, "residual {}", err);
        }
    }
}
