//! Integration tests for nmfrs-decomp
//!
//! End-to-end scenarios through the public engine API.

use nmfrs_decomp::{
    Algorithm, ComplexNmf, ComplexNmfConfig, MultichannelNmf, MultichannelNmfConfig,
    MultichannelState, NmfError, RealNmf, RealNmfConfig, SpatialFactors,
};
use nmfrs_kernels::hermitian::min_eigenvalue;
use scirs2_core::ndarray_ext::{Array2, Array4};
use scirs2_core::numeric::Complex64;
use scirs2_core::random::{rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::PI;

fn random_target(rows: usize, cols: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((rows, cols), |_| 0.1 + rng.random::<f64>())
}

fn wrap(angle: f64) -> f64 {
    let a = angle.rem_euclid(2.0 * PI);
    if a > PI {
        a - 2.0 * PI
    } else {
        a
    }
}

#[test]
fn test_rank_one_column_is_recovered() {
    let target = random_target(4, 1, 2024);

    let mut nmf = RealNmf::new(RealNmfConfig::euclidean(1).with_seed(7)).unwrap();
    let factors = nmf.run(&target, 50).unwrap();

    // A single column is its own best rank-1 non-negative approximation
    let approx = factors.basis.dot(&factors.activation);
    let err = (&approx - &target).mapv(|x| x * x).sum().sqrt();
    let norm = target.mapv(|x| x * x).sum().sqrt();
    assert!(err / norm < 1e-3, "relative error {}", err / norm);
}

#[test]
fn test_rank_one_matrix_is_recovered() {
    let u = random_target(6, 1, 1);
    let v = random_target(1, 5, 2);
    let target = u.dot(&v);

    let mut nmf = RealNmf::new(RealNmfConfig::euclidean(1).with_seed(3)).unwrap();
    let factors = nmf.run(&target, 200).unwrap();

    let approx = factors.reconstruct(2.0);
    let err = (&approx - &target).mapv(|x| x * x).sum().sqrt();
    let norm = target.mapv(|x| x * x).sum().sqrt();
    assert!(err / norm < 1e-3, "relative error {}", err / norm);
}

#[test]
fn test_invalid_domain_rejected_at_construction() {
    let err = RealNmf::new(RealNmfConfig::euclidean(2).with_domain(3.0)).unwrap_err();
    assert!(matches!(err, NmfError::InvalidConfiguration(_)));
}

#[test]
fn test_cauchy_me_requires_power_domain() {
    let config = RealNmfConfig::cauchy(2)
        .with_domain(1.0)
        .with_algorithm(Algorithm::Me);
    let err = RealNmf::new(config).unwrap_err();
    assert!(matches!(err, NmfError::InvalidConfiguration(_)));
}

#[test]
fn test_mm_losses_decrease_over_run() {
    let target = random_target(8, 10, 99);

    for config in [RealNmfConfig::euclidean(3), RealNmfConfig::kl(3)] {
        let mut nmf = RealNmf::new(config.with_seed(123)).unwrap();
        nmf.run(&target, 100).unwrap();

        let loss = nmf.loss();
        assert_eq!(loss.len(), 100);
        assert!(loss[99] < loss[0], "{:?}: {} -> {}", config.divergence, loss[0], loss[99]);

        let increases = loss.windows(2).filter(|w| w[1] > w[0] * (1.0 + 1e-9)).count();
        assert!(increases < 10, "{} increasing steps", increases);
    }
}

#[test]
fn test_resume_requires_prior_run() {
    let mut nmf = RealNmf::new(RealNmfConfig::kl(2)).unwrap();
    let err = nmf.resume(&random_target(3, 3, 0), 5).unwrap_err();
    assert!(matches!(err, NmfError::PreconditionViolation(_)));
}

#[test]
fn test_complex_phase_recovery() {
    // Two rank-1 complex sources on disjoint bins
    let (n_bins, n_frames) = (6, 8);
    let amp_a = [1.0, 2.0, 1.5, 0.0, 0.0, 0.0];
    let amp_b = [0.0, 0.0, 0.0, 0.7, 1.2, 2.2];
    let act_a: Vec<f64> = (0..n_frames).map(|j| 1.0 + (j % 3) as f64).collect();
    let act_b: Vec<f64> = (0..n_frames).map(|j| 0.5 + (j % 2) as f64).collect();
    let phase_a = |i: usize, j: usize| 0.3 * i as f64 + 0.7 * j as f64;
    let phase_b = |i: usize, j: usize| -0.4 * i as f64 + 1.1 * j as f64;

    let target = Array2::from_shape_fn((n_bins, n_frames), |(i, j)| {
        Complex64::from_polar(amp_a[i] * act_a[j], phase_a(i, j))
            + Complex64::from_polar(amp_b[i] * act_b[j], phase_b(i, j))
    });

    let config = ComplexNmfConfig::new(2).with_regularizer(1e-3).with_seed(11);
    let mut nmf = ComplexNmf::new(config).unwrap();
    let factors = nmf.run(&target, 200).unwrap();

    for i in 0..n_bins {
        for j in 0..n_frames {
            let truth = if amp_a[i] > 0.0 { phase_a(i, j) } else { phase_b(i, j) };
            let dominant = (0..2)
                .max_by(|&a, &b| {
                    let pa = factors.basis[[i, a]] * factors.activation[[a, j]];
                    let pb = factors.basis[[i, b]] * factors.activation[[b, j]];
                    pa.total_cmp(&pb)
                })
                .unwrap();
            let diff = wrap(factors.phase[[i, dominant, j]] - truth);
            assert!(diff.abs() < 1e-6, "bin {}, frame {}: phase off by {}", i, j, diff);
        }
    }

    let loss = nmf.loss();
    assert!(loss[loss.len() - 1] <= loss[0]);
}

fn covariance_target(n_bins: usize, n_frames: usize) -> Array4<Complex64> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut target = Array4::<Complex64>::zeros((n_bins, n_frames, 2, 2));
    for i in 0..n_bins {
        for j in 0..n_frames {
            let x = [
                Complex64::new(rng.random::<f64>(), rng.random::<f64>()),
                Complex64::new(rng.random::<f64>(), rng.random::<f64>()),
            ];
            for a in 0..2 {
                for b in 0..2 {
                    target[[i, j, a, b]] = x[a] * x[b].conj();
                }
                target[[i, j, a, a]] += 0.05;
            }
        }
    }
    target
}

#[test]
fn test_multichannel_warm_start_matches_straight_run() {
    let target = covariance_target(4, 6);
    let config = MultichannelNmfConfig::new(3).with_seed(5);

    let mut straight = MultichannelNmf::new(config).unwrap();
    let expected = straight.run(&target, 8, None).unwrap();

    let mut warm = MultichannelNmf::new(config).unwrap();
    let partial: SpatialFactors = warm.run(&target, 5, None).unwrap();
    let resumed = warm.run(&target, 3, Some(partial)).unwrap();

    assert_eq!(expected.basis, resumed.basis);
    assert_eq!(expected.activation, resumed.activation);
    assert_eq!(expected.spatial, resumed.spatial);
}

#[test]
fn test_multichannel_zero_iterations_keep_shapes() {
    let target = covariance_target(3, 4);
    let config = MultichannelNmfConfig::new(2).with_seed(8);
    let mut nmf = MultichannelNmf::new(config).unwrap();

    let first = nmf.run(&target, 4, None).unwrap();
    let again = nmf.run(&target, 0, Some(first.clone())).unwrap();
    assert_eq!(first, again);
    assert!(nmf.loss().is_empty());
}

#[test]
fn test_multichannel_spatial_psd_after_every_update() {
    let target = covariance_target(3, 5);
    let config = MultichannelNmfConfig::new(2).with_seed(21).with_normalize(false);
    let mut state = MultichannelState::initialize(&target, &config, None).unwrap();

    for _ in 0..5 {
        state.update_basis(&target).unwrap();
        state.update_activation(&target).unwrap();
        state.update_spatial(&target).unwrap();
        for block in state.factors().spatial.outer_iter() {
            for h in block.outer_iter() {
                assert!(min_eigenvalue(&h).unwrap() >= -1e-9);
            }
        }
    }
}

#[test]
fn test_multichannel_loss_trace() {
    let target = covariance_target(4, 6);
    let mut nmf = MultichannelNmf::new(MultichannelNmfConfig::new(2).with_seed(2)).unwrap();
    nmf.run(&target, 20, None).unwrap();

    let loss = nmf.loss();
    assert_eq!(loss.len(), 20);
    assert!(loss.iter().all(|l| l.is_finite() && *l >= 0.0));
    assert!(loss[19] <= loss[0]);
}
