//! Benchmarks for the factorization engines
//!
//! Times a fixed number of iterations per engine on synthetic data.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nmfrs_decomp::{
    Algorithm, ComplexNmf, ComplexNmfConfig, MultichannelNmf, MultichannelNmfConfig, RealNmf,
    RealNmfConfig,
};
use scirs2_core::ndarray_ext::{Array2, Array4};
use scirs2_core::numeric::Complex64;
use scirs2_core::random::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;

fn spectrogram(n_bins: usize, n_frames: usize) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(0);
    Array2::from_shape_fn((n_bins, n_frames), |_| 0.01 + rng.random::<f64>())
}

// ============================================================================
// Real-valued NMF
// ============================================================================

fn bench_real_rules(c: &mut Criterion) {
    let mut group = c.benchmark_group("real_nmf_rules");
    let target = spectrogram(257, 200);

    let rules = [
        ("euclidean", RealNmfConfig::euclidean(16)),
        ("kl", RealNmfConfig::kl(16)),
        ("is", RealNmfConfig::itakura_saito(16)),
        ("t", RealNmfConfig::student_t(16)),
        ("cauchy_naive", RealNmfConfig::cauchy(16)),
        ("cauchy_me", RealNmfConfig::cauchy(16).with_algorithm(Algorithm::Me)),
        ("cauchy_mm_fast", RealNmfConfig::cauchy(16).with_algorithm(Algorithm::MmFast)),
    ];

    group.throughput(Throughput::Elements(target.len() as u64));
    for (name, config) in rules {
        group.bench_with_input(BenchmarkId::from_parameter(name), &config, |b, config| {
            b.iter(|| {
                let mut nmf = RealNmf::new(config.with_seed(1)).unwrap();
                black_box(nmf.run(black_box(&target), 10))
            })
        });
    }

    group.finish();
}

fn bench_real_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("real_nmf_sizes");
    group.sample_size(20);

    for &(n_bins, n_frames, n_basis) in &[(129, 100, 8), (513, 400, 32), (1025, 800, 64)] {
        let target = spectrogram(n_bins, n_frames);
        group.throughput(Throughput::Elements((n_bins * n_frames) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}_k{}", n_bins, n_frames, n_basis)),
            &(target, n_basis),
            |b, (target, n_basis)| {
                b.iter(|| {
                    let mut nmf = RealNmf::new(RealNmfConfig::kl(*n_basis).with_seed(1)).unwrap();
                    black_box(nmf.run(black_box(target), 5))
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Complex and multichannel NMF
// ============================================================================

fn bench_complex(c: &mut Criterion) {
    let mut group = c.benchmark_group("complex_nmf");
    let mut rng = StdRng::seed_from_u64(3);
    let target = Array2::from_shape_fn((129, 100), |_| {
        Complex64::from_polar(rng.random::<f64>(), 6.283 * rng.random::<f64>())
    });

    group.bench_function("129x100_k8", |b| {
        b.iter(|| {
            let mut nmf = ComplexNmf::new(ComplexNmfConfig::new(8).with_seed(1)).unwrap();
            black_box(nmf.run(black_box(&target), 5))
        })
    });

    group.finish();
}

fn bench_multichannel(c: &mut Criterion) {
    let mut group = c.benchmark_group("multichannel_nmf");
    group.sample_size(10);

    for &n_channels in &[2usize, 4] {
        let mut rng = StdRng::seed_from_u64(5);
        let target = Array4::from_shape_fn((33, 40, n_channels, n_channels), |(_, _, a, b)| {
            if a == b {
                Complex64::new(1.0 + rng.random::<f64>(), 0.0)
            } else {
                Complex64::new(0.0, 0.0)
            }
        });

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("33x40_c{}", n_channels)),
            &target,
            |b, target| {
                b.iter(|| {
                    let mut nmf =
                        MultichannelNmf::new(MultichannelNmfConfig::new(4).with_seed(1)).unwrap();
                    black_box(nmf.run(black_box(target), 3, None))
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_real_rules,
    bench_real_sizes,
    bench_complex,
    bench_multichannel
);
criterion_main!(benches);
