//! Cauchy updates
//!
//! All four variants are defined at `d = 2` only, so `P = T·V` is the model
//! itself. With `C = 2Z + P²`:
//!
//! | Variant | factor |
//! |---|---|
//! | naive multiplicative | `project(1/P) / (3·project(P/C))` |
//! | MM | `sqrt(project(1/P) / (3·project(P/C)))` |
//! | ME | `B / (A + sqrt(A² + 2BA))`, `A = ¾·project(P/(P²+Z))`, `B = project(1/P)` |
//! | MM fast | `sqrt(project(Z/(C·P)) / project(P/C))` |

use super::{ratio_pow, CauchyAlgorithm, UpdateContext};
use nmfrs_kernels::floor_inplace;
use scirs2_core::ndarray_ext::{Array2, Zip};

pub(super) fn multiplier(ctx: &UpdateContext<'_>, algorithm: CauchyAlgorithm) -> Array2<f64> {
    match algorithm {
        CauchyAlgorithm::NaiveMultiplicative => gradient_ratio(ctx, 1.0),
        CauchyAlgorithm::Mm => gradient_ratio(ctx, 0.5),
        CauchyAlgorithm::Me => me(ctx),
        CauchyAlgorithm::MmFast => mm_fast(ctx),
    }
}

fn gradient_ratio(ctx: &UpdateContext<'_>, exponent: f64) -> Array2<f64> {
    let eps = ctx.eps;
    let tv = ctx.product();

    let tv_over_c = Zip::from(&tv)
        .and(ctx.target)
        .map_collect(|&p, &z| p / (2.0 * z + p * p).max(eps));

    let num = ctx.project(&tv.mapv(f64::recip));
    let mut den = ctx.project(&tv_over_c);
    den.mapv_inplace(|x| (3.0 * x).max(eps));

    ratio_pow(&num, &den, exponent)
}

fn me(ctx: &UpdateContext<'_>) -> Array2<f64> {
    let eps = ctx.eps;
    let tv = ctx.product();

    let tv_over_sum = Zip::from(&tv)
        .and(ctx.target)
        .map_collect(|&p, &z| p / (p * p + z).max(eps));

    let a = ctx.project(&tv_over_sum).mapv(|x| 0.75 * x);
    let b = ctx.project(&tv.mapv(f64::recip));

    Zip::from(&a)
        .and(&b)
        .map_collect(|&a, &b| b / (a + (a * a + 2.0 * b * a).sqrt()).max(eps))
}

fn mm_fast(ctx: &UpdateContext<'_>) -> Array2<f64> {
    let eps = ctx.eps;
    let tv = ctx.product();

    let mut c = Zip::from(&tv)
        .and(ctx.target)
        .map_collect(|&p, &z| 2.0 * z + p * p);
    let z_over_ctv = Zip::from(&c)
        .and(&tv)
        .and(ctx.target)
        .map_collect(|&c, &p, &z| z / (c * p).max(eps));
    floor_inplace(&mut c, eps);
    let tv_over_c = &tv / &c;

    let num = ctx.project(&z_over_ctv);
    let den = ctx.project_floored(&tv_over_c);

    ratio_pow(&num, &den, 0.5)
}
