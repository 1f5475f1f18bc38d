//! Student-t update
//!
//! The target is blended with the model through the weighted harmonic mean
//!
//! ```text
//! Y = 1 / ( 2/((2+ν)·P) + ν/((2+ν)·Z) )
//! ```
//!
//! and the factor is `sqrt(project(Y / P²) / project(1/P))`. Large `ν`
//! recovers the Itakura-Saito MM update.

use super::{ratio_pow, UpdateContext};
use scirs2_core::ndarray_ext::{Array2, Zip};

pub(super) fn mm(ctx: &UpdateContext<'_>, nu: f64) -> Array2<f64> {
    let eps = ctx.eps;
    let tv = ctx.product();

    let weighted = Zip::from(&tv).and(ctx.target).map_collect(|&p, &z| {
        let z = z.max(eps);
        let harmonic = 1.0 / (2.0 / ((2.0 + nu) * p) + nu / ((2.0 + nu) * z));
        harmonic / (p * p)
    });

    let num = ctx.project(&weighted);
    let den = ctx.project_floored(&tv.mapv(f64::recip));

    ratio_pow(&num, &den, 0.5)
}

#[cfg(test)]
mod tests {
    use super::super::{itakura_saito, Side};
    use super::*;
    use scirs2_core::ndarray_ext::array;

    #[test]
    fn test_large_nu_approaches_itakura_saito() {
        let basis = array![[1.0, 0.5], [0.2, 1.0]];
        let activation = array![[1.0, 2.0], [0.5, 0.3]];
        let target = array![[2.0, 1.0], [1.0, 3.0]];
        let ctx = UpdateContext {
            side: Side::Activation,
            basis: &basis,
            activation: &activation,
            target: &target,
            domain: 2.0,
            eps: 1e-12,
        };
        let t = mm(&ctx, 1e9);
        let is = itakura_saito::mm(&ctx);
        for (a, b) in t.iter().zip(is.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
