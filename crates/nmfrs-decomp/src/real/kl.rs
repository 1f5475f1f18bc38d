//! Generalized Kullback-Leibler update
//!
//! ```text
//! factor = [ project(Z / P) / project(P^((2-d)/d)) ]^(d/2)
//! ```

use super::{ratio_pow, UpdateContext};
use scirs2_core::ndarray_ext::Array2;

pub(super) fn mm(ctx: &UpdateContext<'_>) -> Array2<f64> {
    let d = ctx.domain;
    let tv = ctx.product();

    let num = ctx.project(&(ctx.target / &tv));
    let den = ctx.project_floored(&tv.mapv(|x| x.powf((2.0 - d) / d)));

    ratio_pow(&num, &den, d / 2.0)
}

#[cfg(test)]
mod tests {
    use super::super::Side;
    use super::*;
    use scirs2_core::ndarray_ext::array;

    #[test]
    fn test_power_domain_matches_classic_rule() {
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
        let factor = mm(&ctx);

        // Vₖⱼ ← Vₖⱼ · Σᵢ Tᵢₖ Zᵢⱼ/Pᵢⱼ / Σᵢ Tᵢₖ
        let p = basis.dot(&activation);
        for k in 0..2 {
            for j in 0..2 {
                let num: f64 = (0..2).map(|i| basis[[i, k]] * target[[i, j]] / p[[i, j]]).sum();
                let den: f64 = (0..2).map(|i| basis[[i, k]]).sum();
                assert!((factor[[k, j]] - num / den).abs() < 1e-12);
            }
        }
    }
}
