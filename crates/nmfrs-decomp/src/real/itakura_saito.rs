//! Itakura-Saito updates
//!
//! MM, valid for any domain:
//!
//! ```text
//! factor = [ project(Z / P^((d+2)/d)) / project(1/P) ]^(d/(d+2))
//! ```
//!
//! ME uses the same ratio with exponent 1 and is only defined at `d = 2`.

use super::{ratio_pow, UpdateContext};
use scirs2_core::ndarray_ext::Array2;

fn ratio(ctx: &UpdateContext<'_>, exponent: f64) -> Array2<f64> {
    let d = ctx.domain;
    let tv = ctx.product();

    let num = ctx.project(&(ctx.target / &tv.mapv(|x| x.powf((d + 2.0) / d))));
    let den = ctx.project_floored(&tv.mapv(f64::recip));

    ratio_pow(&num, &den, exponent)
}

pub(super) fn mm(ctx: &UpdateContext<'_>) -> Array2<f64> {
    ratio(ctx, ctx.domain / (ctx.domain + 2.0))
}

pub(super) fn me(ctx: &UpdateContext<'_>) -> Array2<f64> {
    ratio(ctx, 1.0)
}

#[cfg(test)]
mod tests {
    use super::super::Side;
    use super::*;
    use scirs2_core::ndarray_ext::array;

    #[test]
    fn test_me_is_square_of_mm_at_power_domain() {
        let basis = array![[1.0, 0.5], [0.2, 1.0], [0.4, 0.4]];
        let activation = array![[1.0, 2.0], [0.5, 0.3]];
        let target = array![[2.0, 1.0], [1.0, 3.0], [0.5, 0.5]];
        let ctx = UpdateContext {
            side: Side::Basis,
            basis: &basis,
            activation: &activation,
            target: &target,
            domain: 2.0,
            eps: 1e-12,
        };
        let mm = mm(&ctx);
        let me = me(&ctx);
        for (a, b) in mm.iter().zip(me.iter()) {
            assert!((a * a - b).abs() < 1e-10);
        }
    }
}
