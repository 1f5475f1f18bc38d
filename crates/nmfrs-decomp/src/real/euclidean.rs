//! Squared-error update
//!
//! With `P = T·V` and `Z` the target, the majorizer of
//! `‖P^(2/d) - Z‖²` gives
//!
//! ```text
//! factor = [ project(Z ⊙ P^((2-d)/d)) / project(P^((4-d)/d)) ]^(d/(4-d))
//! ```
//!
//! which is the Lee-Seung update at `d = 2`.

use super::{ratio_pow, UpdateContext};
use scirs2_core::ndarray_ext::Array2;

pub(super) fn mm(ctx: &UpdateContext<'_>) -> Array2<f64> {
    let d = ctx.domain;
    let tv = ctx.product();

    let num = ctx.project(&(&tv.mapv(|x| x.powf((2.0 - d) / d)) * ctx.target));
    let den = ctx.project_floored(&tv.mapv(|x| x.powf((4.0 - d) / d)));

    ratio_pow(&num, &den, d / (4.0 - d))
}
