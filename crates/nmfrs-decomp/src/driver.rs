//! Generic fixed-iteration driver
//!
//! All engines share one outer loop: update the model in place, evaluate the
//! objective, append it to the loss trace. The engines differ only in their
//! [`Factorization`] implementation. There is no convergence test; callers
//! choose the iteration count and inspect the trace afterwards.

use crate::error::{NmfError, NmfResult};

/// A model that can be refined one step at a time against a fixed target
pub trait Factorization {
    type Target: ?Sized;

    /// Perform one full update step (every factor once)
    fn update_once(&mut self, target: &Self::Target) -> NmfResult<()>;

    /// Total divergence between the current reconstruction and the target
    fn objective(&self, target: &Self::Target) -> NmfResult<f64>;
}

/// Run `iterations` update steps, appending one loss per completed step
///
/// # Errors
///
/// Propagates update failures, and aborts with `NumericalInstability` as soon
/// as a logged loss is not finite.
pub fn iterate<F>(
    model: &mut F,
    target: &F::Target,
    iterations: usize,
    trace: &mut Vec<f64>,
) -> NmfResult<()>
where
    F: Factorization + ?Sized,
{
    trace.reserve(iterations);

    for iteration in 0..iterations {
        model.update_once(target)?;

        let loss = model.objective(target)?;
        if !loss.is_finite() {
            return Err(NmfError::NumericalInstability(format!(
                "loss became {} at iteration {}",
                loss,
                iteration + 1
            )));
        }

        tracing::debug!(iteration = iteration + 1, loss, "nmf iteration");
        trace.push(loss);
    }

    Ok(())
}
