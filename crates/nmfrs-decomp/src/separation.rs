//! Turning factorizations back into complex spectrograms
//!
//! Real-valued NMF only models magnitudes. A component is mapped back onto
//! the mixture by keeping the mixture phase and replacing its magnitude with
//! the component's modelled amplitude.

use crate::error::{NmfError, NmfResult};
use crate::factors::NmfFactors;
use scirs2_core::ndarray_ext::{Array2, Zip};
use scirs2_core::numeric::Complex64;

/// Rescale `mixture` by `sqrt(power) / max(|mixture|, eps)`
///
/// # Errors
///
/// `InvalidShape` if the two spectrograms differ in shape.
///
/// # Examples
///
/// ```
/// use scirs2_core::ndarray_ext::array;
/// use scirs2_core::numeric::Complex64;
/// use nmfrs_decomp::apply_amplitude_ratio;
///
/// let mixture = array![[Complex64::new(0.0, 2.0)]];
/// let power = array![[9.0]];
/// let out = apply_amplitude_ratio(&mixture, &power, 1e-12).unwrap();
/// assert!((out[[0, 0]] - Complex64::new(0.0, 3.0)).norm() < 1e-12);
/// ```
pub fn apply_amplitude_ratio(
    mixture: &Array2<Complex64>,
    power: &Array2<f64>,
    eps: f64,
) -> NmfResult<Array2<Complex64>> {
    if mixture.dim() != power.dim() {
        return Err(NmfError::InvalidShape(format!(
            "mixture {:?} and power {:?} differ in shape",
            mixture.dim(),
            power.dim()
        )));
    }
    Ok(Zip::from(mixture)
        .and(power)
        .map_collect(|&y, &p| y * (p.max(0.0).sqrt() / y.norm().max(eps))))
}

/// Complex spectrogram of every component, each carrying the mixture phase
///
/// `domain` is the exponent the factors were fitted with; component `k` is
/// given the power `(T_k·V_k)^(2/domain)`.
pub fn separate(
    factors: &NmfFactors,
    mixture: &Array2<Complex64>,
    domain: f64,
    eps: f64,
) -> NmfResult<Vec<Array2<Complex64>>> {
    (0..factors.n_basis())
        .map(|k| {
            let power = factors.component(k, domain)?;
            apply_amplitude_ratio(mixture, &power, eps)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::ndarray_ext::array;

    #[test]
    fn test_silent_mixture_stays_finite() {
        let mixture = array![[Complex64::new(0.0, 0.0)]];
        let out = apply_amplitude_ratio(&mixture, &array![[4.0]], 1e-12).unwrap();
        assert_eq!(out[[0, 0]], Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_shape_mismatch() {
        let mixture = array![[Complex64::new(1.0, 0.0)]];
        let err = apply_amplitude_ratio(&mixture, &array![[1.0, 2.0]], 1e-12).unwrap_err();
        assert!(matches!(err, NmfError::InvalidShape(_)));
    }

    #[test]
    fn test_separate_keeps_phase_and_partitions_power() {
        let factors = NmfFactors {
            basis: array![[1.0, 0.0], [0.0, 2.0]],
            activation: array![[3.0], [1.0]],
        };
        let mixture = array![[Complex64::from_polar(5.0, 0.7)], [Complex64::from_polar(1.0, -1.2)]];
        let parts = separate(&factors, &mixture, 1.0, 1e-12).unwrap();
        assert_eq!(parts.len(), 2);

        // amplitude domain: component power is (T_k V_k)², amplitude T_k V_k
        assert!((parts[0][[0, 0]].norm() - 3.0).abs() < 1e-12);
        assert!((parts[0][[0, 0]].arg() - 0.7).abs() < 1e-12);
        assert!(parts[0][[1, 0]].norm() < 1e-12);
        assert!((parts[1][[1, 0]].norm() - 2.0).abs() < 1e-12);
        assert!((parts[1][[1, 0]].arg() + 1.2).abs() < 1e-12);
    }
}
