//! Truncated log-parabola contrast sensitivity function.
//!
//! In log10 units, sensitivity declines quadratically with log-frequency
//! distance from the peak:
//!
//! ```text
//! S(f) = lg - k * ((log10 f - lf) / (log10 2 + lb))^2
//! ```
//!
//! where `lg = log10(peak sensitivity)`, `lf = log10(peak frequency)` and
//! `lb = log10(bandwidth in octaves)`. Below the peak frequency the decline is
//! capped at `delta` decades under the peak (the low-frequency truncation),
//! producing the characteristic asymmetric shape. Sensitivity is floored at 0
//! (a sensitivity of 1, i.e. full contrast needed).
//!
//! The foveal and peripheral variants share this formula and differ only in
//! the `(k, delta_scale)` coefficient pair.

use crate::domain::{CsfParams, CsfVariant};

const LOG10_2: f64 = std::f64::consts::LOG10_2;

/// Coefficient set for the truncated log-parabola.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CsfShape {
    /// Quadratic falloff coefficient `k`.
    pub falloff: f64,
    /// Scale applied to the truncation depth `delta`.
    pub delta_scale: f64,
}

impl CsfShape {
    /// Coefficients for a vision-field variant.
    ///
    /// Periphery: high spatial frequencies are lost faster (steeper falloff)
    /// and the low-frequency truncation is shallower.
    pub fn for_variant(variant: CsfVariant) -> Self {
        match variant {
            CsfVariant::Fovea => Self {
                falloff: 4.0 * LOG10_2,
                delta_scale: 1.0,
            },
            CsfVariant::Periphery => Self {
                falloff: 6.0 * LOG10_2,
                delta_scale: 0.5,
            },
        }
    }

    /// Explicit coefficients, for studies calibrating their own shape.
    pub fn custom(falloff: f64, delta_scale: f64) -> Self {
        Self {
            falloff,
            delta_scale,
        }
    }
}

/// Predicted log10 sensitivity at `frequency` (cycles per degree) for one
/// parameter combination in real units.
pub fn log_sensitivity(params: &CsfParams, shape: &CsfShape, frequency: f64) -> f64 {
    let lg = params.peak_sensitivity.log10();
    let lf = params.peak_frequency.log10();
    let lb = params.bandwidth.log10();
    let x = frequency.log10();

    let width = LOG10_2 + lb;
    let parabola = lg - shape.falloff * ((x - lf) / width).powi(2);
    let s = parabola.max(0.0);

    if x < lf {
        s.max(lg - shape.delta_scale * params.delta)
    } else {
        s
    }
}

/// `log_sensitivity` over a batch of parameter combinations at one frequency.
pub fn log_sensitivity_batch(params: &[CsfParams], shape: &CsfShape, frequency: f64) -> Vec<f64> {
    params
        .iter()
        .map(|p| log_sensitivity(p, shape, frequency))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typical() -> CsfParams {
        CsfParams {
            peak_sensitivity: 100.0,
            peak_frequency: 4.0,
            bandwidth: 3.0,
            delta: 0.6,
        }
    }

    #[test]
    fn peak_value_is_log_peak_sensitivity() {
        let p = typical();
        let shape = CsfShape::for_variant(CsfVariant::Fovea);
        let s = log_sensitivity(&p, &shape, p.peak_frequency);
        assert!((s - 2.0).abs() < 1e-12);
    }

    #[test]
    fn declines_above_peak_and_truncates_below() {
        let p = typical();
        let shape = CsfShape::for_variant(CsfVariant::Fovea);
        let peak = log_sensitivity(&p, &shape, p.peak_frequency);

        // Above the peak: strictly declining.
        let hi1 = log_sensitivity(&p, &shape, 10.0);
        let hi2 = log_sensitivity(&p, &shape, 20.0);
        assert!(hi1 < peak && hi2 < hi1);

        // Far below the peak: plateau at lg - delta, not the raw parabola.
        let lo = log_sensitivity(&p, &shape, 0.05);
        assert!((lo - (2.0 - p.delta)).abs() < 1e-12);
    }

    #[test]
    fn sensitivity_never_negative() {
        let p = CsfParams {
            peak_sensitivity: 2.0,
            peak_frequency: 1.0,
            bandwidth: 1.0,
            delta: 2.0,
        };
        let shape = CsfShape::for_variant(CsfVariant::Fovea);
        for f in [0.1, 1.0, 10.0, 50.0] {
            assert!(log_sensitivity(&p, &shape, f) >= 0.0);
        }
    }

    #[test]
    fn periphery_falls_off_faster_above_peak() {
        let p = typical();
        let fovea = CsfShape::for_variant(CsfVariant::Fovea);
        let periphery = CsfShape::for_variant(CsfVariant::Periphery);
        let f = 12.0;
        assert!(log_sensitivity(&p, &periphery, f) < log_sensitivity(&p, &fovea, f));
    }
}
