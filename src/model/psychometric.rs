//! Weibull-family psychometric function.
//!
//! Converts the gap between predicted and required log-sensitivity into a
//! detection probability:
//!
//! ```text
//! p = guess + (1 - guess - lapse) * (1 - exp(-10^(slope * diff)))
//! ```
//!
//! The probability therefore lies strictly inside `(guess, 1 - lapse)` and
//! passes through `guess + (1 - guess - lapse) * (1 - 1/e)` when the observer's
//! sensitivity exactly matches the stimulus's requirement.
//!
//! Default rates follow the two-interval forced-choice convention of the
//! adaptive-CSF literature (guess 0.5, lapse 0.04, slope 2.0).

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Guess rate, lapse rate and slope of the psychometric function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PsychometricConfig {
    /// Probability of a correct response with no sensitivity at all.
    pub guess_rate: f64,
    /// Probability of a miss regardless of how visible the stimulus is.
    pub lapse_rate: f64,
    /// Steepness of the transition, per decade of sensitivity difference.
    pub slope: f64,
}

impl Default for PsychometricConfig {
    fn default() -> Self {
        Self {
            guess_rate: 0.5,
            lapse_rate: 0.04,
            slope: 2.0,
        }
    }
}

impl PsychometricConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.guess_rate.is_finite() && (0.0..1.0).contains(&self.guess_rate)) {
            return Err(AppError::config(format!(
                "Invalid guess rate {} (must be in [0, 1)).",
                self.guess_rate
            )));
        }
        if !(self.lapse_rate.is_finite() && (0.0..1.0).contains(&self.lapse_rate)) {
            return Err(AppError::config(format!(
                "Invalid lapse rate {} (must be in [0, 1)).",
                self.lapse_rate
            )));
        }
        if self.guess_rate + self.lapse_rate >= 1.0 {
            return Err(AppError::config(
                "Guess rate + lapse rate must be < 1.".to_string(),
            ));
        }
        if !(self.slope.is_finite() && self.slope > 0.0) {
            return Err(AppError::config(format!(
                "Invalid psychometric slope {} (must be > 0).",
                self.slope
            )));
        }
        Ok(())
    }
}

/// Log10 sensitivity required to detect a given contrast (1 / contrast).
pub fn required_log_sensitivity(contrast: f64) -> f64 {
    -contrast.log10()
}

/// Detection probability for a predicted log-sensitivity and tested contrast.
pub fn detection_probability(
    log_sensitivity: f64,
    contrast: f64,
    config: &PsychometricConfig,
) -> f64 {
    let diff = log_sensitivity - required_log_sensitivity(contrast);
    let weibull = 1.0 - (-(10f64.powf(config.slope * diff))).exp();
    config.guess_rate + (1.0 - config.guess_rate - config.lapse_rate) * weibull
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_stays_inside_guess_and_lapse_bounds() {
        let cfg = PsychometricConfig::default();
        // Log-sensitivity diff against contrast 1.0 (required sensitivity 1).
        // At large positive diffs the Weibull term saturates to 1.0 in f64,
        // so the upper bound is tested as <=.
        for diff in [-5.0, -1.0, -0.1, 0.0, 0.1, 1.0, 5.0] {
            let p = detection_probability(diff, 1.0, &cfg);
            assert!(p > cfg.guess_rate && p <= 1.0 - cfg.lapse_rate, "p={p}");
        }
        let p = detection_probability(0.5, 1.0, &cfg);
        assert!(p < 1.0 - cfg.lapse_rate);
    }

    #[test]
    fn probability_is_monotone_in_sensitivity() {
        let cfg = PsychometricConfig::default();
        let mut prev = -1.0;
        for i in 0..=100 {
            let s = -1.0 + i as f64 * 0.04;
            let p = detection_probability(s, 0.1, &cfg);
            assert!(p >= prev);
            if s < 0.7 + required_log_sensitivity(0.1) {
                assert!(p > prev, "not strictly increasing at s={s}");
            }
            prev = p;
        }
    }

    #[test]
    fn threshold_value_at_zero_difference() {
        let cfg = PsychometricConfig::default();
        // Predicted sensitivity exactly matches required sensitivity (contrast 0.01).
        let p = detection_probability(2.0, 0.01, &cfg);
        let expected =
            cfg.guess_rate + (1.0 - cfg.guess_rate - cfg.lapse_rate) * (1.0 - (-1.0f64).exp());
        assert!((p - expected).abs() < 1e-12);
    }

    #[test]
    fn validate_rejects_bad_rates() {
        let bad = [
            PsychometricConfig {
                guess_rate: -0.1,
                ..Default::default()
            },
            PsychometricConfig {
                lapse_rate: 1.0,
                ..Default::default()
            },
            PsychometricConfig {
                guess_rate: 0.6,
                lapse_rate: 0.5,
                ..Default::default()
            },
            PsychometricConfig {
                slope: 0.0,
                ..Default::default()
            },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err());
        }
    }
}
