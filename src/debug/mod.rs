//! Debug bundle writer for inspecting the posterior and the gain map.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;

use crate::domain::RunConfig;
use crate::error::AppError;
use crate::estimator::core::QcsfEstimator;
use crate::grid::params::{PARAM_DIMS, PARAM_NAMES};

/// Width of the text histogram bars.
const BAR_WIDTH: usize = 40;

/// Number of top-gain stimuli listed in the bundle.
const TOP_STIMULI: usize = 10;

pub fn write_debug_bundle(
    estimator: &QcsfEstimator,
    config: &RunConfig,
) -> Result<PathBuf, AppError> {
    let dir = PathBuf::from("debug");
    create_dir_all(&dir).map_err(|e| AppError::io(format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("qcsf_debug_seed{}_{}.md", config.seed, ts));

    let mut file =
        File::create(&path).map_err(|e| AppError::io(format!("Failed to create debug file: {e}")))?;

    let mut emit = |line: String| -> Result<(), AppError> {
        writeln!(file, "{line}").map_err(|e| AppError::io(format!("Failed to write debug file: {e}")))
    };

    emit("# qcsf debug bundle".to_string())?;
    emit(format!("- generated: {}", Local::now().to_rfc3339()))?;
    emit(format!("- variant: {}", config.variant.display_name()))?;
    emit(format!(
        "- response_mode: {}",
        config.response_mode.display_name()
    ))?;
    emit(format!("- seed: {}", config.seed))?;
    emit(format!(
        "- trials: {} of {}",
        estimator.response_history().len(),
        config.trials
    ))?;
    emit(format!(
        "- grid: {} parameter combos x {} stimuli",
        estimator.param_combo_count(),
        estimator.stim_combo_count()
    ))?;

    let estimate = estimator.get_results();
    emit(String::new())?;
    emit("## Estimate".to_string())?;
    let values = estimate.params.to_array();
    for d in 0..PARAM_DIMS {
        emit(format!(
            "- {}: {:.4} (index {:.3})",
            PARAM_NAMES[d], values[d], estimate.indices[d]
        ))?;
    }

    emit(String::new())?;
    emit("## Posterior marginals".to_string())?;
    let marginals = posterior_marginals(estimator);
    for d in 0..PARAM_DIMS {
        emit(String::new())?;
        emit(format!("### {}", PARAM_NAMES[d]))?;
        let peak = marginals[d].iter().cloned().fold(f64::MIN, f64::max);
        for (i, &mass) in marginals[d].iter().enumerate() {
            let bar_len = if peak > 0.0 {
                ((mass / peak) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            emit(format!(
                "{i:>3} {:>8.5} {}",
                mass,
                "#".repeat(bar_len)
            ))?;
        }
    }

    emit(String::new())?;
    emit("## Top expected-information-gain stimuli".to_string())?;
    let gains = estimator.gain_map();
    let mut order: Vec<usize> = (0..gains.len()).collect();
    order.sort_by(|&a, &b| {
        gains[b]
            .partial_cmp(&gains[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    emit("| rank | frequency (cpd) | contrast | gain (bits) |".to_string())?;
    emit("|---|---|---|---|".to_string())?;
    for (rank, &idx) in order.iter().take(TOP_STIMULI).enumerate() {
        let s = estimator.stimulus_space().stimulus(idx);
        emit(format!(
            "| {} | {:.3} | {:.4} | {:.5} |",
            rank + 1,
            s.frequency,
            s.contrast,
            gains[idx]
        ))?;
    }

    Ok(path)
}

/// Marginal posterior mass per dimension (summed over the other three).
fn posterior_marginals(estimator: &QcsfEstimator) -> [Vec<f64>; PARAM_DIMS] {
    let space = estimator.param_space();
    let mut marginals: [Vec<f64>; PARAM_DIMS] =
        std::array::from_fn(|d| vec![0.0; space.resolution(d)]);

    for (combo, &mass) in estimator.posterior().iter().enumerate() {
        let idx = space.unflatten(combo);
        for d in 0..PARAM_DIMS {
            marginals[d][idx[d]] += mass;
        }
    }
    marginals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AxisSpec, CsfVariant, ParamGridConfig, StimulusConfig};
    use crate::grid::params::ParameterSpace;
    use crate::grid::stimulus::StimulusSpace;
    use crate::model::psychometric::PsychometricConfig;

    #[test]
    fn marginals_sum_to_one_per_dimension() {
        let stimulus = StimulusConfig {
            contrast: AxisSpec {
                min: 0.01,
                max: 1.0,
                steps: 3,
            },
            frequency: AxisSpec {
                min: 0.2,
                max: 36.0,
                steps: 3,
            },
        };
        let mut params = ParamGridConfig::default();
        params.peak_sensitivity.steps = 4;
        params.peak_frequency.steps = 3;
        params.bandwidth.steps = 3;
        params.delta.steps = 2;
        let mut est = QcsfEstimator::new(
            StimulusSpace::new(&stimulus).unwrap(),
            ParameterSpace::new(&params).unwrap(),
            CsfVariant::Fovea,
            PsychometricConfig::default(),
        )
        .unwrap();
        est.next().unwrap();
        est.mark_response(true).unwrap();

        let marginals = posterior_marginals(&est);
        for d in 0..PARAM_DIMS {
            let sum: f64 = marginals[d].iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "dimension {d} sums to {sum}");
        }
    }
}
