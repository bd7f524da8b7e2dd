//! Read/write session JSON files.
//!
//! Session JSON is the "portable" representation of a finished run:
//! - the parameter estimate (real units + grid indices)
//! - the full trial history
//! - a precomputed estimated-CSF grid for quick plotting
//! - run metadata (date, variant, true parameters for simulations)
//!
//! The schema is defined by `domain::SessionFile`.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;

use crate::domain::{CsfCurveGrid, CsfParams, CsfVariant, SessionFile};
use crate::error::AppError;
use crate::estimator::core::QcsfEstimator;
use crate::grid::axis::axis_value;
use crate::model::csf::log_sensitivity;

/// Number of frequency samples in the exported curve grid.
const CURVE_POINTS: usize = 101;

/// Assemble a `SessionFile` from a finished (or stopped) estimator.
pub fn build_session_file(
    estimator: &QcsfEstimator,
    true_params: Option<CsfParams>,
    variant: CsfVariant,
    date: NaiveDate,
) -> SessionFile {
    let estimate = estimator.get_results();
    let frequencies = estimator.stimulus_space().frequencies();
    let f_min = frequencies[0];
    let f_max = frequencies[frequencies.len() - 1];

    let mut curve_frequencies = Vec::with_capacity(CURVE_POINTS);
    let mut curve_sensitivity = Vec::with_capacity(CURVE_POINTS);
    for i in 0..CURVE_POINTS {
        let f = axis_value(f_min, f_max, CURVE_POINTS, i as f64);
        let s = log_sensitivity(&estimate.params, estimator.shape(), f);
        curve_frequencies.push(f);
        curve_sensitivity.push(10f64.powf(s));
    }

    SessionFile {
        tool: "qcsf".to_string(),
        date,
        variant,
        trials: estimator.response_history().len(),
        estimate,
        true_params,
        history: estimator.response_history().to_vec(),
        curve: CsfCurveGrid {
            frequencies: curve_frequencies,
            sensitivity: curve_sensitivity,
        },
    }
}

/// Write a session JSON file.
pub fn write_session_json(path: &Path, session: &SessionFile) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::io(format!(
            "Failed to create session JSON '{}': {e}",
            path.display()
        ))
    })?;

    serde_json::to_writer_pretty(file, session)
        .map_err(|e| AppError::io(format!("Failed to write session JSON: {e}")))?;

    Ok(())
}

/// Read a session JSON file.
pub fn read_session_json(path: &Path) -> Result<SessionFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::io(format!(
            "Failed to open session JSON '{}': {e}",
            path.display()
        ))
    })?;
    let session: SessionFile = serde_json::from_reader(file)
        .map_err(|e| AppError::io(format!("Invalid session JSON: {e}")))?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AxisSpec, ParamGridConfig, StimulusConfig};
    use crate::grid::params::ParameterSpace;
    use crate::grid::stimulus::StimulusSpace;
    use crate::model::psychometric::PsychometricConfig;

    fn tiny_estimator() -> QcsfEstimator {
        let stimulus = StimulusConfig {
            contrast: AxisSpec {
                min: 0.01,
                max: 1.0,
                steps: 4,
            },
            frequency: AxisSpec {
                min: 0.2,
                max: 36.0,
                steps: 4,
            },
        };
        let mut params = ParamGridConfig::default();
        params.peak_sensitivity.steps = 4;
        params.peak_frequency.steps = 3;
        params.bandwidth.steps = 2;
        params.delta.steps = 2;
        QcsfEstimator::new(
            StimulusSpace::new(&stimulus).unwrap(),
            ParameterSpace::new(&params).unwrap(),
            CsfVariant::Fovea,
            PsychometricConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn session_file_round_trips_through_json() {
        let mut est = tiny_estimator();
        est.next().unwrap();
        est.mark_response(true).unwrap();
        est.next().unwrap();
        est.mark_response(false).unwrap();

        let session = build_session_file(
            &est,
            None,
            CsfVariant::Fovea,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        );
        assert_eq!(session.trials, 2);
        assert_eq!(session.curve.frequencies.len(), CURVE_POINTS);

        let dir = std::env::temp_dir().join("qcsf-session-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("session.json");
        write_session_json(&path, &session).unwrap();
        let loaded = read_session_json(&path).unwrap();

        assert_eq!(loaded.trials, session.trials);
        assert_eq!(loaded.history, session.history);
        assert_eq!(loaded.estimate.indices, session.estimate.indices);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn curve_grid_spans_the_stimulus_frequencies() {
        let est = tiny_estimator();
        let session = build_session_file(
            &est,
            None,
            CsfVariant::Fovea,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        );
        let first = *session.curve.frequencies.first().unwrap();
        let last = *session.curve.frequencies.last().unwrap();
        assert!((first - 0.2).abs() < 1e-9);
        assert!((last - 36.0).abs() < 1e-9);
        assert!(session.curve.sensitivity.iter().all(|s| *s >= 1.0));
    }
}
