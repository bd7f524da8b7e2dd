//! Formatted terminal output: trial history and parameter estimates.

use crate::domain::{CsfParams, ResponseRecord, RunConfig};
use crate::estimator::core::QcsfEstimator;
use crate::grid::params::{PARAM_DIMS, PARAM_NAMES};

/// Units shown next to each parameter dimension, in grid order.
const PARAM_UNITS: [&str; PARAM_DIMS] = ["1/contrast", "cpd", "octaves", "decades"];

/// Format the trial history table.
pub fn format_history(history: &[ResponseRecord]) -> String {
    let mut out = String::new();

    out.push_str("Trial history:\n");
    if history.is_empty() {
        out.push_str("  (no trials)\n");
        return out;
    }

    out.push_str("  trial  frequency(cpd)  contrast   seen\n");
    for (i, record) in history.iter().enumerate() {
        out.push_str(&format!(
            "  {:>5}  {:>14.3}  {:>8.4}   {}\n",
            i + 1,
            record.stimulus.frequency,
            record.stimulus.contrast,
            if record.detected { "yes" } else { "no" }
        ));
    }

    out
}

/// Format the full run summary (settings echo + estimates table).
pub fn format_run_summary(
    config: &RunConfig,
    estimator: &QcsfEstimator,
    true_params: Option<CsfParams>,
) -> String {
    let mut out = String::new();

    out.push_str("=== qcsf — adaptive CSF estimate ===\n");
    out.push_str(&format!("Variant: {}\n", config.variant.display_name()));
    out.push_str(&format!(
        "Trials: {} of {}\n",
        estimator.response_history().len(),
        config.trials
    ));
    out.push_str(&format!(
        "Stimuli: contrast=[{:.4}, {:.4}] x{} | frequency=[{:.2}, {:.2}]cpd x{} ({} combos)\n",
        config.stimulus.contrast.min,
        config.stimulus.contrast.max,
        config.stimulus.contrast.steps,
        config.stimulus.frequency.min,
        config.stimulus.frequency.max,
        config.stimulus.frequency.steps,
        estimator.stim_combo_count(),
    ));
    out.push_str(&format!(
        "Parameter grid: {} combinations\n",
        estimator.param_combo_count()
    ));

    let estimate = estimator.get_results();
    let estimate_values = estimate.params.to_array();
    let actual_values = true_params.map(|p| p.to_array());

    out.push_str("\nEstimates:\n");
    for d in 0..PARAM_DIMS {
        let actual = match actual_values {
            Some(values) => format!("{:>10.3}", values[d]),
            None => format!("{:>10}", "-"),
        };
        out.push_str(&format!(
            "  {:<17} {:>10.3}  actual {actual}  ({}, index {:.2})\n",
            PARAM_NAMES[d], estimate_values[d], PARAM_UNITS[d], estimate.indices[d],
        ));
    }

    out
}
