//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during a testing session
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which contrast-sensitivity-function shape to assume.
///
/// The two variants share one formula and differ only in a coefficient set
/// (selected once, at estimator construction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CsfVariant {
    /// Central (foveal) vision.
    Fovea,
    /// Peripheral vision: steeper high-frequency falloff, shallower
    /// low-frequency truncation.
    Periphery,
}

impl CsfVariant {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            CsfVariant::Fovea => "fovea",
            CsfVariant::Periphery => "periphery",
        }
    }
}

/// How simulated responses are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Deterministic: detected iff true sensitivity exceeds the sensitivity
    /// required by the tested contrast.
    Perfect,
    /// Bernoulli draw against the psychometric detection probability.
    Probabilistic,
}

impl ResponseMode {
    pub fn display_name(self) -> &'static str {
        match self {
            ResponseMode::Perfect => "perfect",
            ResponseMode::Probabilistic => "probabilistic",
        }
    }
}

/// A single presentable stimulus: a (contrast, frequency) pair drawn from the
/// stimulus space.
///
/// `contrast` is a Michelson contrast in (0, 1]; `frequency` is spatial
/// frequency in cycles per degree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stimulus {
    pub contrast: f64,
    pub frequency: f64,
}

impl Stimulus {
    /// Sensitivity an observer needs to detect this stimulus (1 / contrast).
    pub fn required_sensitivity(&self) -> f64 {
        1.0 / self.contrast
    }
}

/// One trial's outcome: the stimulus shown and whether it was detected.
///
/// Records are appended to the response history in trial order and never
/// modified or removed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub stimulus: Stimulus,
    pub detected: bool,
}

/// CSF shape parameters in real units.
///
/// - `peak_sensitivity`: 1/contrast at the curve's maximum
/// - `peak_frequency`: cycles per degree at the maximum
/// - `bandwidth`: full width at half maximum, in octaves
/// - `delta`: low-frequency truncation depth, in decades of sensitivity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CsfParams {
    pub peak_sensitivity: f64,
    pub peak_frequency: f64,
    pub bandwidth: f64,
    pub delta: f64,
}

impl CsfParams {
    pub fn from_array(v: [f64; 4]) -> Self {
        Self {
            peak_sensitivity: v[0],
            peak_frequency: v[1],
            bandwidth: v[2],
            delta: v[3],
        }
    }

    pub fn to_array(self) -> [f64; 4] {
        [
            self.peak_sensitivity,
            self.peak_frequency,
            self.bandwidth,
            self.delta,
        ]
    }
}

/// Posterior-derived parameter estimate.
///
/// `indices` holds the posterior-weighted mean position on the parameter grid
/// (fractional, index space); `params` is that position mapped to real units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterEstimate {
    pub params: CsfParams,
    pub indices: [f64; 4],
}

/// Geometric axis specification: `steps` values log-spaced over `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub min: f64,
    pub max: f64,
    pub steps: usize,
}

/// Stimulus space configuration (contrast x frequency).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StimulusConfig {
    pub contrast: AxisSpec,
    pub frequency: AxisSpec,
}

impl Default for StimulusConfig {
    fn default() -> Self {
        Self {
            contrast: AxisSpec {
                min: 0.01,
                max: 1.0,
                steps: 24,
            },
            frequency: AxisSpec {
                min: 0.2,
                max: 36.0,
                steps: 20,
            },
        }
    }
}

/// Parameter grid configuration: one geometric axis per CSF shape dimension.
///
/// The defaults follow the grid used in the published quick-CSF procedure:
/// sensitivity 2..2000 (1/contrast), peak frequency 0.2..20 cpd, bandwidth
/// 1..9 octaves, truncation 0.02..2 decades.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamGridConfig {
    pub peak_sensitivity: AxisSpec,
    pub peak_frequency: AxisSpec,
    pub bandwidth: AxisSpec,
    pub delta: AxisSpec,
}

impl Default for ParamGridConfig {
    fn default() -> Self {
        Self {
            peak_sensitivity: AxisSpec {
                min: 2.0,
                max: 2000.0,
                steps: 28,
            },
            peak_frequency: AxisSpec {
                min: 0.2,
                max: 20.0,
                steps: 21,
            },
            bandwidth: AxisSpec {
                min: 1.0,
                max: 9.0,
                steps: 21,
            },
            delta: AxisSpec {
                min: 0.02,
                max: 2.0,
                steps: 21,
            },
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub trials: usize,
    pub stimulus: StimulusConfig,
    pub param_grid: ParamGridConfig,
    pub variant: CsfVariant,
    pub response_mode: ResponseMode,
    /// True observer position on the parameter grid (simulation only).
    pub true_indices: [usize; 4],
    /// Seed for the simulated observer's RNG.
    pub seed: u64,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_session: Option<PathBuf>,
    pub export_history: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            trials: 30,
            stimulus: StimulusConfig::default(),
            param_grid: ParamGridConfig::default(),
            variant: CsfVariant::Fovea,
            response_mode: ResponseMode::Probabilistic,
            true_indices: [18, 11, 12, 11],
            seed: 42,
            plot: true,
            plot_width: 100,
            plot_height: 25,
            export_session: None,
            export_history: None,
        }
    }
}

/// A saved session file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    pub tool: String,
    pub date: NaiveDate,
    pub variant: CsfVariant,
    pub trials: usize,
    pub estimate: ParameterEstimate,
    /// Present only for simulated sessions.
    pub true_params: Option<CsfParams>,
    pub history: Vec<ResponseRecord>,
    pub curve: CsfCurveGrid,
}

/// A precomputed estimated-CSF grid for quick plotting.
///
/// `sensitivity` is linear (1/contrast), one value per frequency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsfCurveGrid {
    pub frequencies: Vec<f64>,
    pub sensitivity: Vec<f64>,
}
