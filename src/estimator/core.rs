//! The estimator core: posterior ownership, stimulus selection, Bayes update.
//!
//! Given:
//! - a stimulus space (contrast x frequency)
//! - a parameter grid (four CSF shape dimensions)
//! - a CSF coefficient set and psychometric configuration
//!
//! we maintain a dense posterior over the full parameter grid and, on each
//! trial, pick the stimulus whose response is expected to carry the most
//! information about the parameters.
//!
//! Request/response pairing is an explicit two-state machine: `next()` is only
//! valid while awaiting a stimulus request, `mark_response()` only while a
//! response is pending. Out-of-order calls are contract violations and fail
//! with a state error rather than guessing at intent.

use nalgebra::DVector;
use rayon::prelude::*;

use crate::domain::{CsfParams, CsfVariant, ParameterEstimate, ResponseRecord, Stimulus};
use crate::error::AppError;
use crate::estimator::entropy::binary_entropy;
use crate::grid::params::{PARAM_DIMS, ParameterSpace};
use crate::grid::stimulus::StimulusSpace;
use crate::model::csf::{CsfShape, log_sensitivity};
use crate::model::psychometric::{PsychometricConfig, detection_probability};

/// Floor for posterior mass during renormalization.
///
/// A long run of consistent responses can multiply a combination's mass below
/// the smallest normal f64; clamping keeps the posterior strictly positive so
/// renormalization never divides by zero and no combination is ever
/// permanently ruled out.
const POSTERIOR_EPS: f64 = 1e-300;

/// Request/response pairing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingStimulusRequest,
    AwaitingResponse { stimulus_index: usize },
}

/// Adaptive CSF estimator over dense stimulus and parameter grids.
pub struct QcsfEstimator {
    stimulus_space: StimulusSpace,
    param_space: ParameterSpace,
    shape: CsfShape,
    psychometric: PsychometricConfig,
    /// Predicted log10 sensitivity per (frequency index, parameter combination).
    ///
    /// Both grids are immutable, so this is computed once at construction and
    /// shared by every call to `next()` / `mark_response()`.
    log_sens: Vec<DVector<f64>>,
    posterior: DVector<f64>,
    history: Vec<ResponseRecord>,
    phase: Phase,
}

impl QcsfEstimator {
    /// Build an estimator with the coefficient set of a vision-field variant.
    pub fn new(
        stimulus_space: StimulusSpace,
        param_space: ParameterSpace,
        variant: CsfVariant,
        psychometric: PsychometricConfig,
    ) -> Result<Self, AppError> {
        Self::with_shape(
            stimulus_space,
            param_space,
            CsfShape::for_variant(variant),
            psychometric,
        )
    }

    /// Build an estimator with explicit CSF coefficients.
    pub fn with_shape(
        stimulus_space: StimulusSpace,
        param_space: ParameterSpace,
        shape: CsfShape,
        psychometric: PsychometricConfig,
    ) -> Result<Self, AppError> {
        psychometric.validate()?;

        let combos = param_space.combo_count();
        let mapped: Vec<CsfParams> = (0..combos).map(|i| param_space.combo_params(i)).collect();

        let log_sens: Vec<DVector<f64>> = stimulus_space
            .frequencies()
            .iter()
            .map(|&f| {
                DVector::from_iterator(
                    combos,
                    mapped.iter().map(|p| log_sensitivity(p, &shape, f)),
                )
            })
            .collect();

        let posterior = DVector::from_element(combos, 1.0 / combos as f64);

        Ok(Self {
            stimulus_space,
            param_space,
            shape,
            psychometric,
            log_sens,
            posterior,
            history: Vec::new(),
            phase: Phase::AwaitingStimulusRequest,
        })
    }

    /// Select the stimulus with the highest expected information gain.
    ///
    /// Every candidate stimulus is scored against the full parameter grid
    /// under the current posterior; ties break to the lowest flattened
    /// stimulus index, so selection is deterministic and reproducible.
    pub fn next(&mut self) -> Result<Stimulus, AppError> {
        if !matches!(self.phase, Phase::AwaitingStimulusRequest) {
            return Err(AppError::state(
                "next() called while a response is pending; call mark_response() first.",
            ));
        }

        let (stimulus_index, _gain) = (0..self.stimulus_space.combo_count())
            .into_par_iter()
            .map(|idx| (idx, self.expected_information_gain(idx)))
            .reduce(
                || (usize::MAX, f64::NEG_INFINITY),
                |best, cand| {
                    if cand.1 > best.1 || (cand.1 == best.1 && cand.0 < best.0) {
                        cand
                    } else {
                        best
                    }
                },
            );

        self.phase = Phase::AwaitingResponse { stimulus_index };
        Ok(self.stimulus_space.stimulus(stimulus_index))
    }

    /// Ingest the response to the pending stimulus and update the posterior.
    ///
    /// Each combination's mass is multiplied by the likelihood of the observed
    /// response under that combination, floored at a small epsilon, then the
    /// posterior is renormalized to sum to 1.
    pub fn mark_response(&mut self, detected: bool) -> Result<(), AppError> {
        let Phase::AwaitingResponse { stimulus_index } = self.phase else {
            return Err(AppError::state(
                "mark_response() called with no pending stimulus; call next() first.",
            ));
        };

        let p = self.detection_probabilities(stimulus_index);
        for (mass, pi) in self.posterior.iter_mut().zip(p.iter()) {
            let likelihood = if detected { *pi } else { 1.0 - *pi };
            *mass = (*mass * likelihood).max(POSTERIOR_EPS);
        }
        let total: f64 = self.posterior.iter().sum();
        self.posterior /= total;

        self.history.push(ResponseRecord {
            stimulus: self.stimulus_space.stimulus(stimulus_index),
            detected,
        });
        self.phase = Phase::AwaitingStimulusRequest;
        Ok(())
    }

    /// Posterior-mean parameter estimate, in grid indices and real units.
    ///
    /// Valid in either state; has no side effects.
    pub fn get_results(&self) -> ParameterEstimate {
        let mut indices = [0.0f64; PARAM_DIMS];
        for (combo, mass) in self.posterior.iter().enumerate() {
            let idx = self.param_space.unflatten(combo);
            for d in 0..PARAM_DIMS {
                indices[d] += mass * idx[d] as f64;
            }
        }
        let mapped = self.param_space.map_params(&[indices], false)[0];
        ParameterEstimate {
            params: CsfParams::from_array(mapped),
            indices,
        }
    }

    /// Expected mutual information (bits) between the response to one
    /// candidate stimulus and the parameters, under the current posterior.
    fn expected_information_gain(&self, stimulus_index: usize) -> f64 {
        let p = self.detection_probabilities(stimulus_index);
        let mut p_bar = 0.0;
        let mut h_bar = 0.0;
        for (mass, pi) in self.posterior.iter().zip(p.iter()) {
            p_bar += mass * pi;
            h_bar += mass * binary_entropy(*pi);
        }
        binary_entropy(p_bar) - h_bar
    }

    /// Detection probability of one stimulus for every parameter combination.
    fn detection_probabilities(&self, stimulus_index: usize) -> DVector<f64> {
        let contrast =
            self.stimulus_space.contrasts()[self.stimulus_space.contrast_index(stimulus_index)];
        let sens = &self.log_sens[self.stimulus_space.frequency_index(stimulus_index)];
        sens.map(|s| detection_probability(s, contrast, &self.psychometric))
    }

    /// Expected information gain of every stimulus (flattened order).
    ///
    /// Read-only; used by the debug bundle to render the gain map.
    pub fn gain_map(&self) -> Vec<f64> {
        (0..self.stimulus_space.combo_count())
            .into_par_iter()
            .map(|idx| self.expected_information_gain(idx))
            .collect()
    }

    /// Restore the uniform prior, clear the history, and return to the
    /// initial state. Grids and coefficients are unchanged.
    pub fn reset(&mut self) {
        let combos = self.param_space.combo_count();
        self.posterior.fill(1.0 / combos as f64);
        self.history.clear();
        self.phase = Phase::AwaitingStimulusRequest;
    }

    pub fn param_combo_count(&self) -> usize {
        self.param_space.combo_count()
    }

    pub fn stim_combo_count(&self) -> usize {
        self.stimulus_space.combo_count()
    }

    /// The raw posterior, for external plotting only.
    pub fn posterior(&self) -> &[f64] {
        self.posterior.as_slice()
    }

    /// Ordered, immutable view of the trial history.
    pub fn response_history(&self) -> &[ResponseRecord] {
        &self.history
    }

    pub fn stimulus_space(&self) -> &StimulusSpace {
        &self.stimulus_space
    }

    pub fn param_space(&self) -> &ParameterSpace {
        &self.param_space
    }

    pub fn shape(&self) -> &CsfShape {
        &self.shape
    }

    pub fn psychometric(&self) -> &PsychometricConfig {
        &self.psychometric
    }
}
