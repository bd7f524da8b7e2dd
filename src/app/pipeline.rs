//! Shared trial-loop logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! build grids -> build estimator + observer -> (next -> respond -> mark) x N
//!
//! The CLI consumes the session to completion; the TUI steps it one trial at a
//! time so the chart can update live.

use crate::domain::{ParameterEstimate, ResponseRecord, RunConfig, Stimulus};
use crate::error::AppError;
use crate::estimator::core::QcsfEstimator;
use crate::grid::params::ParameterSpace;
use crate::grid::stimulus::StimulusSpace;
use crate::model::psychometric::PsychometricConfig;
use crate::sim::SimulatedObserver;

/// One completed trial, as reported to front-ends.
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    /// 1-based trial number.
    pub trial: usize,
    pub stimulus: Stimulus,
    pub detected: bool,
    /// Estimate after this trial's update.
    pub estimate: ParameterEstimate,
}

/// A simulated testing session: estimator plus simulated observer.
pub struct SimulationSession {
    estimator: QcsfEstimator,
    observer: SimulatedObserver,
    trials: usize,
    completed: usize,
}

impl SimulationSession {
    pub fn new(config: &RunConfig) -> Result<Self, AppError> {
        if config.trials == 0 {
            return Err(AppError::config("Trial count must be > 0."));
        }

        let stimulus_space = StimulusSpace::new(&config.stimulus)?;
        let param_space = ParameterSpace::new(&config.param_grid)?;
        let psychometric = PsychometricConfig::default();

        let observer = SimulatedObserver::from_indices(
            &param_space,
            config.true_indices,
            config.variant,
            psychometric,
            config.response_mode,
            config.seed,
        )?;
        let estimator =
            QcsfEstimator::new(stimulus_space, param_space, config.variant, psychometric)?;

        Ok(Self {
            estimator,
            observer,
            trials: config.trials,
            completed: 0,
        })
    }

    /// Run one trial; returns `None` once the configured count is reached.
    pub fn step(&mut self) -> Result<Option<TrialOutcome>, AppError> {
        if self.completed >= self.trials {
            return Ok(None);
        }

        let stimulus = self.estimator.next()?;
        let detected = self.observer.respond(&stimulus)?;
        self.estimator.mark_response(detected)?;
        self.completed += 1;

        Ok(Some(TrialOutcome {
            trial: self.completed,
            stimulus,
            detected,
            estimate: self.estimator.get_results(),
        }))
    }

    /// Run the remaining trials to completion.
    pub fn run_to_end(&mut self) -> Result<(), AppError> {
        while self.step()?.is_some() {}
        Ok(())
    }

    /// Restart from the uniform prior with a fresh observer seed.
    pub fn restart(&mut self, config: &RunConfig) -> Result<(), AppError> {
        self.estimator.reset();
        self.observer = SimulatedObserver::from_indices(
            self.estimator.param_space(),
            config.true_indices,
            config.variant,
            *self.estimator.psychometric(),
            config.response_mode,
            config.seed,
        )?;
        self.completed = 0;
        Ok(())
    }

    pub fn estimator(&self) -> &QcsfEstimator {
        &self.estimator
    }

    pub fn true_params(&self) -> crate::domain::CsfParams {
        self.observer.true_params()
    }

    pub fn trials(&self) -> usize {
        self.trials
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.trials
    }

    pub fn history(&self) -> &[ResponseRecord] {
        self.estimator.response_history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AxisSpec, ResponseMode, RunConfig};

    fn small_run_config() -> RunConfig {
        let mut config = RunConfig::default();
        config.stimulus.contrast = AxisSpec {
            min: 0.002,
            max: 1.0,
            steps: 12,
        };
        config.stimulus.frequency = AxisSpec {
            min: 0.2,
            max: 36.0,
            steps: 10,
        };
        config.param_grid.peak_sensitivity.steps = 10;
        config.param_grid.peak_frequency.steps = 8;
        config.param_grid.bandwidth.steps = 6;
        config.param_grid.delta.steps = 6;
        config.true_indices = [6, 4, 3, 2];
        config.response_mode = ResponseMode::Perfect;
        config.trials = 30;
        config
    }

    fn index_error(estimate: &ParameterEstimate, truth: [usize; 4]) -> f64 {
        estimate
            .indices
            .iter()
            .zip(truth.iter())
            .map(|(e, &t)| (e - t as f64).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    #[test]
    fn session_runs_the_configured_number_of_trials() {
        let config = small_run_config();
        let mut session = SimulationSession::new(&config).unwrap();
        session.run_to_end().unwrap();
        assert!(session.is_done());
        assert_eq!(session.history().len(), 30);
        assert!(session.step().unwrap().is_none());
    }

    #[test]
    fn perfect_responses_converge_toward_the_true_parameters() {
        let config = small_run_config();
        let mut session = SimulationSession::new(&config).unwrap();

        let initial = index_error(&session.estimator().get_results(), config.true_indices);
        let mut errors = Vec::new();
        while let Some(outcome) = session.step().unwrap() {
            errors.push(index_error(&outcome.estimate, config.true_indices));
        }
        assert_eq!(errors.len(), 30);

        // The estimate must end up close to the truth and, over the final ten
        // trials, never move away from it (a hair of slack absorbs floating
        // wiggle in the posterior mean, well under a grid step).
        let last = *errors.last().unwrap();
        assert!(
            last < initial * 0.7,
            "final error {last} vs initial {initial}"
        );
        for w in errors[20..].windows(2) {
            assert!(
                w[1] <= w[0] + 0.05,
                "error increased late in the run: {} -> {}",
                w[0],
                w[1]
            );
        }
    }

    #[test]
    fn restart_resets_history_and_prior() {
        let config = small_run_config();
        let mut session = SimulationSession::new(&config).unwrap();
        for _ in 0..5 {
            session.step().unwrap();
        }
        assert_eq!(session.completed(), 5);

        session.restart(&config).unwrap();
        assert_eq!(session.completed(), 0);
        assert!(session.history().is_empty());
        let sum: f64 = session.estimator().posterior().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_trials_is_a_config_error() {
        let mut config = small_run_config();
        config.trials = 0;
        assert!(SimulationSession::new(&config).is_err());
    }
}
