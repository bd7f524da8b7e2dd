//! The discretized stimulus space.
//!
//! Contrast and frequency axes are built once and never resized; a stimulus
//! combination is addressed either by its (contrast, frequency) index pair or
//! by a single flattened index (contrast-major). The flattened order is what
//! makes tie-breaking in the estimator's stimulus search reproducible.

use crate::domain::{Stimulus, StimulusConfig};
use crate::error::AppError;
use crate::grid::axis::log_space;

/// Immutable contrast x frequency grid.
#[derive(Debug, Clone)]
pub struct StimulusSpace {
    contrasts: Vec<f64>,
    frequencies: Vec<f64>,
}

impl StimulusSpace {
    pub fn new(config: &StimulusConfig) -> Result<Self, AppError> {
        let contrasts = log_space(
            config.contrast.min,
            config.contrast.max,
            config.contrast.steps,
        )?;
        let frequencies = log_space(
            config.frequency.min,
            config.frequency.max,
            config.frequency.steps,
        )?;
        Ok(Self {
            contrasts,
            frequencies,
        })
    }

    pub fn contrasts(&self) -> &[f64] {
        &self.contrasts
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Number of stimulus combinations (cross product of the two axes).
    pub fn combo_count(&self) -> usize {
        self.contrasts.len() * self.frequencies.len()
    }

    /// Contrast-axis index of a flattened stimulus index.
    pub fn contrast_index(&self, index: usize) -> usize {
        index / self.frequencies.len()
    }

    /// Frequency-axis index of a flattened stimulus index.
    pub fn frequency_index(&self, index: usize) -> usize {
        index % self.frequencies.len()
    }

    /// Flattened index from per-axis indices.
    pub fn flatten(&self, contrast_index: usize, frequency_index: usize) -> usize {
        contrast_index * self.frequencies.len() + frequency_index
    }

    /// Stimulus at a flattened index.
    ///
    /// # Panics
    /// Panics if `index >= combo_count()`. Callers iterate `0..combo_count()`.
    pub fn stimulus(&self, index: usize) -> Stimulus {
        Stimulus {
            contrast: self.contrasts[self.contrast_index(index)],
            frequency: self.frequencies[self.frequency_index(index)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_space() -> StimulusSpace {
        StimulusSpace::new(&StimulusConfig {
            contrast: crate::domain::AxisSpec {
                min: 0.01,
                max: 1.0,
                steps: 3,
            },
            frequency: crate::domain::AxisSpec {
                min: 0.2,
                max: 36.0,
                steps: 4,
            },
        })
        .unwrap()
    }

    #[test]
    fn flattened_addressing_agrees_with_pairs() {
        let space = small_space();
        assert_eq!(space.combo_count(), 12);
        for c in 0..3 {
            for f in 0..4 {
                let idx = space.flatten(c, f);
                assert_eq!(space.contrast_index(idx), c);
                assert_eq!(space.frequency_index(idx), f);
                let s = space.stimulus(idx);
                assert_eq!(s.contrast, space.contrasts()[c]);
                assert_eq!(s.frequency, space.frequencies()[f]);
            }
        }
    }

    #[test]
    fn axes_are_geometric_and_inclusive() {
        let space = small_space();
        assert!((space.contrasts()[0] - 0.01).abs() < 1e-12);
        assert!((space.contrasts()[2] - 1.0).abs() < 1e-12);
        // Geometric: the middle point is the geometric mean of the endpoints.
        assert!((space.contrasts()[1] - 0.1).abs() < 1e-12);
    }
}
