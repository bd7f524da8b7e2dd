//! The four-dimensional parameter grid and its index <-> unit mapping.
//!
//! The estimator never reasons about real units internally: every candidate
//! observer is a point on this grid, addressed by a single flattened index
//! computed from per-dimension indices via fixed row-major strides. Real units
//! only appear at the boundary (CSF evaluation, reporting), through
//! `map_params`.

use crate::domain::{AxisSpec, CsfParams, ParamGridConfig};
use crate::error::AppError;
use crate::grid::axis::{axis_value, log_space, nearest_index};

/// Number of CSF shape dimensions.
pub const PARAM_DIMS: usize = 4;

/// Dimension labels, in stride order (peak sensitivity slowest).
pub const PARAM_NAMES: [&str; PARAM_DIMS] =
    ["peak sensitivity", "peak frequency", "bandwidth", "delta"];

#[derive(Debug, Clone)]
struct ParamAxis {
    spec: AxisSpec,
    values: Vec<f64>,
}

/// Immutable parameter grid: four geometric axes and their cross product.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    axes: [ParamAxis; PARAM_DIMS],
    strides: [usize; PARAM_DIMS],
    combo_count: usize,
}

impl ParameterSpace {
    pub fn new(config: &ParamGridConfig) -> Result<Self, AppError> {
        let build = |spec: AxisSpec| -> Result<ParamAxis, AppError> {
            Ok(ParamAxis {
                spec,
                values: log_space(spec.min, spec.max, spec.steps)?,
            })
        };
        let axes = [
            build(config.peak_sensitivity)?,
            build(config.peak_frequency)?,
            build(config.bandwidth)?,
            build(config.delta)?,
        ];

        // Row-major strides: the last dimension (delta) varies fastest.
        let mut strides = [1usize; PARAM_DIMS];
        for d in (0..PARAM_DIMS - 1).rev() {
            strides[d] = strides[d + 1] * axes[d + 1].values.len();
        }
        let combo_count = strides[0] * axes[0].values.len();

        Ok(Self {
            axes,
            strides,
            combo_count,
        })
    }

    /// Number of parameter combinations (product of the four resolutions).
    pub fn combo_count(&self) -> usize {
        self.combo_count
    }

    pub fn resolution(&self, dim: usize) -> usize {
        self.axes[dim].values.len()
    }

    /// Grid values of one dimension, in real units.
    pub fn values(&self, dim: usize) -> &[f64] {
        &self.axes[dim].values
    }

    /// Flattened index from per-dimension indices.
    pub fn flatten(&self, indices: [usize; PARAM_DIMS]) -> usize {
        let mut flat = 0;
        for d in 0..PARAM_DIMS {
            flat += indices[d] * self.strides[d];
        }
        flat
    }

    /// Per-dimension indices from a flattened index.
    pub fn unflatten(&self, flat: usize) -> [usize; PARAM_DIMS] {
        let mut out = [0usize; PARAM_DIMS];
        let mut rem = flat;
        for d in 0..PARAM_DIMS {
            out[d] = rem / self.strides[d];
            rem %= self.strides[d];
        }
        out
    }

    /// Real-unit parameters of one grid combination.
    pub fn combo_params(&self, flat: usize) -> CsfParams {
        let idx = self.unflatten(flat);
        CsfParams::from_array([
            self.axes[0].values[idx[0]],
            self.axes[1].values[idx[1]],
            self.axes[2].values[idx[2]],
            self.axes[3].values[idx[3]],
        ])
    }

    /// Batch conversion between index space and real units.
    ///
    /// Forward (`inverse = false`): each coordinate is a (possibly fractional)
    /// position on its dimension's geometric axis; the result is the real
    /// value at that position. Inverse (`inverse = true`): each coordinate is
    /// a real value; the result is the nearest integral grid position. The
    /// round trip over integral index vectors is exact.
    pub fn map_params(
        &self,
        vectors: &[[f64; PARAM_DIMS]],
        inverse: bool,
    ) -> Vec<[f64; PARAM_DIMS]> {
        vectors
            .iter()
            .map(|v| {
                let mut out = [0.0; PARAM_DIMS];
                for d in 0..PARAM_DIMS {
                    let spec = self.axes[d].spec;
                    out[d] = if inverse {
                        nearest_index(spec.min, spec.max, spec.steps, v[d]) as f64
                    } else {
                        axis_value(spec.min, spec.max, spec.steps, v[d])
                    };
                }
                out
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParamGridConfig;

    fn tiny_space() -> ParameterSpace {
        let mut cfg = ParamGridConfig::default();
        cfg.peak_sensitivity.steps = 5;
        cfg.peak_frequency.steps = 4;
        cfg.bandwidth.steps = 3;
        cfg.delta.steps = 2;
        ParameterSpace::new(&cfg).unwrap()
    }

    #[test]
    fn flatten_and_unflatten_agree() {
        let space = tiny_space();
        assert_eq!(space.combo_count(), 5 * 4 * 3 * 2);
        let mut flat = 0;
        for s in 0..5 {
            for f in 0..4 {
                for b in 0..3 {
                    for d in 0..2 {
                        assert_eq!(space.flatten([s, f, b, d]), flat);
                        assert_eq!(space.unflatten(flat), [s, f, b, d]);
                        flat += 1;
                    }
                }
            }
        }
    }

    #[test]
    fn map_params_round_trip_is_exact_for_integral_indices() {
        let space = ParameterSpace::new(&ParamGridConfig::default()).unwrap();
        let mut vectors = Vec::new();
        for s in [0usize, 7, 27] {
            for f in [0usize, 11, 20] {
                for b in [0usize, 12, 20] {
                    for d in [0usize, 11, 20] {
                        vectors.push([s as f64, f as f64, b as f64, d as f64]);
                    }
                }
            }
        }
        let mapped = space.map_params(&vectors, false);
        let back = space.map_params(&mapped, true);
        assert_eq!(back, vectors);
    }

    #[test]
    fn combo_params_matches_axis_values() {
        let space = tiny_space();
        let p = space.combo_params(space.flatten([2, 1, 0, 1]));
        assert_eq!(p.peak_sensitivity, space.values(0)[2]);
        assert_eq!(p.peak_frequency, space.values(1)[1]);
        assert_eq!(p.bandwidth, space.values(2)[0]);
        assert_eq!(p.delta, space.values(3)[1]);
    }

    #[test]
    fn forward_map_interpolates_fractional_indices_geometrically() {
        let space = tiny_space();
        let v = space.map_params(&[[0.5, 0.0, 0.0, 0.0]], false)[0];
        let lo = space.values(0)[0];
        let hi = space.values(0)[1];
        assert!((v[0] - (lo * hi).sqrt()).abs() < 1e-12);
    }
}
