//! Geometric axis generation.
//!
//! Both the stimulus space and the parameter grid are log-spaced: contrast
//! sensitivity spans several orders of magnitude, and equal ratios (not equal
//! differences) are perceptually equivalent steps.

use crate::error::AppError;

/// Value at (possibly fractional) position `pos` on the geometric axis with
/// `steps` points over `[min, max]`.
///
/// `axis_value(min, max, steps, i as f64)` equals the i-th element of
/// `log_space(min, max, steps)` for integral `i`; fractional positions
/// interpolate geometrically (used when mapping posterior-mean indices).
pub fn axis_value(min: f64, max: f64, steps: usize, pos: f64) -> f64 {
    let ln_min = min.ln();
    let step = (max.ln() - ln_min) / (steps as f64 - 1.0);
    (ln_min + step * pos).exp()
}

/// Nearest grid position on the geometric axis for a real value.
///
/// The inverse of `axis_value` for on-grid values; off-grid values snap to the
/// closest point. Results are clamped to `0..steps`.
pub fn nearest_index(min: f64, max: f64, steps: usize, value: f64) -> usize {
    let span = max.ln() - min.ln();
    let pos = (value.ln() - min.ln()) / span * (steps as f64 - 1.0);
    let rounded = pos.round();
    if rounded <= 0.0 {
        0
    } else if rounded >= (steps - 1) as f64 {
        steps - 1
    } else {
        rounded as usize
    }
}

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0 && max > min) {
        return Err(AppError::invalid_range(format!(
            "Invalid axis range: min={min}, max={max} (must be finite, >0, and max>min)."
        )));
    }
    if steps < 2 {
        return Err(AppError::invalid_range("Axis steps must be >= 2."));
    }

    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        out.push(axis_value(min, max, steps, i as f64));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn log_space_includes_endpoints() {
        let v = log_space(0.1, 10.0, 5).unwrap();
        assert!((v[0] - 0.1).abs() < 1e-12);
        assert!((v[v.len() - 1] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn log_space_rejects_bad_ranges() {
        for (min, max, steps) in [
            (0.0, 1.0, 5),
            (-1.0, 1.0, 5),
            (1.0, 1.0, 5),
            (2.0, 1.0, 5),
            (f64::NAN, 1.0, 5),
            (0.1, 10.0, 1),
        ] {
            let err = log_space(min, max, steps).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidRange);
        }
    }

    #[test]
    fn nearest_index_inverts_axis_value() {
        let (min, max, steps) = (0.2, 36.0, 20);
        for i in 0..steps {
            let v = axis_value(min, max, steps, i as f64);
            assert_eq!(nearest_index(min, max, steps, v), i);
        }
    }

    #[test]
    fn nearest_index_clamps_out_of_range() {
        assert_eq!(nearest_index(1.0, 100.0, 10, 0.001), 0);
        assert_eq!(nearest_index(1.0, 100.0, 10, 1e6), 9);
    }
}
