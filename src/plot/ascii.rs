//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements (log-log axes: log10 frequency vs log10 sensitivity):
//! - estimated CSF curve: `-` line
//! - true CSF curve (simulation only): `~` line
//! - trials: `o` detected, `x` missed, at (frequency, required sensitivity)

use crate::domain::{CsfParams, ResponseRecord, SessionFile};
use crate::estimator::core::QcsfEstimator;
use crate::grid::axis::axis_value;
use crate::model::csf::{CsfShape, log_sensitivity};

/// Render a plot for a live estimator (and, in simulation, the true curve).
pub fn render_session_plot(
    estimator: &QcsfEstimator,
    true_params: Option<CsfParams>,
    width: usize,
    height: usize,
) -> String {
    let frequencies = estimator.stimulus_space().frequencies();
    let f_min = frequencies[0];
    let f_max = frequencies[frequencies.len() - 1];

    let estimate = estimator.get_results().params;
    let shape = *estimator.shape();
    let est_curve = sample_curve(&estimate, &shape, f_min, f_max, width.max(2));
    let true_curve = true_params.map(|p| sample_curve(&p, &shape, f_min, f_max, width.max(2)));

    render_plot(
        &est_curve,
        true_curve.as_deref(),
        estimator.response_history(),
        f_min,
        f_max,
        width,
        height,
    )
}

/// Render a plot from a saved session JSON file.
pub fn render_plot_from_session_file(session: &SessionFile, width: usize, height: usize) -> String {
    let curve: Vec<(f64, f64)> = session
        .curve
        .frequencies
        .iter()
        .zip(session.curve.sensitivity.iter())
        .map(|(&f, &s)| (f.log10(), s.log10()))
        .collect();

    let (f_min, f_max) = frequency_range(&session.curve.frequencies).unwrap_or((0.2, 36.0));
    render_plot(
        &curve,
        None,
        &session.history,
        f_min,
        f_max,
        width,
        height,
    )
}

fn render_plot(
    est_curve: &[(f64, f64)],
    true_curve: Option<&[(f64, f64)]>,
    history: &[ResponseRecord],
    f_min: f64,
    f_max: f64,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let x_min = f_min.log10();
    let x_max = f_max.log10();

    let (y_min, y_max) = y_range(est_curve, true_curve, history).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // True curve first, estimated curve second, so the estimate wins overlaps
    // and trial markers overlay both.
    if let Some(curve) = true_curve {
        draw_curve(&mut grid, curve, x_min, x_max, y_min, y_max, '~');
    }
    draw_curve(&mut grid, est_curve, x_min, x_max, y_min, y_max, '-');

    for record in history {
        let x = map_x(record.stimulus.frequency.log10(), x_min, x_max, width);
        let y = map_y(
            record.stimulus.required_sensitivity().log10(),
            y_min,
            y_max,
            height,
        );
        grid[y][x] = if record.detected { 'o' } else { 'x' };
    }

    // Build final string. We include a small header with ranges.
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: frequency=[{f_min:.2}, {f_max:.2}] cpd | log10 sensitivity=[{y_min:.2}, {y_max:.2}]\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

/// Sample a CSF curve as (log10 frequency, log10 sensitivity) pairs on a
/// log-spaced frequency grid.
fn sample_curve(
    params: &CsfParams,
    shape: &CsfShape,
    f_min: f64,
    f_max: f64,
    n: usize,
) -> Vec<(f64, f64)> {
    let n = n.max(2);
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let f = axis_value(f_min, f_max, n, i as f64);
        out.push((f.log10(), log_sensitivity(params, shape, f)));
    }
    out
}

fn frequency_range(frequencies: &[f64]) -> Option<(f64, f64)> {
    let mut min_f = f64::INFINITY;
    let mut max_f = f64::NEG_INFINITY;
    for &f in frequencies {
        min_f = min_f.min(f);
        max_f = max_f.max(f);
    }
    if min_f.is_finite() && max_f.is_finite() && max_f > min_f {
        Some((min_f, max_f))
    } else {
        None
    }
}

fn y_range(
    est_curve: &[(f64, f64)],
    true_curve: Option<&[(f64, f64)]>,
    history: &[ResponseRecord],
) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for &(_, y) in est_curve {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if let Some(curve) = true_curve {
        for &(_, y) in curve {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }
    for record in history {
        let y = record.stimulus.required_sensitivity().log10();
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    ch: char,
) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let cx = map_x(x, x_min, x_max, width);
        let cy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, cx, cy, ch);
        } else {
            grid[cy][cx] = ch;
        }
        prev = Some((cx, cy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CsfCurveGrid, CsfVariant, Stimulus};
    use chrono::NaiveDate;

    #[test]
    fn plot_golden_snapshot_small() {
        // A flat saved curve at sensitivity 10 with one detected and one
        // missed trial pinned to the plot corners.
        let session = SessionFile {
            tool: "qcsf".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            variant: CsfVariant::Fovea,
            trials: 2,
            estimate: crate::domain::ParameterEstimate {
                params: CsfParams {
                    peak_sensitivity: 10.0,
                    peak_frequency: 1.0,
                    bandwidth: 3.0,
                    delta: 0.5,
                },
                indices: [0.0; 4],
            },
            true_params: None,
            history: vec![
                ResponseRecord {
                    stimulus: Stimulus {
                        contrast: 0.01,
                        frequency: 10.0,
                    },
                    detected: true,
                },
                ResponseRecord {
                    stimulus: Stimulus {
                        contrast: 1.0,
                        frequency: 1.0,
                    },
                    detected: false,
                },
            ],
            curve: CsfCurveGrid {
                frequencies: vec![1.0, 10.0],
                sensitivity: vec![10.0, 10.0],
            },
        };

        let txt = render_plot_from_session_file(&session, 10, 5);
        let expected = concat!(
            "Plot: frequency=[1.00, 10.00] cpd | log10 sensitivity=[-0.10, 2.10]\n",
            "         o\n",
            "          \n",
            "----------\n",
            "          \n",
            "x         \n",
        );
        assert_eq!(txt, expected);
    }
}
