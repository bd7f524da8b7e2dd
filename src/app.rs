//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - builds the stimulus/parameter grids and the estimator
//! - runs simulated or interactive sessions
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use crate::cli::{Command, PlotArgs, SessionArgs, SimulateArgs};
use crate::domain::{CsfParams, CsfVariant, ResponseMode, RunConfig};
use crate::error::AppError;
use crate::estimator::core::QcsfEstimator;
use crate::grid::params::ParameterSpace;
use crate::grid::stimulus::StimulusSpace;
use crate::model::psychometric::PsychometricConfig;

pub mod pipeline;

/// Entry point for the `qcsf` binary.
pub fn run() -> Result<(), AppError> {
    // We want `qcsf` and `qcsf -n 50` to behave like `qcsf tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing. This preserves a clean clap structure while
    // retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Simulate(args) => handle_simulate(args),
        Command::Session(args) => handle_session(args),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => crate::tui::run(run_config_from_simulate_args(&args)),
    }
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let config = run_config_from_simulate_args(&args);
    let mut session = pipeline::SimulationSession::new(&config)?;
    session.run_to_end()?;

    finish_session(&config, session.estimator(), Some(session.true_params()))
}

fn handle_session(args: SessionArgs) -> Result<(), AppError> {
    let config = run_config_from_session_args(&args);
    let stimulus_space = StimulusSpace::new(&config.stimulus)?;
    let param_space = ParameterSpace::new(&config.param_grid)?;
    let mut estimator = QcsfEstimator::new(
        stimulus_space,
        param_space,
        config.variant,
        PsychometricConfig::default(),
    )?;

    println!(
        "Interactive session: {} trials. Answer y (seen) / n (not seen); q stops early.",
        config.trials
    );
    for trial in 1..=config.trials {
        let stimulus = estimator.next()?;
        println!(
            "Trial {trial}/{}: frequency {:.2} cpd at {:.2}% contrast — seen? [y/n/q] ",
            config.trials,
            stimulus.frequency,
            stimulus.contrast * 100.0
        );
        match read_response_key()? {
            Some(detected) => estimator.mark_response(detected)?,
            None => {
                println!("Stopped after {} trials.", trial - 1);
                break;
            }
        }
    }

    finish_session(&config, &estimator, None)
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let session = crate::io::session::read_session_json(&args.session)?;
    let plot = crate::plot::render_plot_from_session_file(&session, args.width, args.height);
    println!("{plot}");
    Ok(())
}

/// Shared tail of every finished (or stopped) session: report, plot, exports.
fn finish_session(
    config: &RunConfig,
    estimator: &QcsfEstimator,
    true_params: Option<CsfParams>,
) -> Result<(), AppError> {
    println!(
        "{}",
        crate::report::format_history(estimator.response_history())
    );
    println!(
        "{}",
        crate::report::format_run_summary(config, estimator, true_params)
    );

    if config.plot {
        let plot = crate::plot::render_session_plot(
            estimator,
            true_params,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    if let Some(path) = &config.export_session {
        let file = crate::io::session::build_session_file(
            estimator,
            true_params,
            config.variant,
            chrono::Local::now().date_naive(),
        );
        crate::io::session::write_session_json(path, &file)?;
    }
    if let Some(path) = &config.export_history {
        crate::io::export::write_history_csv(path, estimator.response_history())?;
    }

    Ok(())
}

/// Ensures raw mode is released even if reading fails.
struct RawModeGuard;

impl RawModeGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::io(format!("Failed to enable raw mode: {e}")))?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Block until the observer answers: `Some(true)` = seen, `Some(false)` = not
/// seen, `None` = quit.
fn read_response_key() -> Result<Option<bool>, AppError> {
    let _guard = RawModeGuard::new()?;
    loop {
        match event::read().map_err(|e| AppError::io(format!("Event read error: {e}")))? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => return Ok(Some(true)),
                KeyCode::Char('n') | KeyCode::Char('N') => return Ok(Some(false)),
                KeyCode::Char('q') | KeyCode::Esc => return Ok(None),
                _ => {}
            },
            _ => {}
        }
    }
}

pub fn run_config_from_simulate_args(args: &SimulateArgs) -> RunConfig {
    let mut config = base_run_config(&args.stimulus, &args.output);
    config.trials = args.trials;
    config.seed = args.seed;
    config.variant = if args.periphery {
        CsfVariant::Periphery
    } else {
        CsfVariant::Fovea
    };
    config.response_mode = if args.perfect {
        ResponseMode::Perfect
    } else {
        ResponseMode::Probabilistic
    };
    config.true_indices = [
        args.true_peak_sensitivity,
        args.true_peak_frequency,
        args.true_bandwidth,
        args.true_delta,
    ];
    config
}

pub fn run_config_from_session_args(args: &SessionArgs) -> RunConfig {
    let mut config = base_run_config(&args.stimulus, &args.output);
    config.trials = args.trials;
    config.variant = if args.periphery {
        CsfVariant::Periphery
    } else {
        CsfVariant::Fovea
    };
    config
}

fn base_run_config(
    stimulus: &crate::cli::StimulusArgs,
    output: &crate::cli::OutputArgs,
) -> RunConfig {
    let mut config = RunConfig::default();
    config.stimulus.contrast.min = stimulus.min_contrast;
    config.stimulus.contrast.max = stimulus.max_contrast;
    config.stimulus.contrast.steps = stimulus.contrast_resolution;
    config.stimulus.frequency.min = stimulus.min_frequency;
    config.stimulus.frequency.max = stimulus.max_frequency;
    config.stimulus.frequency.steps = stimulus.frequency_resolution;

    config.plot = output.plot && !output.no_plot;
    config.plot_width = output.width;
    config.plot_height = output.height;
    config.export_session = output.export_session.clone();
    config.export_history = output.export_history.clone();
    config
}

/// Rewrite argv so `qcsf` defaults to `qcsf tui`.
///
/// Rules:
/// - `qcsf`                      -> `qcsf tui`
/// - `qcsf -n 50 ...`            -> `qcsf tui -n 50 ...`
/// - `qcsf --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "simulate" | "session" | "plot" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_tui() {
        assert_eq!(rewrite_args(argv(&["qcsf"])), argv(&["qcsf", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["qcsf", "-n", "50"])),
            argv(&["qcsf", "tui", "-n", "50"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(
            rewrite_args(argv(&["qcsf", "simulate"])),
            argv(&["qcsf", "simulate"])
        );
        assert_eq!(
            rewrite_args(argv(&["qcsf", "--help"])),
            argv(&["qcsf", "--help"])
        );
    }
}
