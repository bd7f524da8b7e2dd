//! Command-line parsing for the adaptive CSF estimator.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the estimator/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "qcsf",
    version,
    about = "Adaptive contrast-sensitivity (quick CSF) estimation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a simulated session and print the trial history and estimates.
    Simulate(SimulateArgs),
    /// Run an interactive session, collecting yes/no responses from the keyboard.
    Session(SessionArgs),
    /// Plot a previously exported session JSON.
    Plot(PlotArgs),
    /// Launch the interactive TUI.
    ///
    /// Runs the same simulated session as `qcsf simulate`, but renders the
    /// evolving estimate in a terminal UI using Ratatui.
    Tui(SimulateArgs),
}

/// Stimulus-space options shared by all session-running commands.
#[derive(Debug, Parser, Clone)]
pub struct StimulusArgs {
    /// The lowest contrast value to measure (0.0-1.0).
    #[arg(long, default_value_t = 0.01)]
    pub min_contrast: f64,

    /// The highest contrast value to measure (0.0-1.0).
    #[arg(long, default_value_t = 1.0)]
    pub max_contrast: f64,

    /// The number of contrast steps.
    #[arg(long, default_value_t = 24)]
    pub contrast_resolution: usize,

    /// The lowest frequency value to measure (cycles per degree).
    #[arg(long, default_value_t = 0.2)]
    pub min_frequency: f64,

    /// The highest frequency value to measure (cycles per degree).
    #[arg(long, default_value_t = 36.0)]
    pub max_frequency: f64,

    /// The number of frequency steps.
    #[arg(long, default_value_t = 20)]
    pub frequency_resolution: usize,
}

/// Plot/export options shared by all session-running commands.
#[derive(Debug, Parser, Clone)]
pub struct OutputArgs {
    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the finished session (estimate + history + curve) to JSON.
    #[arg(long = "export-session")]
    pub export_session: Option<PathBuf>,

    /// Export the trial history to CSV.
    #[arg(long = "export-history")]
    pub export_history: Option<PathBuf>,
}

/// Options for simulated sessions (`simulate` and `tui`).
#[derive(Debug, Parser, Clone)]
pub struct SimulateArgs {
    /// Number of trials to simulate.
    #[arg(short = 'n', long, default_value_t = 30)]
    pub trials: usize,

    /// Simulate perfect responses rather than probabilistic ones.
    #[arg(long)]
    pub perfect: bool,

    /// Use the peripheral-vision CSF coefficient set.
    #[arg(long)]
    pub periphery: bool,

    /// Seed for the simulated observer's RNG.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// True peak sensitivity (grid index).
    #[arg(short = 's', long, default_value_t = 18)]
    pub true_peak_sensitivity: usize,

    /// True peak frequency (grid index).
    #[arg(short = 'f', long, default_value_t = 11)]
    pub true_peak_frequency: usize,

    /// True bandwidth (grid index).
    #[arg(short = 'b', long, default_value_t = 12)]
    pub true_bandwidth: usize,

    /// True delta truncation (grid index).
    #[arg(short = 'd', long, default_value_t = 11)]
    pub true_delta: usize,

    #[command(flatten)]
    pub stimulus: StimulusArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Options for interactive (human-observer) sessions.
#[derive(Debug, Parser)]
pub struct SessionArgs {
    /// Number of trials to run.
    #[arg(short = 'n', long, default_value_t = 30)]
    pub trials: usize,

    /// Use the peripheral-vision CSF coefficient set.
    #[arg(long)]
    pub periphery: bool,

    #[command(flatten)]
    pub stimulus: StimulusArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Options for plotting a saved session.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Session JSON file produced by `--export-session`.
    #[arg(long, value_name = "JSON")]
    pub session: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
