//! Ratatui-based terminal UI.
//!
//! The TUI runs a simulated session trial by trial, rendering the evolving
//! estimate against the true CSF, plus a settings panel for trial count, seed,
//! response mode and vision-field variant.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::app::pipeline::SimulationSession;
use crate::domain::{CsfParams, CsfVariant, ResponseMode, RunConfig};
use crate::error::AppError;
use crate::grid::axis::axis_value;
use crate::model::csf::{CsfShape, log_sensitivity};

mod plotters_chart;

use plotters_chart::CsfPlottersChart;

/// Number of points sampled per CSF curve line.
const CURVE_POINTS: usize = 200;

/// Start the TUI with the given run configuration.
pub fn run(config: RunConfig) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::io(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config)?;
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::io(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::io(format!(
                "Failed to enter alternate screen: {e}"
            )));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    config: RunConfig,
    session: SimulationSession,
    selected_field: usize,
    auto_run: bool,
    status: String,
}

impl App {
    fn new(config: RunConfig) -> Result<Self, AppError> {
        let session = SimulationSession::new(&config)?;
        Ok(Self {
            config,
            session,
            selected_field: 0,
            auto_run: false,
            status: "space: one trial | a: autorun | r: restart".to_string(),
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::io(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if self.auto_run && !self.session.is_done() {
                self.step_trial()?;
                needs_redraw = true;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::io(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::io(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char(' ') => {
                self.step_trial()?;
            }
            KeyCode::Char('a') => {
                self.auto_run = !self.auto_run;
                self.status = if self.auto_run {
                    "autorun on".to_string()
                } else {
                    "autorun off".to_string()
                };
            }
            KeyCode::Char('r') => {
                self.config.seed = self.config.seed.wrapping_add(1);
                self.rebuild_session()?;
                self.status = format!("Restarted with seed {}.", self.config.seed);
            }
            KeyCode::Char('m') => {
                self.config.response_mode = match self.config.response_mode {
                    ResponseMode::Perfect => ResponseMode::Probabilistic,
                    ResponseMode::Probabilistic => ResponseMode::Perfect,
                };
                self.rebuild_session()?;
                self.status = format!(
                    "responses: {}",
                    self.config.response_mode.display_name()
                );
            }
            KeyCode::Char('v') => {
                self.config.variant = match self.config.variant {
                    CsfVariant::Fovea => CsfVariant::Periphery,
                    CsfVariant::Periphery => CsfVariant::Fovea,
                };
                self.rebuild_session()?;
                self.status = format!("variant: {}", self.config.variant.display_name());
            }
            KeyCode::Char('d') => {
                match crate::debug::write_debug_bundle(self.session.estimator(), &self.config) {
                    Ok(path) => {
                        self.status = format!("Wrote debug bundle: {}", path.display());
                    }
                    Err(err) => {
                        self.status = format!("Debug write failed: {err}");
                    }
                }
            }
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field < 1 {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1)?,
            KeyCode::Right => self.adjust_field(1)?,
            _ => {}
        }

        Ok(false)
    }

    fn step_trial(&mut self) -> Result<(), AppError> {
        match self.session.step()? {
            Some(outcome) => {
                self.status = format!(
                    "Trial {}: f={:.2}cpd c={:.4} -> {}",
                    outcome.trial,
                    outcome.stimulus.frequency,
                    outcome.stimulus.contrast,
                    if outcome.detected { "seen" } else { "missed" }
                );
            }
            None => {
                self.auto_run = false;
                self.status = "Session complete. r restarts with a fresh seed.".to_string();
            }
        }
        Ok(())
    }

    fn adjust_field(&mut self, delta: i64) -> Result<(), AppError> {
        match self.selected_field {
            0 => {
                let next = self.config.trials as i64 + delta * 5;
                self.config.trials = next.clamp(5, 500) as usize;
                self.rebuild_session()?;
                self.status = format!("trials: {}", self.config.trials);
            }
            1 => {
                self.config.seed = if delta >= 0 {
                    self.config.seed.wrapping_add(1)
                } else {
                    self.config.seed.wrapping_sub(1)
                };
                self.rebuild_session()?;
                self.status = format!("seed: {}", self.config.seed);
            }
            _ => {}
        }
        Ok(())
    }

    fn rebuild_session(&mut self) -> Result<(), AppError> {
        self.auto_run = false;
        self.session = SimulationSession::new(&self.config)?;
        Ok(())
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("qcsf", Style::default().fg(Color::Cyan)),
            Span::raw(" — adaptive contrast sensitivity"),
        ]));

        lines.push(Line::from(Span::styled(
            format!(
                "variant: {} | responses: {} | trial {}/{} | seed: {}",
                self.config.variant.display_name(),
                self.config.response_mode.display_name(),
                self.session.completed(),
                self.session.trials(),
                self.config.seed,
            ),
            Style::default().fg(Color::Gray),
        )));

        let estimate = self.session.estimator().get_results().params;
        lines.push(Line::from(Span::styled(
            format!(
                "estimate: peak {:.1} @ {:.2}cpd | bw {:.2}oct | delta {:.3}",
                estimate.peak_sensitivity,
                estimate.peak_frequency,
                estimate.bandwidth,
                estimate.delta,
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(6)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_settings(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("CSF").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let series = chart_series(&self.session);
        let widget = CsfPlottersChart {
            estimated: &series.estimated,
            truth: &series.truth,
            detected: &series.detected,
            missed: &series.missed,
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
            x_label: "frequency (cpd)",
            y_label: "sensitivity",
            fmt_x: fmt_axis_pow10,
            fmt_y: fmt_axis_pow10,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items = vec![
            ListItem::new(format!("Trials: {}", self.config.trials)),
            ListItem::new(format!("Seed: {}", self.config.seed)),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help =
            "space trial  a autorun  r restart  m responses  v variant  ←/→ adjust  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(
                &self.status,
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Precomputed chart series in log10 coordinates.
struct ChartSeries {
    estimated: Vec<(f64, f64)>,
    truth: Vec<(f64, f64)>,
    detected: Vec<(f64, f64)>,
    missed: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Build chart series for Plotters.
fn chart_series(session: &SimulationSession) -> ChartSeries {
    let estimator = session.estimator();
    let frequencies = estimator.stimulus_space().frequencies();
    let f_min = frequencies[0];
    let f_max = frequencies[frequencies.len() - 1];
    let x_bounds = [f_min.log10(), f_max.log10()];

    let shape = *estimator.shape();
    let estimate = estimator.get_results().params;
    let estimated = sample_log_curve(&estimate, &shape, f_min, f_max);
    let truth = sample_log_curve(&session.true_params(), &shape, f_min, f_max);

    let mut detected = Vec::new();
    let mut missed = Vec::new();
    for record in estimator.response_history() {
        let point = (
            record.stimulus.frequency.log10(),
            record.stimulus.required_sensitivity().log10(),
        );
        if record.detected {
            detected.push(point);
        } else {
            missed.push(point);
        }
    }

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for series in [&estimated, &truth, &detected, &missed] {
        for &(_, y) in series {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        y_min = 0.0;
        y_max = 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    let y_bounds = [y_min - pad, y_max + pad];

    ChartSeries {
        estimated,
        truth,
        detected,
        missed,
        x_bounds,
        y_bounds,
    }
}

fn sample_log_curve(
    params: &CsfParams,
    shape: &CsfShape,
    f_min: f64,
    f_max: f64,
) -> Vec<(f64, f64)> {
    let mut out = Vec::with_capacity(CURVE_POINTS);
    for i in 0..CURVE_POINTS {
        let f = axis_value(f_min, f_max, CURVE_POINTS, i as f64);
        out.push((f.log10(), log_sensitivity(params, shape, f)));
    }
    out
}

fn fmt_axis_pow10(v: f64) -> String {
    let value = 10f64.powf(v);
    if value >= 10.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
