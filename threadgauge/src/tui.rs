//! # Terminal User Interface (TUI)
//!
//! Interactive shell around the engine using `ratatui`.
//!
//! ## Layout
//!
//! ```text
//! ┌ header ───────────────────────────────────────────┐
//! ├ telemetry ────────┬ output log ───────────────────┤
//! ├ controls ─────────┤                               │
//! ├ key bar ──────────┴───────────────────────────────┤
//! ```
//!
//! ## Run Lifecycle
//!
//! At most one run is active. `p`/`s` start a probe or stress test as a
//! background [`Task`]; every frame drains its events into the output log. `x`
//! requests cancellation; the run stays active until its result, produced
//! after cleanup, arrives. Telemetry is resampled every 500 ms regardless.
//!
//! ## Sub-Modules
//!
//! - `telemetry` - Memory/thread/CPU gauges
//! - `controls` - Adjustable run parameters
//! - `output` - Timestamped output log
//! - `theme` - Color scheme and severity thresholds

#![allow(clippy::too_many_lines)]

use anyhow::Result;
use crossbeam_channel::TryRecvError;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Terminal,
};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use threadgauge_common::{LoadResult, ProbeResult, ResourceSample, StopReason};

pub mod controls;
pub mod output;
mod telemetry;
pub mod theme;

use controls::Controls;
use output::OutputLog;
use telemetry::TelemetryPanel;
use theme::{CAUTION_AMBER, CRITICAL_RED, HUD_GREEN, INFO_DIM};

use crate::domain::{GaugeError, GaugeResult, Platform, RunKind};
use crate::engine::{LoadGenerator, RunEvent, Task, ThreadCapacityProbe};
use crate::export::{self, load_summary, probe_summary, Report, ReportFormat};
use crate::sampling::ResourceSampler;
use crate::sysinfo::SystemInfo;

const STYLE_HEADING: Style = Style::new().fg(HUD_GREEN).add_modifier(Modifier::BOLD);
const STYLE_DIM: Style = Style::new().fg(INFO_DIM);
const STYLE_KEY: Style = Style::new().fg(CAUTION_AMBER);
const STYLE_TEXT: Style = Style::new().fg(ratatui::style::Color::White);

/// Telemetry refresh period
const SAMPLE_INTERVAL: Duration = Duration::from_millis(500);
/// Redraw period
const UPDATE_INTERVAL: Duration = Duration::from_millis(100);

enum ActiveRun {
    Probe(Task<ProbeResult>),
    Stress(Task<LoadResult>),
}

impl ActiveRun {
    fn kind(&self) -> RunKind {
        match self {
            Self::Probe(task) => task.kind(),
            Self::Stress(task) => task.kind(),
        }
    }

    fn cancel(&self) {
        match self {
            Self::Probe(task) => task.cancel(),
            Self::Stress(task) => task.cancel(),
        }
    }

    /// Block until the run ends, discarding progress
    fn wait(self) {
        let outcome = match self {
            Self::Probe(task) => task.wait(|_| {}).map(|_| ()),
            Self::Stress(task) => task.wait(|_| {}).map(|_| ()),
        };
        if let Err(e) = outcome {
            log::warn!("{e}");
        }
    }
}

enum Finished {
    Probe(GaugeResult<ProbeResult>),
    Stress(GaugeResult<LoadResult>),
}

/// Move pending events into the log; `Some` once the run is over
fn drain<T>(task: &Task<T>, log: &mut OutputLog) -> Option<GaugeResult<T>> {
    loop {
        match task.events().try_recv() {
            Ok(RunEvent::Progress(line)) => log.info(&line),
            Ok(RunEvent::Finished(result)) => return Some(Ok(result)),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                return Some(Err(GaugeError::RunAborted(task.kind().to_string())));
            }
        }
    }
}

/// Live shell state
pub struct App {
    sampler: ResourceSampler,
    sample: ResourceSample,
    last_sample: Option<Instant>,
    system: SystemInfo,
    controls: Controls,
    log: OutputLog,
    active: Option<ActiveRun>,
    last_probe: Option<ProbeResult>,
    last_stress: Option<LoadResult>,
    export_path: Option<PathBuf>,
    show_help: bool,
    should_quit: bool,
}

impl App {
    /// `export_path` is where `e` writes; a timestamped `.txt` name otherwise
    #[must_use]
    pub fn new(export_path: Option<PathBuf>) -> Self {
        let mut log = OutputLog::new();
        log.info("threadgauge initialized. Ready to test thread behavior.");
        Self {
            sampler: ResourceSampler::new(),
            sample: ResourceSample::default(),
            last_sample: None,
            system: SystemInfo::collect(),
            controls: Controls::default(),
            log,
            active: None,
            last_probe: None,
            last_stress: None,
            export_path,
            show_help: false,
            should_quit: false,
        }
    }

    fn running(&self) -> Option<RunKind> {
        self.active.as_ref().map(ActiveRun::kind)
    }

    fn handle_key(&mut self, key: KeyCode) {
        if self.show_help {
            self.show_help = false;
            return;
        }
        match key {
            KeyCode::Char('q' | 'Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('p' | 'P') => self.start_probe(),
            KeyCode::Char('s' | 'S') => self.start_stress(),
            KeyCode::Char('x' | 'X') => self.stop(),
            KeyCode::Char('e' | 'E') => self.export(),
            KeyCode::Char('y' | 'Y') => self.yank(),
            KeyCode::Char('c' | 'C') => self.log.clear(),
            KeyCode::Char('?') => self.show_help = true,
            _ if self.active.is_some() => {}
            KeyCode::Char('+' | '=') => self.controls.stack_up(),
            KeyCode::Char('-') => self.controls.stack_down(),
            KeyCode::Char(']') => self.controls.threads_up(),
            KeyCode::Char('[') => self.controls.threads_down(),
            KeyCode::Char('.') => self.controls.duration_up(),
            KeyCode::Char(',') => self.controls.duration_down(),
            _ => {}
        }
    }

    fn start_probe(&mut self) {
        if let Some(kind) = self.running() {
            self.log.warning(&format!("A {kind} is already running"));
            return;
        }
        let started = ThreadCapacityProbe::new(self.controls.probe_config())
            .and_then(Task::spawn_probe);
        match started {
            Ok(task) => self.active = Some(ActiveRun::Probe(task)),
            Err(e) => self.log.error(&format!("Test failed: {e}")),
        }
    }

    fn start_stress(&mut self) {
        if let Some(kind) = self.running() {
            self.log.warning(&format!("A {kind} is already running"));
            return;
        }
        let started =
            LoadGenerator::new(self.controls.load_config()).and_then(Task::spawn_load);
        match started {
            Ok(task) => self.active = Some(ActiveRun::Stress(task)),
            Err(e) => self.log.error(&format!("Stress test failed: {e}")),
        }
    }

    fn stop(&mut self) {
        if let Some(active) = &self.active {
            active.cancel();
            self.log.warning(&format!("Stopping {}...", active.kind()));
        }
    }

    /// Drain the active run; record its result once it arrives
    fn poll_run(&mut self) {
        let finished = match &self.active {
            None => return,
            Some(ActiveRun::Probe(task)) => drain(task, &mut self.log).map(Finished::Probe),
            Some(ActiveRun::Stress(task)) => drain(task, &mut self.log).map(Finished::Stress),
        };
        let Some(finished) = finished else { return };
        self.active = None;

        match finished {
            Finished::Probe(Ok(result)) => {
                let summary = probe_summary(&result).join("\n");
                if result.stop_reason == StopReason::Cancelled {
                    self.log.warning("Max threads test was cancelled.");
                    self.log.info(&summary);
                } else {
                    self.log.success(&summary);
                }
                self.last_probe = Some(result);
            }
            Finished::Stress(Ok(result)) => {
                let summary = load_summary(&result).join("\n");
                if result.cancelled {
                    self.log.warning(&summary);
                } else {
                    self.log.success(&summary);
                }
                self.last_stress = Some(result);
            }
            Finished::Probe(Err(e)) => self.log.error(&format!("Test failed: {e}")),
            Finished::Stress(Err(e)) => self.log.error(&format!("Stress test failed: {e}")),
        }
    }

    fn tick_sample(&mut self) {
        if self.last_sample.map_or(true, |at| at.elapsed() >= SAMPLE_INTERVAL) {
            self.sample = self.sampler.sample();
            self.last_sample = Some(Instant::now());
        }
    }

    fn report(&self) -> Report {
        Report::new(self.system.clone(), self.sample)
            .with_probe(self.last_probe.clone())
            .with_stress(self.last_stress)
            .with_log(self.log.lines())
    }

    fn export(&mut self) {
        let path = self.export_path.clone().unwrap_or_else(default_export_path);
        match export::export_to_file(&self.report(), &path) {
            Ok(saved) => self.log.success(&format!("Results exported to: {}", saved.display())),
            Err(e) => self.log.error(&format!("Export failed: {e}")),
        }
    }

    fn yank(&mut self) {
        let copied = export::render_report(&self.report(), ReportFormat::Text)
            .and_then(|text| copy_to_clipboard(&text));
        match copied {
            Ok(()) => self.log.success("Report copied to clipboard"),
            Err(e) => self.log.error(&format!("Copy failed: {e}")),
        }
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let started = Instant::now();
        let mut last_update: Option<Instant> = None;

        loop {
            self.poll_run();
            self.tick_sample();

            if last_update.map_or(true, |at| at.elapsed() >= UPDATE_INTERVAL) {
                terminal.draw(|f| self.render(f, started.elapsed()))?;
                last_update = Some(Instant::now());
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }

            if self.should_quit {
                return Ok(());
            }
        }
    }

    fn render(&self, f: &mut ratatui::Frame, uptime: Duration) {
        let outer_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Panels
                Constraint::Length(3), // Key bar
            ])
            .split(f.area());

        let (state, state_color) = match self.running() {
            Some(RunKind::Probe) => ("[PROBE]", CRITICAL_RED),
            Some(RunKind::Stress) => ("[STRESS]", CRITICAL_RED),
            None => ("[IDLE]", HUD_GREEN),
        };
        let header = Paragraph::new(vec![Line::from(vec![
            Span::styled("THREADGAUGE", STYLE_HEADING),
            Span::styled(" | ", STYLE_DIM),
            Span::styled(state, Style::new().fg(state_color).add_modifier(Modifier::BOLD)),
            Span::styled(" | ", STYLE_DIM),
            Span::styled(Platform::current().to_string(), Style::new().fg(HUD_GREEN)),
            Span::styled(" | ", STYLE_DIM),
            Span::styled(format!("PID:{}", std::process::id()), Style::new().fg(HUD_GREEN)),
            Span::styled(" | ", STYLE_DIM),
            Span::styled(
                format!("{} cpus", self.system.available_parallelism),
                Style::new().fg(CAUTION_AMBER),
            ),
            Span::styled(format!(" | up {}s", uptime.as_secs()), STYLE_DIM),
        ])])
        .block(Block::default().borders(Borders::ALL).border_style(Style::new().fg(state_color)));
        f.render_widget(header, outer_layout[0]);

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(outer_layout[1]);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(8), Constraint::Min(0)])
            .split(cols[0]);

        TelemetryPanel::new(&self.sample).render(f, left[0]);
        self.controls.render(f, left[1], self.running());
        self.log.render(f, cols[1]);

        let key = |k: &'static str, label: &'static str| {
            [Span::styled(k, STYLE_KEY), Span::styled(label, STYLE_DIM)]
        };
        let mut spans = Vec::new();
        spans.extend(key("P", ":Probe "));
        spans.extend(key("S", ":Stress "));
        spans.extend(key("X", ":Stop "));
        spans.extend(key("E", ":Export "));
        spans.extend(key("Y", ":Copy "));
        spans.extend(key("C", ":Clear "));
        spans.extend(key("?", ":Help "));
        spans.extend(key("Q", ":Quit"));
        let status = Paragraph::new(vec![Line::from(spans)]).block(
            Block::default().borders(Borders::ALL).border_style(Style::default().fg(HUD_GREEN)),
        );
        f.render_widget(status, outer_layout[2]);

        if self.show_help {
            render_help_overlay(f, f.area());
        }
    }
}

/// Run the interactive shell until the user quits.
///
/// Terminal logging is muted while the alternate screen is active. A run still
/// in flight on quit is cancelled and reaped before returning.
///
/// # Errors
/// Returns an error if the terminal cannot be set up or drawn
pub fn run(export_path: Option<PathBuf>) -> Result<()> {
    let terminal_err = |e: io::Error| GaugeError::Terminal(e.to_string());
    enable_raw_mode().map_err(terminal_err)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).map_err(terminal_err)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(terminal_err)?;

    let previous_level = log::max_level();
    log::set_max_level(log::LevelFilter::Off);

    let mut app = App::new(export_path);
    let outcome = app.event_loop(&mut terminal);

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    log::set_max_level(previous_level);

    if let Some(active) = app.active.take() {
        eprintln!("waiting for {} to stop...", active.kind());
        active.cancel();
        active.wait();
    }
    outcome
}

fn default_export_path() -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    Path::new(".").join(format!("threadgauge-report-{stamp}.txt"))
}

fn copy_to_clipboard(text: &str) -> GaugeResult<()> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| GaugeError::Clipboard(e.to_string()))?;
    clipboard.set_text(text.to_owned()).map_err(|e| GaugeError::Clipboard(e.to_string()))
}

fn render_help_overlay(f: &mut ratatui::Frame, area: Rect) {
    let popup_area = centered_popup(area, 70, 22);

    let entry = |k: &'static str, text: &'static str| {
        Line::from(vec![Span::styled(format!("  {k:<6}"), STYLE_KEY), Span::styled(text, STYLE_TEXT)])
    };
    let help_text = vec![
        Line::from(""),
        Line::from(Span::styled("  What You're Looking At", STYLE_HEADING)),
        Line::from(Span::styled(
            "  The probe creates idle threads until memory, the OS or the safety",
            STYLE_DIM,
        )),
        Line::from(Span::styled(
            "  cap stops it. The stress test keeps busy threads running and",
            STYLE_DIM,
        )),
        Line::from(Span::styled("  samples system CPU load.", STYLE_DIM)),
        Line::from(""),
        Line::from(Span::styled("  Keys", STYLE_HEADING)),
        entry("p", "Start max threads probe"),
        entry("s", "Start stress test"),
        entry("x", "Stop the running test"),
        entry("- +", "Stack size"),
        entry("[ ]", "Stress thread count"),
        entry(", .", "Stress duration"),
        entry("e", "Export report"),
        entry("y", "Copy report to clipboard"),
        entry("c", "Clear log"),
        entry("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled("  Press any key to close", STYLE_DIM)),
    ];

    let help_widget = Paragraph::new(help_text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Help ")
            .style(Style::new().bg(ratatui::style::Color::Black).fg(HUD_GREEN)),
    );

    f.render_widget(Clear, popup_area);
    f.render_widget(help_widget, popup_area);
}

/// Create a centered popup area with given width percentage and height in lines
fn centered_popup(area: Rect, width_percent: u16, height_lines: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(height_lines), Constraint::Fill(1)])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(vertical[1])[1]
}
