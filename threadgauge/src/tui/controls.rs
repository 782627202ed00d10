//! Run parameters adjustable from the keyboard
//!
//! Bounds and step sizes match the CLI ranges, so a value chosen here is always
//! one the CLI would also accept.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use threadgauge_common::{
    LoadConfig, ProbeConfig, DEFAULT_STACK_SIZE_KB, DEFAULT_STRESS_DURATION_SECS,
    DEFAULT_STRESS_THREADS,
};

use super::theme::{CAUTION_AMBER, HUD_GREEN, INFO_DIM};
use crate::domain::{RunKind, StackSizeKb};

/// Inclusive range with a fixed step
#[derive(Debug, Clone, Copy)]
struct Stepper {
    min: u32,
    max: u32,
    step: u32,
}

impl Stepper {
    fn up(self, value: u32) -> u32 {
        value.saturating_add(self.step).min(self.max)
    }

    fn down(self, value: u32) -> u32 {
        value.saturating_sub(self.step).max(self.min)
    }
}

const STACK_KB: Stepper = Stepper { min: 128, max: 8192, step: 128 };
const THREADS: Stepper = Stepper { min: 10, max: 10_000, step: 50 };
const DURATION_SECS: Stepper = Stepper { min: 1, max: 60, step: 5 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub stack_size_kb: u32,
    pub stress_threads: u32,
    pub stress_duration_secs: u32,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            stack_size_kb: DEFAULT_STACK_SIZE_KB,
            stress_threads: DEFAULT_STRESS_THREADS,
            stress_duration_secs: DEFAULT_STRESS_DURATION_SECS,
        }
    }
}

impl Controls {
    pub fn stack_up(&mut self) {
        self.stack_size_kb = STACK_KB.up(self.stack_size_kb);
    }

    /// Stepping below the smallest explicit size selects the platform default
    pub fn stack_down(&mut self) {
        self.stack_size_kb = if self.stack_size_kb <= STACK_KB.min {
            StackSizeKb::PLATFORM_DEFAULT.0
        } else {
            STACK_KB.down(self.stack_size_kb)
        };
    }

    pub fn threads_up(&mut self) {
        self.stress_threads = THREADS.up(self.stress_threads);
    }

    pub fn threads_down(&mut self) {
        self.stress_threads = THREADS.down(self.stress_threads);
    }

    pub fn duration_up(&mut self) {
        self.stress_duration_secs = DURATION_SECS.up(self.stress_duration_secs);
    }

    pub fn duration_down(&mut self) {
        self.stress_duration_secs = DURATION_SECS.down(self.stress_duration_secs);
    }

    #[must_use]
    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig::with_stack_size(self.stack_size_kb)
    }

    #[must_use]
    pub fn load_config(&self) -> LoadConfig {
        LoadConfig::new(self.stress_threads, self.stress_duration_secs)
    }

    /// Parameters panel; values are dimmed while a run owns them
    pub fn render(&self, f: &mut Frame, area: Rect, running: Option<RunKind>) {
        let value_style = if running.is_some() {
            Style::new().fg(INFO_DIM)
        } else {
            Style::new().fg(CAUTION_AMBER)
        };
        let row = |key: &'static str, label: &'static str, value: String| {
            Line::from(vec![
                Span::styled(format!(" {key:<4}"), Style::new().fg(CAUTION_AMBER)),
                Span::styled(format!("{label:<14}"), Style::new().fg(INFO_DIM)),
                Span::styled(value, value_style),
            ])
        };

        let state = running.map_or_else(
            || Span::styled(" Ready", Style::new().fg(HUD_GREEN)),
            |kind| Span::styled(format!(" Running {kind}..."), Style::new().fg(CAUTION_AMBER)),
        );

        let lines = vec![
            Line::from(Span::styled(" Max Threads Probe", Style::new().fg(HUD_GREEN))),
            row("-/+", "Stack size", StackSizeKb(self.stack_size_kb).to_string()),
            Line::from(""),
            Line::from(Span::styled(" Stress Test", Style::new().fg(HUD_GREEN))),
            row("[/]", "Threads", self.stress_threads.to_string()),
            row(",/.", "Duration", format!("{} s", self.stress_duration_secs)),
            Line::from(""),
            Line::from(state),
        ];

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Controls")
                .border_style(Style::new().fg(INFO_DIM)),
        );
        f.render_widget(paragraph, area);
    }
}
