use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use threadgauge_common::ResourceSample;

use super::theme::{severity_color, HUD_GREEN, INFO_DIM};

/// Live memory, thread and CPU readout, refreshed by the shell's sampling tick
pub struct TelemetryPanel<'a> {
    sample: &'a ResourceSample,
}

impl<'a> TelemetryPanel<'a> {
    pub fn new(sample: &'a ResourceSample) -> Self {
        Self { sample }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn render(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Telemetry")
            .border_style(Style::new().fg(INFO_DIM));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Figures
                Constraint::Length(1), // Memory gauge
                Constraint::Length(1), // CPU gauge
                Constraint::Min(0),
            ])
            .split(inner);

        let s = self.sample;
        let figure = |label: &'static str, value: String| {
            Line::from(vec![
                Span::styled(format!(" {label:<10}"), Style::new().fg(INFO_DIM)),
                Span::styled(value, Style::new().fg(HUD_GREEN)),
            ])
        };
        let figures = vec![
            figure("Threads", s.active_thread_count.to_string()),
            figure("Used", format!("{} MB", s.used_heap_mb)),
            figure("Committed", format!("{} MB", s.committed_heap_mb)),
            figure("Ceiling", format!("{} MB", s.max_heap_mb)),
        ];
        f.render_widget(Paragraph::new(figures), rows[0]);

        let heap = s.heap_percent();
        let heap_gauge = Gauge::default()
            .gauge_style(Style::new().fg(severity_color(heap)).add_modifier(Modifier::BOLD))
            .percent(heap.round() as u16)
            .label(format!("Memory: {heap:.0}%"));
        f.render_widget(heap_gauge, rows[1]);

        if s.cpu_available() {
            let cpu = s.cpu_load_percent.clamp(0.0, 100.0);
            let cpu_gauge = Gauge::default()
                .gauge_style(Style::new().fg(severity_color(cpu)).add_modifier(Modifier::BOLD))
                .percent(cpu.round() as u16)
                .label(format!("CPU: {cpu:.0}%"));
            f.render_widget(cpu_gauge, rows[2]);
        } else {
            let na = Paragraph::new(Span::styled(" CPU: N/A", Style::new().fg(INFO_DIM)));
            f.render_widget(na, rows[2]);
        }
    }
}
