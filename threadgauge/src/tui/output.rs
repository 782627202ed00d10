//! Output log panel
//!
//! Every line is stamped with local wall-clock time on arrival. The log is
//! bounded; the oldest lines are dropped first.

use chrono::Local;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::collections::VecDeque;

use super::theme::{CAUTION_AMBER, CRITICAL_RED, HUD_GREEN, INFO_DIM};

const MAX_LINES: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    fn prefix(self) -> &'static str {
        match self {
            Self::Info => "",
            Self::Success => "SUCCESS: ",
            Self::Warning => "WARNING: ",
            Self::Error => "ERROR: ",
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    level: Level,
    text: String,
}

#[derive(Debug, Default)]
pub struct OutputLog {
    entries: VecDeque<Entry>,
}

impl OutputLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: Level, message: &str) {
        let stamp = Local::now().format("%H:%M:%S");
        for (i, part) in message.lines().enumerate() {
            let text = if i == 0 {
                format!("[{stamp}] {}{part}", level.prefix())
            } else {
                format!("           {part}")
            };
            if self.entries.len() == MAX_LINES {
                self.entries.pop_front();
            }
            self.entries.push_back(Entry { level, text });
        }
    }

    pub fn info(&mut self, message: &str) {
        self.push(Level::Info, message);
    }

    pub fn success(&mut self, message: &str) {
        self.push(Level::Success, message);
    }

    pub fn warning(&mut self, message: &str) {
        self.push(Level::Warning, message);
    }

    pub fn error(&mut self, message: &str) {
        self.push(Level::Error, message);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.info("Log cleared.");
    }

    /// Stamped lines, oldest first
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.text.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the newest lines that fit, following the tail
    pub fn render(&self, f: &mut Frame, area: Rect) {
        let visible = usize::from(area.height.saturating_sub(2));
        let skip = self.entries.len().saturating_sub(visible);
        let lines: Vec<Line> = self
            .entries
            .iter()
            .skip(skip)
            .map(|e| {
                let color = match e.level {
                    Level::Info | Level::Success => HUD_GREEN,
                    Level::Warning => CAUTION_AMBER,
                    Level::Error => CRITICAL_RED,
                };
                Line::from(Span::styled(e.text.clone(), Style::new().fg(color)))
            })
            .collect();

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Output")
                .border_style(Style::new().fg(INFO_DIM)),
        );
        f.render_widget(paragraph, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_are_stamped_and_prefixed() {
        let mut log = OutputLog::new();
        log.info("Starting");
        log.error("boom");

        let lines = log.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] Starting"));
        assert!(lines[1].contains("ERROR: boom"));
    }

    #[test]
    fn test_multiline_messages_are_indented() {
        let mut log = OutputLog::new();
        log.success("Max threads reached: 10\nReason: safety cap reached");
        let lines = log.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("           Reason"));
    }

    #[test]
    fn test_bounded_and_clear() {
        let mut log = OutputLog::new();
        for i in 0..MAX_LINES + 5 {
            log.info(&i.to_string());
        }
        assert_eq!(log.len(), MAX_LINES);
        assert!(log.lines()[0].ends_with("] 5"));

        log.clear();
        assert_eq!(log.len(), 1);
        assert!(log.lines()[0].ends_with("Log cleared."));
    }
}
