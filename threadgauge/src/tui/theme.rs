//! TUI color theme
//!
//! HUD-inspired color scheme for the terminal interface

use ratatui::style::Color;

pub const HUD_GREEN: Color = Color::Rgb(0, 255, 0);
pub const CRITICAL_RED: Color = Color::Rgb(255, 0, 0);
pub const CAUTION_AMBER: Color = Color::Rgb(255, 191, 0);
pub const INFO_DIM: Color = Color::Rgb(0, 180, 0);

/// Usage above this is critical
pub const CRITICAL_PERCENT: f64 = 80.0;
/// Usage above this calls for caution
pub const CAUTION_PERCENT: f64 = 60.0;

/// Get severity color based on a usage percentage
/// - Above 80%: Critical (Red)
/// - Above 60%: Caution (Amber)
/// - Otherwise: Normal (Green)
#[must_use]
pub fn severity_color(percentage: f64) -> Color {
    if percentage > CRITICAL_PERCENT {
        CRITICAL_RED
    } else if percentage > CAUTION_PERCENT {
        CAUTION_AMBER
    } else {
        HUD_GREEN
    }
}

/// Text gauge like `[#####     ]` for narrow panels
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn gauge_bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), " ".repeat(width - filled.min(width)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(severity_color(10.0), HUD_GREEN);
        assert_eq!(severity_color(60.0), HUD_GREEN);
        assert_eq!(severity_color(60.5), CAUTION_AMBER);
        assert_eq!(severity_color(80.0), CAUTION_AMBER);
        assert_eq!(severity_color(95.0), CRITICAL_RED);
    }

    #[test]
    fn test_gauge_bar() {
        assert_eq!(gauge_bar(0.0, 4), "[    ]");
        assert_eq!(gauge_bar(50.0, 4), "[##  ]");
        assert_eq!(gauge_bar(150.0, 4), "[####]");
    }
}
