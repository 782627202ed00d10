//! Report export
//!
//! Renders run results, a live resource snapshot and system information into
//! text, CSV or JSON. The engine knows nothing about these formats; callers
//! assemble a [`Report`] from plain result records and pick a format.

pub mod csv;
pub mod json;
pub mod text;

pub use text::{load_summary, probe_summary};

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use threadgauge_common::{LoadResult, ProbeResult, ResourceSample};

use crate::domain::{GaugeError, GaugeResult};
use crate::sysinfo::SystemInfo;

/// Everything a report can contain
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: String,
    pub system: SystemInfo,
    pub snapshot: ResourceSample,
    pub probe: Option<ProbeResult>,
    pub stress: Option<LoadResult>,
    /// Timestamped log lines, oldest first
    pub log: Vec<String>,
}

impl Report {
    #[must_use]
    pub fn new(system: SystemInfo, snapshot: ResourceSample) -> Self {
        Self {
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            system,
            snapshot,
            probe: None,
            stress: None,
            log: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_probe(mut self, probe: Option<ProbeResult>) -> Self {
        self.probe = probe;
        self
    }

    #[must_use]
    pub fn with_stress(mut self, stress: Option<LoadResult>) -> Self {
        self.stress = stress;
        self
    }

    #[must_use]
    pub fn with_log(mut self, log: Vec<String>) -> Self {
        self.log = log;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Csv,
    Json,
}

impl ReportFormat {
    /// Pick a format from the file extension. A path without extension gets
    /// `.txt` appended.
    ///
    /// # Errors
    /// Returns [`GaugeError::UnsupportedFormat`] for any other extension
    pub fn for_path(path: &Path) -> GaugeResult<(Self, PathBuf)> {
        let ext = path.extension().map(|e| e.to_string_lossy().to_lowercase());
        match ext.as_deref() {
            None => Ok((Self::Text, path.with_extension("txt"))),
            Some("txt") => Ok((Self::Text, path.to_path_buf())),
            Some("csv") => Ok((Self::Csv, path.to_path_buf())),
            Some("json") => Ok((Self::Json, path.to_path_buf())),
            Some(other) => Err(GaugeError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Render `report` in `format` into `writer`
///
/// # Errors
/// Returns an error if writing or JSON serialization fails
pub fn write_report<W: Write>(report: &Report, format: ReportFormat, writer: W) -> GaugeResult<()> {
    match format {
        ReportFormat::Text => text::write_text(report, writer),
        ReportFormat::Csv => csv::write_csv(report, writer),
        ReportFormat::Json => json::write_json(report, writer),
    }
}

/// Render `report` to a string (clipboard, TUI preview)
///
/// # Errors
/// Returns an error if rendering fails
pub fn render_report(report: &Report, format: ReportFormat) -> GaugeResult<String> {
    let mut buffer = Vec::new();
    write_report(report, format, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| GaugeError::ExportFailed {
        path: "<memory>".to_string(),
        reason: e.to_string(),
    })
}

/// Write `report` to `path`, format chosen by extension. Returns the final path.
///
/// # Errors
/// Returns an error for unsupported extensions or when the file cannot be written
pub fn export_to_file(report: &Report, path: &Path) -> GaugeResult<PathBuf> {
    let (format, path) = ReportFormat::for_path(path)?;
    let wrap = |e: &dyn std::fmt::Display| GaugeError::ExportFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let file = File::create(&path).map_err(|e| wrap(&e))?;
    let mut writer = BufWriter::new(file);
    write_report(report, format, &mut writer)?;
    writer.flush().map_err(|e| wrap(&e))?;

    log::info!("report exported to {}", path.display());
    Ok(path)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_for_path() {
        let (format, path) = ReportFormat::for_path(Path::new("out/report")).unwrap();
        assert_eq!(format, ReportFormat::Text);
        assert_eq!(path, PathBuf::from("out/report.txt"));

        let (format, _) = ReportFormat::for_path(Path::new("r.CSV")).unwrap();
        assert_eq!(format, ReportFormat::Csv);
        let (format, _) = ReportFormat::for_path(Path::new("r.json")).unwrap();
        assert_eq!(format, ReportFormat::Json);

        let err = ReportFormat::for_path(Path::new("r.xlsx")).unwrap_err();
        assert!(matches!(err, GaugeError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn test_render_report() {
        let text = render_report(&fixtures::report(), ReportFormat::Text).unwrap();
        assert!(text.contains("4200"));
    }
}
