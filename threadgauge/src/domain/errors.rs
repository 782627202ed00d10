//! Structured error types for threadgauge
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! Resource exhaustion, safety caps and cancellation are *not* errors: they end
//! up in a result's stop reason. Only configuration problems and collaborator
//! failures (export, terminal, clipboard) surface here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GaugeError {
    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Failed to export report to {path}: {reason}")]
    ExportFailed { path: String, reason: String },

    #[error("Unsupported export format: {0} (expected .txt, .csv or .json)")]
    UnsupportedFormat(String),

    #[error("Background {0} stopped without a result")]
    RunAborted(String),

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl GaugeError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig { field, reason: reason.into() }
    }

    /// Whether this is a configuration rejection (usage error for the CLI)
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }
}

pub type GaugeResult<T> = Result<T, GaugeError>;
