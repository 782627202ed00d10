//! # Shared Data Contract (Engine ↔ Collaborators)
//!
//! Plain configuration, result and sample records exchanged between the
//! thread-capacity engine and everything that consumes it: the terminal shell,
//! the headless CLI, the report exporters and tests. Nothing in here spawns a
//! thread or touches the OS.
//!
//! ## Key Types
//!
//! - [`ProbeConfig`] / [`ProbeResult`] - capacity probe input and outcome
//! - [`StopReason`] / [`ProbeNote`] - the single terminal cause plus informational notes
//! - [`LoadConfig`] / [`LoadResult`] - load generator input and outcome
//! - [`ResourceSample`] - point-in-time resource readout
//!
//! Enable the `serde` feature to derive `Serialize`/`Deserialize` on every record.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Defaults
// ============================================================================

/// Explicit stack size offered by the shell when nothing else is chosen
pub const DEFAULT_STACK_SIZE_KB: u32 = 512;

/// Threads created between two headroom checks
pub const DEFAULT_BATCH_SIZE: u32 = 100;

/// Hard upper bound on threads created by one probe run
pub const DEFAULT_SAFETY_CAP: u32 = 50_000;

/// Probe stops once free memory headroom drops below this
pub const DEFAULT_MIN_FREE_HEAP_MB: u64 = 50;

/// A progress line is emitted every this many created threads
pub const DEFAULT_PROGRESS_EVERY: u32 = 500;

pub const DEFAULT_STRESS_THREADS: u32 = 100;
pub const DEFAULT_STRESS_DURATION_SECS: u32 = 10;

/// Sentinel for "the platform could not report CPU load"
pub const CPU_LOAD_UNAVAILABLE: f64 = -1.0;

// ============================================================================
// Probe
// ============================================================================

/// Tunables of a probe run.
///
/// The defaults are the production values. Tests shrink the safety cap and
/// budgets so a run completes in well under a second.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProbeLimits {
    pub batch_size: u32,
    pub safety_cap: u32,
    pub min_free_heap_mb: u64,
    pub progress_every: u32,
    /// Pause between two batches
    pub batch_pause: Duration,
    /// Per-thread join timeout during cleanup
    pub join_timeout: Duration,
    /// Total time allowed to reap every thread of the run
    pub cleanup_budget: Duration,
    /// Pause after a compaction pass before memory is measured
    pub settle_delay: Duration,
}

impl Default for ProbeLimits {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            safety_cap: DEFAULT_SAFETY_CAP,
            min_free_heap_mb: DEFAULT_MIN_FREE_HEAP_MB,
            progress_every: DEFAULT_PROGRESS_EVERY,
            batch_pause: Duration::from_millis(10),
            join_timeout: Duration::from_millis(200),
            cleanup_budget: Duration::from_secs(10),
            settle_delay: Duration::from_millis(100),
        }
    }
}

/// Input of a capacity probe. Immutable once the run starts.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProbeConfig {
    /// Explicit per-thread stack size in KB (0 = platform default)
    pub stack_size_kb: u32,
    pub limits: ProbeLimits,
}

impl ProbeConfig {
    #[must_use]
    pub fn with_stack_size(stack_size_kb: u32) -> Self {
        Self { stack_size_kb, ..Self::default() }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { stack_size_kb: DEFAULT_STACK_SIZE_KB, limits: ProbeLimits::default() }
    }
}

/// The single terminal cause of a probe run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StopReason {
    /// Free memory headroom fell below the configured minimum
    LowHeap,
    /// The safety cap on created threads was reached
    SafetyCap,
    /// The OS refused to create another thread
    CreationFailure,
    /// The caller requested cancellation
    Cancelled,
}

impl StopReason {
    /// Short machine-friendly label, used in CSV reports
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::LowHeap => "low_heap",
            Self::SafetyCap => "safety_cap",
            Self::CreationFailure => "creation_failure",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::LowHeap => "low memory headroom",
            Self::SafetyCap => "safety cap reached",
            Self::CreationFailure => "thread creation failed",
            Self::Cancelled => "cancelled by user",
        };
        f.write_str(text)
    }
}

/// Informational detail attached to a probe result. Never a stop reason.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProbeNote {
    /// The requested stack size is unstable on this platform; the default was used
    StackSizeOverridden { requested_kb: u32 },
    /// Cleanup budget ran out with threads still alive
    CleanupTimeout { abandoned: u32 },
    /// OS error text of the failed spawn
    CreationError { message: String },
}

impl fmt::Display for ProbeNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackSizeOverridden { requested_kb } => {
                write!(f, "stack size {requested_kb} KB overridden with platform default")
            }
            Self::CleanupTimeout { abandoned } => {
                write!(f, "cleanup budget exhausted, {abandoned} idle threads abandoned")
            }
            Self::CreationError { message } => write!(f, "spawn error: {message}"),
        }
    }
}

/// Outcome of a capacity probe. Produced exactly once per run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProbeResult {
    pub max_threads: u32,
    /// Stack size as requested by the config
    pub stack_size_kb: u32,
    /// Approximate resident memory per live thread (order of magnitude only)
    pub memory_per_thread_kb: i64,
    pub stop_reason: StopReason,
    pub notes: Vec<ProbeNote>,
    pub elapsed_secs: f64,
    pub memory_before_mb: u64,
    pub memory_after_mb: u64,
    pub threads_reaped: u32,
    pub threads_abandoned: u32,
}

impl ProbeResult {
    /// Notes joined into one line, `None` when there are none
    #[must_use]
    pub fn note(&self) -> Option<String> {
        if self.notes.is_empty() {
            return None;
        }
        let parts: Vec<String> = self.notes.iter().map(ToString::to_string).collect();
        Some(parts.join("; "))
    }

    #[must_use]
    pub fn stack_size_overridden(&self) -> bool {
        self.notes.iter().any(|n| matches!(n, ProbeNote::StackSizeOverridden { .. }))
    }
}

// ============================================================================
// Load generator
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoadLimits {
    /// CPU sampling period of the monitor loop
    pub sample_interval: Duration,
    /// Sleep between two units of busy work inside a worker
    pub work_pause: Duration,
    /// Size of one unit of busy work
    pub work_iterations: u32,
    pub join_timeout: Duration,
    pub cleanup_budget: Duration,
}

impl Default for LoadLimits {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_millis(500),
            work_pause: Duration::from_millis(10),
            work_iterations: 1000,
            join_timeout: Duration::from_millis(100),
            cleanup_budget: Duration::from_secs(5),
        }
    }
}

/// Input of a load generator run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoadConfig {
    pub thread_count: u32,
    pub duration_secs: u32,
    pub limits: LoadLimits,
}

impl LoadConfig {
    #[must_use]
    pub fn new(thread_count: u32, duration_secs: u32) -> Self {
        Self { thread_count, duration_secs, limits: LoadLimits::default() }
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STRESS_THREADS, DEFAULT_STRESS_DURATION_SECS)
    }
}

/// Outcome of a load generator run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoadResult {
    pub thread_count: u32,
    pub threads_started: u32,
    pub planned_duration_secs: u32,
    /// Measured wall-clock time, not the planned duration
    pub actual_duration_secs: f64,
    /// Mean of the retained CPU samples, 0 when none were collected
    pub average_cpu_load_percent: f64,
    pub peak_cpu_load_percent: f64,
    pub cpu_samples: u32,
    pub cancelled: bool,
    pub threads_abandoned: u32,
}

// ============================================================================
// Telemetry
// ============================================================================

/// Point-in-time resource readout of the current process.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResourceSample {
    /// Resident memory in use
    pub used_heap_mb: u64,
    /// Private data mappings, thread stacks included
    pub committed_heap_mb: u64,
    /// Memory ceiling of the process
    pub max_heap_mb: u64,
    pub active_thread_count: u32,
    /// System-wide CPU load, [`CPU_LOAD_UNAVAILABLE`] when unknown
    pub cpu_load_percent: f64,
}

impl ResourceSample {
    #[must_use]
    pub fn cpu_available(&self) -> bool {
        self.cpu_load_percent >= 0.0
    }

    /// Used memory as a percentage of the ceiling, 0 when the ceiling is unknown
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn heap_percent(&self) -> f64 {
        if self.max_heap_mb == 0 {
            return 0.0;
        }
        (self.used_heap_mb as f64 / self.max_heap_mb as f64 * 100.0).min(100.0)
    }
}

impl Default for ResourceSample {
    fn default() -> Self {
        Self {
            used_heap_mb: 0,
            committed_heap_mb: 0,
            max_heap_mb: 0,
            active_thread_count: 0,
            cpu_load_percent: CPU_LOAD_UNAVAILABLE,
        }
    }
}
