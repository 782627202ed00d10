//! # Load Generator
//!
//! Keeps a fixed population of worker threads busy with small CPU-bound work
//! units for a fixed wall-clock duration, sampling system CPU load every
//! sampling interval. Workers sleep briefly between units so the monitor loop
//! and the cancellation checkpoint are never starved.

use log::{info, warn};
use std::hint::black_box;
use std::thread;
use std::time::{Duration, Instant};

use threadgauge_common::{LoadConfig, LoadResult};

use super::cancel::CancelToken;
use super::pool::ThreadPool;
use super::progress::Progress;
use super::thread_handle::StopSignal;
use crate::domain::{GaugeError, GaugeResult, StackSizeKb};
use crate::sampling::ResourceSampler;

/// Fixed-population stress run
#[derive(Debug, Clone)]
pub struct LoadGenerator {
    config: LoadConfig,
}

impl LoadGenerator {
    /// Validate `config`. Rejected configs never create a thread.
    ///
    /// # Errors
    /// Returns [`GaugeError::InvalidConfig`] for a zero thread count, zero
    /// duration or zero sampling interval
    pub fn new(config: LoadConfig) -> GaugeResult<Self> {
        if config.thread_count == 0 {
            return Err(GaugeError::invalid("thread_count", "must be greater than 0"));
        }
        if config.duration_secs == 0 {
            return Err(GaugeError::invalid("duration_secs", "must be greater than 0"));
        }
        if config.limits.sample_interval.is_zero() {
            return Err(GaugeError::invalid("sample_interval", "must be greater than 0"));
        }
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// Run the stress test to completion on the calling thread
    pub fn run(&self, cancel: &CancelToken, on_progress: impl FnMut(String)) -> LoadResult {
        let mut progress = Progress::new(on_progress);
        let config = self.config;
        let limits = config.limits;

        progress.emit(format!(
            "Starting stress test with {} threads for {} seconds",
            config.thread_count, config.duration_secs
        ));

        let sampler = ResourceSampler::new();
        // Prime the CPU tracker so the first sample covers a real interval
        sampler.cpu_load_percent();

        let started = Instant::now();
        let capacity = usize::try_from(config.thread_count).unwrap_or(0);
        let mut pool = ThreadPool::with_capacity("stress", capacity);
        let mut threads_started: u32 = 0;

        for _ in 0..config.thread_count {
            let iterations = limits.work_iterations;
            let pause = limits.work_pause;
            match pool.spawn(StackSizeKb::PLATFORM_DEFAULT, move |stop| {
                busy_work(stop, iterations, pause);
            }) {
                Ok(()) => threads_started += 1,
                Err(e) => warn!("stress worker {threads_started} failed to start: {e}"),
            }
        }

        if threads_started < config.thread_count {
            progress.emit(format!(
                "Only {threads_started} of {} threads could be started",
                config.thread_count
            ));
        }
        progress.emit(format!("All {threads_started} threads started. Monitoring..."));

        let deadline = started + Duration::from_secs(u64::from(config.duration_secs));
        let mut samples: Vec<f64> = Vec::new();
        let mut last_reported: Option<u64> = None;
        let mut cancelled = false;

        loop {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }

            let load = sampler.cpu_load_percent();
            if load >= 0.0 {
                samples.push(load);
            }

            let remaining = deadline.saturating_duration_since(now).as_secs();
            if remaining > 0 && remaining % 2 == 0 && last_reported != Some(remaining) {
                progress.emit(format!("Test running... {remaining} seconds remaining"));
                last_reported = Some(remaining);
            }

            let until_deadline = deadline.saturating_duration_since(Instant::now());
            thread::sleep(limits.sample_interval.min(until_deadline));
        }

        let actual = started.elapsed();

        progress.emit("Stopping threads...");
        let cleanup = pool.shutdown(limits.join_timeout, limits.cleanup_budget);

        let stats = CpuStats::from_samples(&samples);
        let result = LoadResult {
            thread_count: config.thread_count,
            threads_started,
            planned_duration_secs: config.duration_secs,
            actual_duration_secs: actual.as_secs_f64(),
            average_cpu_load_percent: stats.average,
            peak_cpu_load_percent: stats.peak,
            cpu_samples: stats.count,
            cancelled,
            threads_abandoned: cleanup.abandoned,
        };

        info!(
            "stress test {}: {} threads, {:.1}s / {}s, avg CPU {:.1}%",
            if cancelled { "cancelled" } else { "completed" },
            result.threads_started,
            result.actual_duration_secs,
            result.planned_duration_secs,
            result.average_cpu_load_percent
        );
        result
    }
}

/// Worker body: one fixed-cost unit of floating point work, a short sleep,
/// repeat until stopped
fn busy_work(stop: &StopSignal, iterations: u32, pause: Duration) {
    while !stop.is_raised() {
        let mut acc = 0.0_f64;
        for j in 0..iterations {
            let x = f64::from(j);
            acc += x.sqrt() * x.sin();
        }
        black_box(acc);
        thread::sleep(pause);
    }
}

/// Aggregate of the retained CPU samples
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuStats {
    pub average: f64,
    pub peak: f64,
    pub count: u32,
}

impl CpuStats {
    /// Mean and peak of the samples, all zero when there are none
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let sum: f64 = samples.iter().sum();
        Self {
            average: sum / samples.len() as f64,
            peak: samples.iter().copied().fold(0.0, f64::max),
            count: u32::try_from(samples.len()).unwrap_or(u32::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_threads() {
        let err = LoadGenerator::new(LoadConfig::new(0, 5)).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("thread_count"));
    }

    #[test]
    fn test_rejects_zero_duration() {
        let err = LoadGenerator::new(LoadConfig::new(4, 0)).unwrap_err();
        assert!(err.to_string().contains("duration_secs"));
    }

    #[test]
    fn test_cpu_stats() {
        assert_eq!(CpuStats::from_samples(&[]), CpuStats::default());

        let stats = CpuStats::from_samples(&[10.0, 20.0, 60.0]);
        assert!((stats.average - 30.0).abs() < 1e-9);
        assert!((stats.peak - 60.0).abs() < 1e-9);
        assert_eq!(stats.count, 3);
    }

    #[test]
    fn test_busy_work_exits_on_stop() {
        let stop = StopSignal::new();
        stop.raise();
        // Returns immediately without doing a unit of work
        busy_work(&stop, 1_000_000, Duration::from_secs(10));
    }

    #[test]
    fn test_short_run_completes() {
        let generator = LoadGenerator::new(LoadConfig::new(4, 1)).unwrap();
        let mut lines = Vec::new();
        let result = generator.run(&CancelToken::new(), |m| lines.push(m));

        assert!(!result.cancelled);
        assert_eq!(result.thread_count, 4);
        assert_eq!(result.threads_started, 4);
        assert_eq!(result.threads_abandoned, 0);
        assert!(result.actual_duration_secs >= 0.9);
        assert!(result.average_cpu_load_percent >= 0.0);
        assert_eq!(lines.last().map(String::as_str), Some("Stopping threads..."));
    }
}
