//! Static system information readout
//!
//! OS, kernel, CPU and memory facts plus the thread-related limits that bound
//! what a probe can reach. Gathered once per report; every field degrades to
//! `None` when the platform does not expose it.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;

use crate::sampling::{address_space_limit, process_limit, procfs};

/// Thread stack size Rust uses when none is requested
const RUST_DEFAULT_STACK_KB: u64 = 2 * 1024;

#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub os: String,
    pub kernel_release: Option<String>,
    pub arch: String,
    pub family: String,
    pub available_parallelism: usize,
    pub online_cpus: Option<usize>,
    pub total_memory_mb: Option<u64>,
    pub available_memory_mb: Option<u64>,
    /// System-wide thread limit (`/proc/sys/kernel/threads-max`)
    pub threads_max: Option<u64>,
    /// Soft `RLIMIT_NPROC`, which Linux applies to threads as well
    pub nproc_limit: Option<u64>,
    pub address_space_limit_mb: Option<u64>,
    pub default_stack_kb: u64,
    pub tool_version: String,
}

impl SystemInfo {
    /// Collect everything that can be read without privileges
    #[must_use]
    pub fn collect() -> Self {
        let meminfo = procfs::read_meminfo().ok();
        Self {
            os: std::env::consts::OS.to_string(),
            kernel_release: kernel_release().ok(),
            arch: std::env::consts::ARCH.to_string(),
            family: std::env::consts::FAMILY.to_string(),
            available_parallelism: std::thread::available_parallelism().map_or(1, usize::from),
            online_cpus: online_cpus().ok().map(|cpus| cpus.len()),
            total_memory_mb: meminfo.map(|m| m.total_kb / 1024),
            available_memory_mb: meminfo.map(|m| m.available_kb / 1024),
            threads_max: read_u64("/proc/sys/kernel/threads-max").ok(),
            nproc_limit: process_limit(),
            address_space_limit_mb: address_space_limit().map(|b| b / (1024 * 1024)),
            default_stack_kb: default_stack_kb(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// `(label, value)` rows shared by the text and CSV reports and the TUI
    #[must_use]
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let opt = |v: Option<u64>, unit: &str| {
            v.map_or_else(|| "unknown".to_string(), |n| format!("{n}{unit}"))
        };
        vec![
            ("Operating System", format!("{} ({})", self.os, self.family)),
            (
                "Kernel",
                self.kernel_release.clone().unwrap_or_else(|| "unknown".to_string()),
            ),
            ("Architecture", self.arch.clone()),
            ("Available Processors", self.available_parallelism.to_string()),
            (
                "Online CPUs",
                self.online_cpus.map_or_else(|| "unknown".to_string(), |n| n.to_string()),
            ),
            ("Total Memory", opt(self.total_memory_mb, " MB")),
            ("Available Memory", opt(self.available_memory_mb, " MB")),
            ("Threads Max", opt(self.threads_max, "")),
            ("Process Limit", opt(self.nproc_limit, "")),
            ("Address Space Limit", opt(self.address_space_limit_mb, " MB")),
            ("Default Stack", format!("{} KB", self.default_stack_kb)),
            ("threadgauge", self.tool_version.clone()),
        ]
    }
}

/// Stack size of threads spawned without an explicit size, honoring
/// `RUST_MIN_STACK` the same way `std` does
#[must_use]
pub fn default_stack_kb() -> u64 {
    std::env::var("RUST_MIN_STACK")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(RUST_DEFAULT_STACK_KB, |bytes| bytes / 1024)
}

/// Kernel release from /proc/version ("Linux version 6.1.0-arch1-1 ...")
///
/// # Errors
/// Returns an error if /proc/version cannot be read or is malformed
pub fn kernel_release() -> Result<String> {
    let version_str = fs::read_to_string("/proc/version")
        .context("Failed to read kernel version from /proc/version")?;
    parse_kernel_release(&version_str).context("Unexpected /proc/version format")
}

fn parse_kernel_release(version_str: &str) -> Option<String> {
    version_str.split_whitespace().nth(2).map(str::to_string)
}

/// Get list of online CPU IDs from /sys/devices/system/cpu/online
///
/// Returns a vector of CPU IDs (e.g., [0, 1, 2, 3] for a 4-core system).
///
/// # Errors
/// Returns an error if the file is missing or malformed
pub fn online_cpus() -> Result<Vec<u32>> {
    let content = fs::read_to_string("/sys/devices/system/cpu/online")
        .context("Failed to read /sys/devices/system/cpu/online")?;
    parse_cpu_list(&content)
}

/// Parse the kernel CPU list format: "0-3" or "0-3,8-11" for NUMA systems
///
/// # Errors
/// Returns an error on a non-numeric entry
pub fn parse_cpu_list(content: &str) -> Result<Vec<u32>> {
    let mut cpus = Vec::new();

    for range in content.trim().split(',').filter(|r| !r.is_empty()) {
        if let Some((start, end)) = range.split_once('-') {
            let start: u32 = start.parse()?;
            let end: u32 = end.parse()?;
            cpus.extend(start..=end);
        } else {
            cpus.push(range.parse()?);
        }
    }

    Ok(cpus)
}

fn read_u64(path: &str) -> Result<u64> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    content.trim().parse().with_context(|| format!("Unexpected content in {path}"))
}
