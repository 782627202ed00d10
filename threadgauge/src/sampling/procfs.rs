//! procfs readers
//!
//! Utilities for querying process and system counters from /proc. Parsing is
//! split from reading so the parsers can be tested against fixed text.

use anyhow::{Context, Result};
use std::fs;

/// Fields of `/proc/self/status` the sampler cares about (all sizes in KB)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcStatus {
    pub vm_rss_kb: u64,
    pub vm_data_kb: u64,
    pub vm_size_kb: u64,
    pub threads: u32,
}

/// Fields of `/proc/meminfo` (KB)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemInfo {
    pub total_kb: u64,
    pub available_kb: u64,
}

/// Aggregate jiffies from the `cpu` line of `/proc/stat`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub total: u64,
    pub idle: u64,
}

/// Read and parse `/proc/self/status`
///
/// # Errors
/// Returns an error if the file cannot be read (non-Linux, no /proc mounted)
pub fn read_self_status() -> Result<ProcStatus> {
    let content =
        fs::read_to_string("/proc/self/status").context("Failed to read /proc/self/status")?;
    Ok(parse_status(&content))
}

/// Read and parse `/proc/meminfo`
///
/// # Errors
/// Returns an error if the file cannot be read or has no `MemTotal` line
pub fn read_meminfo() -> Result<MemInfo> {
    let content = fs::read_to_string("/proc/meminfo").context("Failed to read /proc/meminfo")?;
    let info = parse_meminfo(&content);
    anyhow::ensure!(info.total_kb > 0, "MemTotal missing from /proc/meminfo");
    Ok(info)
}

/// Read the aggregate CPU counters from `/proc/stat`
///
/// # Errors
/// Returns an error if the file cannot be read or the `cpu` line is malformed
pub fn read_cpu_times() -> Result<CpuTimes> {
    let content = fs::read_to_string("/proc/stat").context("Failed to read /proc/stat")?;
    content
        .lines()
        .find_map(parse_cpu_line)
        .context("No aggregate cpu line in /proc/stat")
}

/// Parse the `key:   value kB` layout of `/proc/self/status`
#[must_use]
pub fn parse_status(content: &str) -> ProcStatus {
    let mut status = ProcStatus::default();
    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let value = first_number(rest);
        match key {
            "VmRSS" => status.vm_rss_kb = value,
            "VmData" => status.vm_data_kb = value,
            "VmSize" => status.vm_size_kb = value,
            "Threads" => status.threads = u32::try_from(value).unwrap_or(u32::MAX),
            _ => {}
        }
    }
    status
}

/// Parse `/proc/meminfo`. Kernels older than 3.14 lack `MemAvailable`; fall
/// back to `MemFree + Buffers + Cached` there.
#[must_use]
pub fn parse_meminfo(content: &str) -> MemInfo {
    let mut info = MemInfo::default();
    let mut available = None;
    let mut free_estimate = 0u64;

    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let value = first_number(rest);
        match key {
            "MemTotal" => info.total_kb = value,
            "MemAvailable" => available = Some(value),
            "MemFree" | "Buffers" | "Cached" => free_estimate += value,
            _ => {}
        }
    }

    info.available_kb = available.unwrap_or(free_estimate);
    info
}

/// Parse the aggregate `cpu  user nice system idle iowait irq softirq steal` line.
/// Per-core lines (`cpu0`, `cpu1`, ...) are rejected.
#[must_use]
pub fn parse_cpu_line(line: &str) -> Option<CpuTimes> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "cpu" {
        return None;
    }

    // guest and guest_nice are already folded into user/nice
    let nums: Vec<u64> = parts.take(8).filter_map(|v| v.parse().ok()).collect();
    if nums.len() < 4 {
        return None;
    }

    let total = nums.iter().sum();
    let idle = nums[3] + nums.get(4).copied().unwrap_or(0);
    Some(CpuTimes { total, idle })
}

fn first_number(text: &str) -> u64 {
    text.split_whitespace().next().and_then(|v| v.parse().ok()).unwrap_or(0)
}
