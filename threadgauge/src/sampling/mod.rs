//! # Resource Sampling
//!
//! Point-in-time readout of the current process: resident and committed
//! memory, the memory ceiling, the live thread count, and system CPU load.
//!
//! Every read is a single procfs file, syscall or `sysinfo` refresh, so a
//! sample completes in bounded time and can be taken from any thread without
//! coordination. Values
//! that the platform cannot report degrade to sentinels (`-1` for CPU load,
//! `0` for memory) instead of failing.
//!
//! ## Sub-Modules
//!
//! - `procfs` - parsers for `/proc/self/status`, `/proc/meminfo`, `/proc/stat`
//! - `cpu_load` - delta tracker turning cumulative jiffies into a percentage
//! - `memory` - compaction pass and rlimit queries
//! - `portable` - `sysinfo` readings for platforms without procfs

pub mod cpu_load;
pub mod memory;
pub mod portable;
pub mod procfs;

pub use cpu_load::CpuLoadTracker;
pub use memory::{address_space_limit, compact_heap, process_limit};

use threadgauge_common::ResourceSample;

const MB: u64 = 1024 * 1024;

/// Process memory counters in bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Resident set size
    pub resident_bytes: u64,
    /// Private data mappings (heap, thread stacks)
    pub committed_bytes: u64,
    pub virtual_bytes: u64,
    /// Physical memory, further capped by `RLIMIT_AS`
    pub ceiling_bytes: u64,
    /// Bytes that may still be committed before hitting the ceiling
    pub headroom_bytes: u64,
    pub threads: u32,
}

/// Samples resources of the current process.
///
/// The only state is the CPU tracker's previous reading; give each consumer
/// (telemetry view, load generator) its own sampler so their CPU intervals
/// do not interleave.
#[derive(Debug, Default)]
pub struct ResourceSampler {
    cpu: CpuLoadTracker,
}

impl ResourceSampler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Full snapshot for the telemetry and export collaborators
    pub fn sample(&self) -> ResourceSample {
        let memory = self.memory().unwrap_or_default();
        ResourceSample {
            used_heap_mb: memory.resident_bytes / MB,
            committed_heap_mb: memory.committed_bytes / MB,
            max_heap_mb: memory.ceiling_bytes / MB,
            active_thread_count: memory.threads,
            cpu_load_percent: self.cpu_load_percent(),
        }
    }

    /// Memory counters from procfs, else `sysinfo`; `None` when neither works
    #[must_use]
    pub fn memory(&self) -> Option<MemoryStats> {
        procfs_memory().or_else(portable::read_memory)
    }

    /// Bytes still available before the ceiling, `None` when unknown
    #[must_use]
    pub fn free_headroom_bytes(&self) -> Option<u64> {
        self.memory().map(|m| m.headroom_bytes)
    }

    /// Resident bytes of this process, 0 when unknown
    #[must_use]
    pub fn resident_bytes(&self) -> u64 {
        match procfs::read_self_status() {
            Ok(status) => status.vm_rss_kb * 1024,
            Err(_) => portable::read_memory().map_or(0, |m| m.resident_bytes),
        }
    }

    /// Live OS threads in this process, 0 when unknown
    #[must_use]
    pub fn active_threads(&self) -> u32 {
        procfs::read_self_status().map_or(0, |s| s.threads)
    }

    /// System CPU load in percent, `-1` when unavailable
    pub fn cpu_load_percent(&self) -> f64 {
        self.cpu.sample()
    }
}

fn procfs_memory() -> Option<MemoryStats> {
    let status = procfs::read_self_status().ok()?;
    let meminfo = procfs::read_meminfo().ok()?;
    Some(combine(status, meminfo, address_space_limit()))
}

/// Merge procfs readings and the address-space rlimit into [`MemoryStats`]
#[must_use]
pub fn combine(
    status: procfs::ProcStatus,
    meminfo: procfs::MemInfo,
    as_limit: Option<u64>,
) -> MemoryStats {
    let virtual_bytes = status.vm_size_kb * 1024;
    let mut ceiling = meminfo.total_kb * 1024;
    let mut headroom = meminfo.available_kb * 1024;

    if let Some(limit) = as_limit {
        ceiling = ceiling.min(limit);
        headroom = headroom.min(limit.saturating_sub(virtual_bytes));
    }

    MemoryStats {
        resident_bytes: status.vm_rss_kb * 1024,
        committed_bytes: status.vm_data_kb * 1024,
        virtual_bytes,
        ceiling_bytes: ceiling,
        headroom_bytes: headroom,
        threads: status.threads,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procfs::{MemInfo, ProcStatus};

    fn status() -> ProcStatus {
        ProcStatus { vm_rss_kb: 10_240, vm_data_kb: 51_200, vm_size_kb: 204_800, threads: 4 }
    }

    #[test]
    fn test_combine_without_rlimit() {
        let stats =
            combine(status(), MemInfo { total_kb: 8 * 1024 * 1024, available_kb: 1024 * 1024 }, None);
        assert_eq!(stats.resident_bytes, 10 * MB);
        assert_eq!(stats.committed_bytes, 50 * MB);
        assert_eq!(stats.ceiling_bytes, 8 * 1024 * MB);
        assert_eq!(stats.headroom_bytes, 1024 * MB);
        assert_eq!(stats.threads, 4);
    }

    #[test]
    fn test_combine_address_space_limit_caps_headroom() {
        // 256 MB address space with 200 MB already mapped leaves 56 MB
        let stats = combine(
            status(),
            MemInfo { total_kb: 8 * 1024 * 1024, available_kb: 4 * 1024 * 1024 },
            Some(256 * MB),
        );
        assert_eq!(stats.ceiling_bytes, 256 * MB);
        assert_eq!(stats.headroom_bytes, 56 * MB);
    }

    #[test]
    fn test_combine_exhausted_address_space() {
        let stats = combine(status(), MemInfo { total_kb: 1024, available_kb: 1024 }, Some(MB));
        assert_eq!(stats.headroom_bytes, 0);
    }

    #[test]
    fn test_sample_live_process() {
        let sampler = ResourceSampler::new();
        let sample = sampler.sample();

        #[cfg(target_os = "linux")]
        assert!(sample.active_thread_count >= 1);
        #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
        {
            assert!(sample.max_heap_mb > 0);
            assert!(sample.used_heap_mb <= sample.max_heap_mb);
            assert!(sampler.resident_bytes() > 0);
            assert!(sampler.free_headroom_bytes().is_some());
        }

        // First CPU reading only primes the tracker
        assert!(sample.cpu_load_percent < 0.0);
    }
}
