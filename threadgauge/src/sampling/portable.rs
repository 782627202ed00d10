//! Memory readings through `sysinfo`, used where procfs is missing

use ::sysinfo::{get_current_pid, MemoryRefreshKind, ProcessRefreshKind, ProcessesToUpdate, System};

use super::{address_space_limit, MemoryStats};

/// Process and system memory without procfs.
///
/// `sysinfo` has no committed-data counter, so resident bytes stand in for it.
/// The thread count is not reported and reads as 0.
#[must_use]
pub fn read_memory() -> Option<MemoryStats> {
    let pid = get_current_pid().ok()?;
    let mut system = System::new();
    system.refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing().with_memory(),
    );

    let total = system.total_memory();
    if total == 0 {
        return None;
    }
    let process = system.process(pid)?;
    let resident = process.memory();
    let virtual_bytes = process.virtual_memory();

    let mut ceiling = total;
    let mut headroom = system.available_memory();
    if let Some(limit) = address_space_limit() {
        ceiling = ceiling.min(limit);
        headroom = headroom.min(limit.saturating_sub(virtual_bytes));
    }

    Some(MemoryStats {
        resident_bytes: resident,
        committed_bytes: resident,
        virtual_bytes,
        ceiling_bytes: ceiling,
        headroom_bytes: headroom,
        threads: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
    #[test]
    fn test_reads_live_process() {
        let stats = read_memory().expect("sysinfo supports this platform");
        assert!(stats.resident_bytes > 0);
        assert!(stats.ceiling_bytes > 0);
        assert_eq!(stats.committed_bytes, stats.resident_bytes);
    }
}
