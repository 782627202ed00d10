//! Allocator and rlimit hooks
//!
//! There is no garbage collector to force, so the closest equivalent to a
//! compaction pass is asking glibc to hand freed arenas back to the kernel.

#![allow(unsafe_code)] // malloc_trim() and getrlimit() require unsafe

/// Best-effort compaction pass before a memory measurement.
#[cfg(all(target_os = "linux", target_env = "gnu"))]
pub fn compact_heap() {
    // SAFETY: malloc_trim only walks allocator-owned arenas and has no preconditions
    unsafe {
        libc::malloc_trim(0);
    }
}

/// No-op outside glibc
#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
pub fn compact_heap() {}

/// Soft `RLIMIT_AS` in bytes, `None` when unlimited or unknown
#[must_use]
pub fn address_space_limit() -> Option<u64> {
    rlimit_soft(RlimitKind::AddressSpace)
}

/// Soft `RLIMIT_NPROC` (threads count against it on Linux), `None` when unlimited
#[must_use]
pub fn process_limit() -> Option<u64> {
    rlimit_soft(RlimitKind::Processes)
}

#[derive(Clone, Copy)]
enum RlimitKind {
    AddressSpace,
    Processes,
}

#[cfg(unix)]
fn rlimit_soft(kind: RlimitKind) -> Option<u64> {
    let resource = match kind {
        RlimitKind::AddressSpace => libc::RLIMIT_AS,
        RlimitKind::Processes => libc::RLIMIT_NPROC,
    };
    let mut limit = libc::rlimit { rlim_cur: 0, rlim_max: 0 };
    // SAFETY: `limit` is a valid, writable rlimit struct for the duration of the call
    let rc = unsafe { libc::getrlimit(resource, &mut limit) };
    if rc != 0 || limit.rlim_cur == libc::RLIM_INFINITY {
        return None;
    }
    #[allow(clippy::useless_conversion)]
    Some(u64::from(limit.rlim_cur))
}

#[cfg(not(unix))]
fn rlimit_soft(_kind: RlimitKind) -> Option<u64> {
    None
}
