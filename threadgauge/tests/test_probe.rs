use std::thread;
use std::time::{Duration, Instant};

use threadgauge::domain::Platform;
use threadgauge::engine::{CancelToken, StackQuirk, StackSizePolicy, Task, ThreadCapacityProbe};
use threadgauge_common::{ProbeConfig, ProbeLimits, ProbeNote, StopReason};

fn quick_config(stack_size_kb: u32, safety_cap: u32) -> ProbeConfig {
    ProbeConfig {
        stack_size_kb,
        limits: ProbeLimits {
            batch_size: 50,
            safety_cap,
            min_free_heap_mb: 0,
            progress_every: 100,
            batch_pause: Duration::from_millis(1),
            settle_delay: Duration::from_millis(10),
            ..ProbeLimits::default()
        },
    }
}

#[test]
fn test_probe_stops_at_safety_cap() {
    let probe = ThreadCapacityProbe::new(quick_config(256, 300)).expect("valid config");
    let mut lines = Vec::new();
    let result = probe.run(&CancelToken::new(), |line| lines.push(line));

    assert_eq!(result.stop_reason, StopReason::SafetyCap);
    assert_eq!(result.max_threads, 300);
    assert_eq!(result.stack_size_kb, 256);
    assert!(result.memory_per_thread_kb >= 0);
    assert_eq!(result.threads_reaped + result.threads_abandoned, 300);

    assert_eq!(lines[0], "Starting max thread test with stack size: 256 KB");
    assert!(lines.contains(&"Created 100 threads so far...".to_string()));
    assert!(lines.contains(&"Created 300 threads so far...".to_string()));
    assert!(lines.iter().any(|l| l.starts_with("Cleaning up 300 threads")));
}

#[test]
fn test_probe_threads_are_reaped() {
    let probe = ThreadCapacityProbe::new(quick_config(0, 200)).expect("valid config");
    let result = probe.run(&CancelToken::new(), |_| {});
    assert_eq!(result.threads_abandoned, 0);
    assert_eq!(result.threads_reaped, 200);
    assert!(result.note().is_none());
}

#[test]
fn test_background_probe_cancelled_promptly() {
    let probe = ThreadCapacityProbe::new(quick_config(0, 1_000_000)).expect("valid config");
    let task = Task::spawn_probe(probe).expect("runner thread");

    thread::sleep(Duration::from_millis(100));
    let cancelled_at = Instant::now();
    task.cancel();

    let mut progress = 0;
    let result = task.wait(|_| progress += 1).expect("probe result");

    assert_eq!(result.stop_reason, StopReason::Cancelled);
    assert!(progress >= 1);
    assert!(cancelled_at.elapsed() < Duration::from_secs(15));
    assert_eq!(result.threads_abandoned, 0);
    assert_eq!(result.threads_reaped, result.max_threads);
}

#[cfg(all(target_os = "linux", target_pointer_width = "64"))]
#[test]
fn test_unspawnable_stack_stops_on_first_failure() {
    let probe = ThreadCapacityProbe::new(quick_config(u32::MAX, 1_000)).expect("valid config");
    let mut lines = Vec::new();
    let result = probe.run(&CancelToken::new(), |line| lines.push(line));

    assert_eq!(result.stop_reason, StopReason::CreationFailure);
    assert_eq!(result.max_threads, 0);
    assert_eq!(result.threads_reaped, 0);
    assert_eq!(result.memory_per_thread_kb, 0);
    assert!(result
        .notes
        .iter()
        .any(|note| matches!(note, ProbeNote::CreationError { .. })));
}

#[test]
fn test_stack_quirk_recorded_as_note() {
    let policy = StackSizePolicy::with_quirks(vec![StackQuirk {
        platform: Platform::Linux,
        requested_kb: 640,
    }]);
    let probe = ThreadCapacityProbe::new(quick_config(640, 50))
        .expect("valid config")
        .with_policy(policy)
        .with_platform(Platform::Linux);
    let result = probe.run(&CancelToken::new(), |_| {});

    assert_eq!(result.stop_reason, StopReason::SafetyCap);
    assert!(result.stack_size_overridden());
    assert_eq!(result.stack_size_kb, 640);
}

#[test]
fn test_zero_safety_cap_rejected() {
    let err = ThreadCapacityProbe::new(quick_config(0, 0)).unwrap_err();
    assert!(err.is_config());
}
