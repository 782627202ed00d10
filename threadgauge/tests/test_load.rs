use std::time::Duration;

use threadgauge::engine::{LoadGenerator, RunEvent, Task};
use threadgauge_common::LoadConfig;

#[test]
fn test_stress_runs_for_planned_duration() {
    let generator = LoadGenerator::new(LoadConfig::new(10, 2)).expect("valid config");
    let task = Task::spawn_load(generator).expect("runner thread");

    let mut lines = Vec::new();
    let result = task.wait(|line| lines.push(line)).expect("stress result");

    assert!(!result.cancelled);
    assert_eq!(result.thread_count, 10);
    assert_eq!(result.threads_started, 10);
    assert_eq!(result.planned_duration_secs, 2);
    assert!(
        (1.8..=3.0).contains(&result.actual_duration_secs),
        "actual duration {}",
        result.actual_duration_secs
    );
    assert!(result.average_cpu_load_percent >= 0.0);
    assert!(result.peak_cpu_load_percent >= result.average_cpu_load_percent);

    assert_eq!(lines[0], "Starting stress test with 10 threads for 2 seconds");
    assert!(lines.contains(&"All 10 threads started. Monitoring...".to_string()));
    assert_eq!(lines.last().map(String::as_str), Some("Stopping threads..."));
}

#[test]
fn test_result_is_last_event() {
    let generator = LoadGenerator::new(LoadConfig::new(10, 1)).expect("valid config");
    let task = Task::spawn_load(generator).expect("runner thread");

    let mut saw_result = false;
    while let Ok(event) = task.events().recv_timeout(Duration::from_secs(10)) {
        match event {
            RunEvent::Progress(_) => assert!(!saw_result, "progress after result"),
            RunEvent::Finished(_) => {
                saw_result = true;
                break;
            }
        }
    }
    assert!(saw_result);
}

#[test]
fn test_zero_threads_rejected_before_any_work() {
    let err = LoadGenerator::new(LoadConfig::new(0, 5)).unwrap_err();
    assert!(err.is_config());
    assert!(err.to_string().contains("thread_count"));
}

#[test]
fn test_cancelled_stress_reports_partial_run() {
    let generator = LoadGenerator::new(LoadConfig::new(10, 60)).expect("valid config");
    let task = Task::spawn_load(generator).expect("runner thread");
    std::thread::sleep(Duration::from_millis(700));
    task.cancel();

    let result = task.wait(|_| {}).expect("stress result");
    assert!(result.cancelled);
    assert!(result.actual_duration_secs < 10.0);
    assert_eq!(result.threads_abandoned, 0);
}
