use std::fs;

use threadgauge::domain::GaugeError;
use threadgauge::engine::{CancelToken, LoadGenerator};
use threadgauge::export::{export_to_file, Report};
use threadgauge::sampling::ResourceSampler;
use threadgauge::sysinfo::SystemInfo;
use threadgauge_common::LoadConfig;

fn stress_report() -> Report {
    let generator = LoadGenerator::new(LoadConfig::new(10, 1)).expect("valid config");
    let mut log = Vec::new();
    let result = generator.run(&CancelToken::new(), |line| log.push(line));
    Report::new(SystemInfo::collect(), ResourceSampler::new().sample())
        .with_stress(Some(result))
        .with_log(log)
}

#[test]
fn test_export_json_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("stress.json");
    let saved = export_to_file(&stress_report(), &path).expect("export");
    assert_eq!(saved, path);

    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).expect("Invalid JSON");
    assert_eq!(parsed["stress"]["thread_count"], 10);
    assert!(parsed["probe"].is_null());
    assert!(parsed["log"].as_array().is_some_and(|log| !log.is_empty()));
}

#[test]
fn test_export_text_adds_extension() {
    let dir = tempfile::tempdir().expect("temp dir");
    let saved = export_to_file(&stress_report(), &dir.path().join("report")).expect("export");
    assert_eq!(saved.extension().and_then(|e| e.to_str()), Some("txt"));

    let text = fs::read_to_string(saved).unwrap();
    assert!(text.contains("STRESS TEST"));
    assert!(text.contains("Starting stress test with 10 threads for 1 seconds"));
}

#[test]
fn test_export_csv_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("report.csv");
    export_to_file(&stress_report(), &path).expect("export");

    let csv = fs::read_to_string(path).unwrap();
    assert!(csv.lines().any(|l| l == "Stress Threads,10"));
}

#[test]
fn test_export_rejects_unknown_extension() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = export_to_file(&stress_report(), &dir.path().join("report.pdf")).unwrap_err();
    assert!(matches!(err, GaugeError::UnsupportedFormat(_)));
}

#[test]
fn test_export_to_missing_directory_fails() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = export_to_file(&stress_report(), &dir.path().join("nope/report.txt")).unwrap_err();
    assert!(matches!(err, GaugeError::ExportFailed { .. }));
}
