//! Two-column `Metric,Value` CSV report

use std::io::Write;

use super::Report;
use crate::domain::{GaugeResult, StackSizeKb};

pub fn write_csv<W: Write>(report: &Report, mut w: W) -> GaugeResult<()> {
    let mut row = |metric: &str, value: &str| -> std::io::Result<()> {
        writeln!(w, "{},{}", escape(metric), escape(value))
    };

    row("Metric", "Value")?;
    row("Export Date", &report.generated_at)?;
    row("Application", "threadgauge")?;

    for (label, value) in report.system.rows() {
        row(label, &value)?;
    }

    let s = &report.snapshot;
    row("Used Memory (MB)", &s.used_heap_mb.to_string())?;
    row("Committed Memory (MB)", &s.committed_heap_mb.to_string())?;
    row("Memory Ceiling (MB)", &s.max_heap_mb.to_string())?;
    row("Active Threads", &s.active_thread_count.to_string())?;
    row("CPU Load (%)", &format!("{:.1}", s.cpu_load_percent))?;

    if let Some(p) = &report.probe {
        row("Probe Max Threads", &p.max_threads.to_string())?;
        row("Probe Stack Size", &StackSizeKb(p.stack_size_kb).to_string())?;
        row("Probe Memory per Thread (KB)", &p.memory_per_thread_kb.to_string())?;
        row("Probe Stop Reason", p.stop_reason.label())?;
        row("Probe Elapsed (s)", &format!("{:.2}", p.elapsed_secs))?;
        row("Probe Threads Abandoned", &p.threads_abandoned.to_string())?;
        if let Some(note) = p.note() {
            row("Probe Note", &note)?;
        }
    }

    if let Some(l) = &report.stress {
        row("Stress Threads", &l.thread_count.to_string())?;
        row("Stress Threads Started", &l.threads_started.to_string())?;
        row("Stress Planned Duration (s)", &l.planned_duration_secs.to_string())?;
        row("Stress Actual Duration (s)", &format!("{:.2}", l.actual_duration_secs))?;
        row("Stress Average CPU (%)", &format!("{:.1}", l.average_cpu_load_percent))?;
        row("Stress Peak CPU (%)", &format!("{:.1}", l.peak_cpu_load_percent))?;
        row("Stress Cancelled", if l.cancelled { "yes" } else { "no" })?;
    }

    for line in &report.log {
        row("Log", line)?;
    }
    Ok(())
}

/// Quote a field when it contains a separator, quote or newline
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fixtures;

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_csv_rows() {
        let mut buffer = Vec::new();
        write_csv(&fixtures::report(), &mut buffer).unwrap();
        let csv = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Metric,Value");
        assert!(lines.contains(&"Probe Max Threads,4200"));
        assert!(lines.contains(&"Probe Stop Reason,safety_cap"));
        assert!(lines.contains(&"Stress Peak CPU (%),52.0"));
        assert!(lines.contains(&"Log,\"[12:00:00] Starting stress test, with commas\""));
    }
}
