//! Plain-text report: header, system information, results, then the log

use std::io::Write;

use threadgauge_common::{LoadResult, ProbeResult, ResourceSample};

use super::Report;
use crate::domain::{GaugeResult, StackSizeKb};

pub fn write_text<W: Write>(report: &Report, mut w: W) -> GaugeResult<()> {
    writeln!(w, "threadgauge - Test Results Export")?;
    writeln!(w, "=================================")?;
    writeln!(w)?;
    writeln!(w, "Export Date: {}", report.generated_at)?;
    writeln!(w)?;

    section(&mut w, "SYSTEM INFORMATION")?;
    for (label, value) in report.system.rows() {
        writeln!(w, "{label}: {value}")?;
    }
    writeln!(w)?;

    section(&mut w, "RESOURCE SNAPSHOT")?;
    write_snapshot(&mut w, &report.snapshot)?;
    writeln!(w)?;

    if let Some(probe) = &report.probe {
        section(&mut w, "MAX THREADS PROBE")?;
        write_probe(&mut w, probe)?;
        writeln!(w)?;
    }

    if let Some(stress) = &report.stress {
        section(&mut w, "STRESS TEST")?;
        write_stress(&mut w, stress)?;
        writeln!(w)?;
    }

    section(&mut w, "TEST LOG")?;
    for line in &report.log {
        writeln!(w, "{line}")?;
    }
    writeln!(w)?;
    writeln!(w, "End of Report")?;
    Ok(())
}

/// Result summary shown after a probe finishes
#[must_use]
pub fn probe_summary(p: &ProbeResult) -> Vec<String> {
    let mut lines = vec![
        format!("Max threads reached: {}", p.max_threads),
        format!("Stack size: {}", StackSizeKb(p.stack_size_kb)),
        format!("Memory per thread: ~{} KB", p.memory_per_thread_kb),
        format!("Reason: {}", p.stop_reason),
    ];
    if let Some(note) = p.note() {
        lines.push(format!("Note: {note}"));
    }
    lines
}

/// Result summary shown after a stress test finishes
#[must_use]
pub fn load_summary(l: &LoadResult) -> Vec<String> {
    vec![
        format!("Stress test {}:", if l.cancelled { "cancelled" } else { "completed" }),
        format!("Threads: {}", l.threads_started),
        format!("Duration: {:.1} / {} seconds", l.actual_duration_secs, l.planned_duration_secs),
        format!("Average CPU Load: {:.1}%", l.average_cpu_load_percent),
    ]
}

fn section<W: Write>(w: &mut W, title: &str) -> std::io::Result<()> {
    writeln!(w, "{title}")?;
    writeln!(w, "{}", "-".repeat(title.len()))
}

fn write_snapshot<W: Write>(w: &mut W, s: &ResourceSample) -> std::io::Result<()> {
    writeln!(w, "Used Memory: {} MB", s.used_heap_mb)?;
    writeln!(w, "Committed Memory: {} MB", s.committed_heap_mb)?;
    writeln!(w, "Memory Ceiling: {} MB", s.max_heap_mb)?;
    writeln!(w, "Active Threads: {}", s.active_thread_count)?;
    if s.cpu_available() {
        writeln!(w, "CPU Load: {:.1}%", s.cpu_load_percent)
    } else {
        writeln!(w, "CPU Load: unavailable")
    }
}

fn write_probe<W: Write>(w: &mut W, p: &ProbeResult) -> std::io::Result<()> {
    writeln!(w, "Max Threads: {}", p.max_threads)?;
    writeln!(w, "Stack Size: {}", StackSizeKb(p.stack_size_kb))?;
    writeln!(w, "Memory per Thread: ~{} KB", p.memory_per_thread_kb)?;
    writeln!(w, "Stop Reason: {}", p.stop_reason)?;
    writeln!(w, "Memory Before: {} MB", p.memory_before_mb)?;
    writeln!(w, "Memory After: {} MB", p.memory_after_mb)?;
    writeln!(w, "Elapsed: {:.2} s", p.elapsed_secs)?;
    writeln!(w, "Threads Reaped: {}", p.threads_reaped)?;
    if p.threads_abandoned > 0 {
        writeln!(w, "Threads Abandoned: {}", p.threads_abandoned)?;
    }
    if let Some(note) = p.note() {
        writeln!(w, "Note: {note}")?;
    }
    Ok(())
}

fn write_stress<W: Write>(w: &mut W, l: &LoadResult) -> std::io::Result<()> {
    writeln!(w, "Threads: {} ({} started)", l.thread_count, l.threads_started)?;
    writeln!(w, "Planned Duration: {} s", l.planned_duration_secs)?;
    writeln!(w, "Actual Duration: {:.2} s", l.actual_duration_secs)?;
    writeln!(w, "Average CPU Load: {:.1}%", l.average_cpu_load_percent)?;
    writeln!(w, "Peak CPU Load: {:.1}%", l.peak_cpu_load_percent)?;
    writeln!(w, "CPU Samples: {}", l.cpu_samples)?;
    if l.cancelled {
        writeln!(w, "Cancelled: yes")?;
    }
    if l.threads_abandoned > 0 {
        writeln!(w, "Threads Abandoned: {}", l.threads_abandoned)?;
    }
    Ok(())
}
