//! # threadgauge - Main Entry Point
//!
//! Supports two operational modes:
//! - **Interactive** (`threadgauge` or `threadgauge tui`): terminal shell
//! - **Headless** (`probe`, `stress`, `sample`, `sysinfo`): one run, printed to
//!   stdout, optionally saved with `--export`
//!
//! Ctrl+C during a headless run requests cooperative cancellation; the run
//! still reaps its threads and reports a partial result.

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::TryRecvError;
use log::info;
use std::time::Duration;

use threadgauge::cli::{Args, Command, ProbeArgs, SampleArgs, StressArgs};
use threadgauge::domain::GaugeError;
use threadgauge::engine::{LoadGenerator, RunEvent, Task, ThreadCapacityProbe};
use threadgauge::export::{self, load_summary, probe_summary, Report};
use threadgauge::sampling::ResourceSampler;
use threadgauge::sysinfo::SystemInfo;
use threadgauge::tui;
use threadgauge_common::{LoadResult, ProbeResult, ResourceSample, StopReason};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_CANCELLED: i32 = 130;

/// How often a headless run drains progress
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    Cancelled,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    std::process::exit(match run(args) {
        Ok(Outcome::Completed) => EXIT_SUCCESS,
        Ok(Outcome::Cancelled) => EXIT_CANCELLED,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<GaugeError>() {
        Some(e) if e.is_config() => EXIT_USAGE,
        _ => EXIT_ERROR,
    }
}

/// Progress lines printed and kept for the report
struct RunLog {
    quiet: bool,
    lines: Vec<String>,
}

impl RunLog {
    fn new(quiet: bool) -> Self {
        Self { quiet, lines: Vec::new() }
    }

    fn progress(&mut self, message: &str) {
        let line = format!("[{}] {message}", chrono::Local::now().format("%H:%M:%S"));
        if !self.quiet {
            println!("{line}");
        }
        self.lines.push(line);
    }

    /// Result lines are printed even in quiet mode
    fn summary(&mut self, lines: &[String]) {
        for line in lines {
            println!("{line}");
            self.lines.push(line.clone());
        }
    }
}

#[tokio::main]
async fn run(args: Args) -> Result<Outcome> {
    let command = args.resolved_command();
    let mut log = RunLog::new(args.quiet);
    let mut probe_result = None;
    let mut stress_result = None;

    let outcome = match &command {
        Command::Tui => {
            tui::run(args.export.clone())?;
            return Ok(Outcome::Completed);
        }
        Command::Probe(probe_args) => {
            let result = run_probe(probe_args, &mut log).await?;
            let outcome = if result.stop_reason == StopReason::Cancelled {
                Outcome::Cancelled
            } else {
                Outcome::Completed
            };
            probe_result = Some(result);
            outcome
        }
        Command::Stress(stress_args) => {
            let result = run_stress(stress_args, &mut log).await?;
            let outcome = if result.cancelled { Outcome::Cancelled } else { Outcome::Completed };
            stress_result = Some(result);
            outcome
        }
        Command::Sample(sample_args) => run_sample(sample_args).await,
        Command::Sysinfo => {
            print_sysinfo(&SystemInfo::collect());
            Outcome::Completed
        }
    };

    if let Some(path) = &args.export {
        let report = Report::new(SystemInfo::collect(), ResourceSampler::new().sample())
            .with_probe(probe_result)
            .with_stress(stress_result)
            .with_log(log.lines);
        let saved = export::export_to_file(&report, path).context("Failed to export report")?;
        if !args.quiet {
            println!("saved: {}", saved.display());
        }
    }

    Ok(outcome)
}

async fn run_probe(args: &ProbeArgs, log: &mut RunLog) -> Result<ProbeResult> {
    let probe = ThreadCapacityProbe::new(args.to_config())?;
    let task = Task::spawn_probe(probe).context("Failed to start probe")?;
    let result = drive(task, log).await?;
    log.summary(&probe_summary(&result));
    Ok(result)
}

async fn run_stress(args: &StressArgs, log: &mut RunLog) -> Result<LoadResult> {
    let generator = LoadGenerator::new(args.to_config())?;
    let task = Task::spawn_load(generator).context("Failed to start stress test")?;
    let result = drive(task, log).await?;
    log.summary(&load_summary(&result));
    Ok(result)
}

/// Forward progress until the result arrives; Ctrl+C cancels once
async fn drive<T>(task: Task<T>, log: &mut RunLog) -> Result<T> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        loop {
            match task.events().try_recv() {
                Ok(RunEvent::Progress(line)) => log.progress(&line),
                Ok(RunEvent::Finished(result)) => return Ok(result),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    return Err(GaugeError::RunAborted(task.kind().to_string()).into());
                }
            }
        }

        tokio::select! {
            () = tokio::time::sleep(POLL_INTERVAL) => {}
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                info!("interrupt received, cancelling {}", task.kind());
                eprintln!("interrupted, stopping {}...", task.kind());
                task.cancel();
            }
        }
    }
}

async fn run_sample(args: &SampleArgs) -> Outcome {
    let sampler = ResourceSampler::new();
    // Prime the CPU tracker so the first printed sample has a load figure
    sampler.cpu_load_percent();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let interval = Duration::from_millis(args.interval_ms);

    println!("{:>10} {:>10} {:>10} {:>8} {:>7}", "used_mb", "commit_mb", "max_mb", "threads", "cpu%");
    for _ in 0..args.count {
        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            _ = &mut ctrl_c => return Outcome::Cancelled,
        }
        println!("{}", format_sample(&sampler.sample()));
    }
    Outcome::Completed
}

fn format_sample(s: &ResourceSample) -> String {
    let cpu = if s.cpu_available() {
        format!("{:.1}", s.cpu_load_percent)
    } else {
        "n/a".to_string()
    };
    format!(
        "{:>10} {:>10} {:>10} {:>8} {:>7}",
        s.used_heap_mb, s.committed_heap_mb, s.max_heap_mb, s.active_thread_count, cpu
    )
}

fn print_sysinfo(info: &SystemInfo) {
    let rows = info.rows();
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    for (label, value) in rows {
        println!("{label:<width$}  {value}");
    }
}
