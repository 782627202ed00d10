//! CLI argument definitions

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use threadgauge_common::{
    LoadConfig, ProbeConfig, DEFAULT_BATCH_SIZE, DEFAULT_MIN_FREE_HEAP_MB, DEFAULT_SAFETY_CAP,
    DEFAULT_STACK_SIZE_KB, DEFAULT_STRESS_DURATION_SECS, DEFAULT_STRESS_THREADS,
};

#[derive(Parser, Debug)]
#[command(
    name = "threadgauge",
    version,
    about = "Measure how many threads this machine can sustain, and what they cost",
    after_help = "\
EXAMPLES:
    threadgauge                                  Interactive terminal UI
    threadgauge probe --stack-size 256           Max threads with 256 KB stacks
    threadgauge stress --threads 200 -d 30       CPU stress with 200 threads
    threadgauge --export report.json probe       Probe and save a JSON report"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Export a report to FILE (.txt, .csv or .json)
    #[arg(long, value_name = "FILE", global = true)]
    pub export: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl Args {
    /// Subcommand to run, the TUI when none was given
    #[must_use]
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Tui)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive terminal UI (default)
    Tui,
    /// Create idle threads until a limit is reached
    Probe(ProbeArgs),
    /// Run CPU-bound worker threads for a fixed duration
    Stress(StressArgs),
    /// Print live resource snapshots
    Sample(SampleArgs),
    /// Print static system information
    Sysinfo,
}

#[derive(ClapArgs, Debug, Clone, PartialEq, Eq)]
pub struct ProbeArgs {
    /// Thread stack size in KB (0 = platform default)
    #[arg(long, default_value_t = DEFAULT_STACK_SIZE_KB, value_parser = parse_stack_size)]
    pub stack_size: u32,

    /// Stop after creating this many threads
    #[arg(long, default_value_t = DEFAULT_SAFETY_CAP, value_parser = clap::value_parser!(u32).range(1..))]
    pub safety_cap: u32,

    /// Threads created between headroom checks
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, value_parser = clap::value_parser!(u32).range(1..))]
    pub batch_size: u32,

    /// Stop when free memory headroom drops below this many MB
    #[arg(long, default_value_t = DEFAULT_MIN_FREE_HEAP_MB)]
    pub min_free_mb: u64,
}

impl ProbeArgs {
    #[must_use]
    pub fn to_config(&self) -> ProbeConfig {
        let mut config = ProbeConfig::with_stack_size(self.stack_size);
        config.limits.safety_cap = self.safety_cap;
        config.limits.batch_size = self.batch_size;
        config.limits.min_free_heap_mb = self.min_free_mb;
        config
    }
}

impl Default for ProbeArgs {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE_KB,
            safety_cap: DEFAULT_SAFETY_CAP,
            batch_size: DEFAULT_BATCH_SIZE,
            min_free_mb: DEFAULT_MIN_FREE_HEAP_MB,
        }
    }
}

#[derive(ClapArgs, Debug, Clone, PartialEq, Eq)]
pub struct StressArgs {
    /// Number of worker threads (10-10000)
    #[arg(short, long, default_value_t = DEFAULT_STRESS_THREADS,
          value_parser = clap::value_parser!(u32).range(10..=10_000))]
    pub threads: u32,

    /// Test duration in seconds (1-60)
    #[arg(short, long, default_value_t = DEFAULT_STRESS_DURATION_SECS,
          value_parser = clap::value_parser!(u32).range(1..=60))]
    pub duration: u32,
}

impl StressArgs {
    #[must_use]
    pub fn to_config(&self) -> LoadConfig {
        LoadConfig::new(self.threads, self.duration)
    }
}

#[derive(ClapArgs, Debug, Clone, PartialEq, Eq)]
pub struct SampleArgs {
    /// Number of snapshots to print
    #[arg(short = 'n', long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,

    /// Milliseconds between snapshots
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(50..))]
    pub interval_ms: u64,
}

/// Stack size in KB: 0 for the platform default, otherwise 128-8192
fn parse_stack_size(s: &str) -> Result<u32, String> {
    let kb: u32 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if kb == 0 || (128..=8192).contains(&kb) {
        Ok(kb)
    } else {
        Err("stack size must be 0 or between 128 and 8192 KB".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_is_tui() {
        let args = Args::try_parse_from(["threadgauge"]).unwrap();
        assert_eq!(args.resolved_command(), Command::Tui);
        assert!(!args.quiet);
    }

    #[test]
    fn test_probe_defaults() {
        let args = Args::try_parse_from(["threadgauge", "probe"]).unwrap();
        let Command::Probe(probe) = args.resolved_command() else { panic!("expected probe") };
        assert_eq!(probe, ProbeArgs::default());

        let config = probe.to_config();
        assert_eq!(config.stack_size_kb, 512);
        assert_eq!(config.limits.safety_cap, 50_000);
    }

    #[test]
    fn test_probe_overrides() {
        let args = Args::try_parse_from([
            "threadgauge", "probe", "--stack-size", "0", "--safety-cap", "200", "--min-free-mb", "10",
        ])
        .unwrap();
        let Command::Probe(probe) = args.resolved_command() else { panic!("expected probe") };
        let config = probe.to_config();
        assert_eq!(config.stack_size_kb, 0);
        assert_eq!(config.limits.safety_cap, 200);
        assert_eq!(config.limits.min_free_heap_mb, 10);
    }

    #[test]
    fn test_stack_size_range() {
        assert!(Args::try_parse_from(["threadgauge", "probe", "--stack-size", "64"]).is_err());
        assert!(Args::try_parse_from(["threadgauge", "probe", "--stack-size", "9000"]).is_err());
        assert!(Args::try_parse_from(["threadgauge", "probe", "--stack-size", "8192"]).is_ok());
    }

    #[test]
    fn test_stress_ranges() {
        let args =
            Args::try_parse_from(["threadgauge", "stress", "-t", "10", "-d", "2"]).unwrap();
        let Command::Stress(stress) = args.resolved_command() else { panic!("expected stress") };
        let config = stress.to_config();
        assert_eq!(config.thread_count, 10);
        assert_eq!(config.duration_secs, 2);

        assert!(Args::try_parse_from(["threadgauge", "stress", "-t", "5"]).is_err());
        assert!(Args::try_parse_from(["threadgauge", "stress", "-d", "61"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args =
            Args::try_parse_from(["threadgauge", "sysinfo", "--export", "out.csv", "-q"]).unwrap();
        assert_eq!(args.resolved_command(), Command::Sysinfo);
        assert_eq!(args.export, Some(PathBuf::from("out.csv")));
        assert!(args.quiet);
    }
}
