//! # threadgauge - Thread Capacity and Load Diagnostics
//!
//! threadgauge answers two questions about the machine it runs on: how many
//! threads can this process keep alive, and what happens to the system while a
//! fixed population of busy threads runs. Results are approximate diagnostics,
//! meant for comparing stack sizes and machines rather than for exact sizing.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              Invoking context (TUI, headless CLI, tests)        │
//! └──────────┬──────────────────────────────────────▲───────────────┘
//!            │ config, cancel                       │ progress, result
//!            ▼                                      │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Engine                                │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │   Capacity   │   │     Load     │   │     Task     │         │
//! │  │    Probe     │   │  Generator   │   │ (background) │         │
//! │  └──────┬───────┘   └──────┬───────┘   └──────────────┘         │
//! │         │                  │                                    │
//! │         ▼                  ▼                                    │
//! │  ┌──────────────────────────────────┐   ┌──────────────┐        │
//! │  │  Thread pool + stop signals      │   │ Stack-size   │        │
//! │  │  (bounded joins, cleanup budget) │   │ strategy     │        │
//! │  └──────────────────────────────────┘   └──────────────┘        │
//! └──────────────────────────┬──────────────────────────────────────┘
//!                            │ reads
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │        Sampling (/proc/self/status, /proc/meminfo, /proc/stat)  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`engine`]: Capacity probe, load generator, thread handles, pool,
//!   stack-size strategy table, cancellation and background tasks
//! - [`sampling`]: Process memory and thread counts, system CPU load, heap
//!   compaction and resource limits
//! - [`sysinfo`]: Static OS, CPU, memory and limit readout
//! - [`export`]: Text, CSV and JSON reports
//! - [`tui`]: Interactive terminal shell
//! - [`cli`]: Command-line argument parsing
//! - [`domain`]: Error type and small shared types
//!
//! ## Typical Usage
//!
//! ```bash
//! # Interactive shell
//! threadgauge
//!
//! # How many 256 KB threads fit?
//! threadgauge probe --stack-size 256
//!
//! # 200 busy threads for 30 seconds, saved as JSON
//! threadgauge --export stress.json stress --threads 200 --duration 30
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use threadgauge::engine::{CancelToken, ThreadCapacityProbe};
//! use threadgauge_common::ProbeConfig;
//!
//! let probe = ThreadCapacityProbe::new(ProbeConfig::with_stack_size(256))?;
//! let result = probe.run(&CancelToken::new(), |line| println!("{line}"));
//! println!("{} threads, stopped by: {}", result.max_threads, result.stop_reason);
//! # Ok::<(), threadgauge::domain::GaugeError>(())
//! ```

// Expose modules for testing
pub mod cli;
pub mod domain;
pub mod engine;
pub mod export;
pub mod sampling;
pub mod sysinfo;
pub mod tui;
