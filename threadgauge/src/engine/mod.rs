//! Thread-capacity and load engine
//!
//! This module contains the core of threadgauge:
//! - Capacity probe (batched thread creation until a limit is hit)
//! - Load generator (fixed worker population plus CPU sampling)
//! - Thread handles with stop signals and bounded joins
//! - Run-scoped pool that reaps every thread within a budget
//! - Stack-size strategy table for platform quirks
//! - Cancellation token, progress reporting and background tasks
//!
//! Both components share one contract: `run(cancel, on_progress) -> Result`
//! on the calling thread, or `Task::spawn_*` for background execution. The
//! only hard failure is a rejected config, reported by the constructors.

pub mod cancel;
pub mod load;
pub mod pool;
pub mod probe;
pub mod progress;
pub mod stack_policy;
pub mod task;
pub mod thread_handle;

// Re-export common types
pub use cancel::CancelToken;
pub use load::{CpuStats, LoadGenerator};
pub use pool::{CleanupReport, ThreadPool};
pub use probe::{memory_per_thread_kb, resolve_stop_reason, ThreadCapacityProbe};
pub use progress::RunEvent;
pub use stack_policy::{StackChoice, StackQuirk, StackSizePolicy};
pub use task::Task;
pub use thread_handle::{idle_until_stopped, JoinOutcome, StopSignal, ThreadHandle, ThreadSpec};
