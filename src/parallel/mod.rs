//! Generic bounded parallel execution
//!
//! This module runs a caller-supplied function over a list of work items on a
//! fixed number of worker threads and hands back one outcome per item.
//!
//! # Architecture Responsibilities
//!
//! ## What This Module Does:
//! - **Resource Discovery**: Detects available processing units using `num_cpus::get()`
//! - **Resource Calculation**: Applies the worker policy (thread percentage, explicit cap)
//! - **Execution**: Keeps at most N calls in flight and refills a slot the moment it frees up
//! - **Failure Isolation**: Converts errors and panics into per-item [`TaskFailure`]s
//!
//! ## What This Module Does NOT Do:
//! - **Domain Logic**: Knows nothing about texts, URLs or HTTP
//! - **Logging**: Failures are returned as data; nothing is written to the log
//! - **Timeouts**: A slow item is bounded only by its own worker function
//!
//! ```text
//! ┌─────────────┐   items    ┌──────────────────────────┐  outcomes  ┌─────────────┐
//! │  Producer   │──────────▶ │ worker-0 … worker-(N-1)  │──────────▶ │  Collector  │
//! │ (bounded    │            │ worker_fn(&item)         │            │ (caller's   │
//! │  channel)   │            │ catch_unwind per item    │            │  thread)    │
//! └─────────────┘            └──────────────────────────┘            └─────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use seoscan::parallel::{self, WorkerPolicy, ParallelRunner};
//!
//! // Explicit cap
//! let outcomes = parallel::run(vec![1, 2, 3], |x: &i32| Ok::<_, String>(x * 2), Some(2))?;
//! assert_eq!(outcomes.len(), 3);
//!
//! // Cap derived from the host: max(1, 75% of processing units)
//! let runner = ParallelRunner::from_policy(&WorkerPolicy::default())?;
//! assert!(runner.workers() >= 1);
//! # Ok::<(), seoscan::parallel::RunnerError>(())
//! ```

pub mod core;
pub mod error;
pub mod outcome;
pub mod policy;

pub use self::core::{ParallelRunner, Progress, run};
pub use error::RunnerError;
pub use outcome::{BatchSummary, TaskFailure, TaskOutcome, ensure_any_succeeded};
pub use policy::{
    DEFAULT_THREAD_PERCENTAGE, WorkerCount, WorkerPolicy, available_units, default_worker_count,
};
