use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use super::error::RunnerError;

/// Share of the available processing units used when no explicit count is given.
pub const DEFAULT_THREAD_PERCENTAGE: u8 = 75;

/// A validated, strictly positive concurrency cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WorkerCount(NonZeroUsize);

impl WorkerCount {
    pub fn new(count: usize) -> Result<Self, RunnerError> {
        NonZeroUsize::new(count)
            .map(WorkerCount)
            .ok_or_else(|| RunnerError::invalid("max_workers must be greater than zero"))
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl TryFrom<i64> for WorkerCount {
    type Error = RunnerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(RunnerError::invalid(format!(
                "max_workers must be greater than zero, got {value}"
            )));
        }
        let count = usize::try_from(value)
            .map_err(|_| RunnerError::invalid(format!("max_workers {value} is out of range")))?;
        WorkerCount::new(count)
    }
}

impl TryFrom<usize> for WorkerCount {
    type Error = RunnerError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        WorkerCount::new(value)
    }
}

/// Number of processing units visible to this process.
pub fn available_units() -> usize {
    num_cpus::get()
}

/// Default concurrency cap for `available_units` processing units:
/// `max(1, floor(0.75 * available_units))`.
pub fn default_worker_count(available_units: usize) -> usize {
    workers_by_percentage(available_units, DEFAULT_THREAD_PERCENTAGE)
}

fn workers_by_percentage(available_units: usize, thread_percentage: u8) -> usize {
    std::cmp::max(1, (available_units * thread_percentage as usize) / 100)
}

/// Resource-aware worker calculation.
///
/// The policy only looks at system resources and user preferences. It does not
/// adapt to the workload; callers that know their items are cheap or expensive
/// pass an explicit `max_workers` instead.
///
/// ```text
/// max_workers set  -> max_workers (validated > 0, no upper bound)
/// otherwise        -> max(1, units * thread_percentage / 100)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPolicy {
    /// Percentage of processing units to use (1-100).
    pub thread_percentage: u8,
    /// Explicit worker count; overrides the percentage when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
}

impl Default for WorkerPolicy {
    fn default() -> Self {
        Self {
            thread_percentage: DEFAULT_THREAD_PERCENTAGE,
            max_workers: None,
        }
    }
}

impl WorkerPolicy {
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = Some(max_workers);
        self
    }

    pub fn with_thread_percentage(mut self, thread_percentage: u8) -> Self {
        self.thread_percentage = thread_percentage;
        self
    }

    pub fn validate(&self) -> Result<(), RunnerError> {
        if !(1..=100).contains(&self.thread_percentage) {
            return Err(RunnerError::invalid(format!(
                "thread_percentage must be within 1..=100, got {}",
                self.thread_percentage
            )));
        }
        if let Some(max_workers) = self.max_workers {
            WorkerCount::new(max_workers)?;
        }
        Ok(())
    }

    /// Resolve against an explicit processing-unit count. Pure.
    pub fn resolve_with(&self, available_units: usize) -> Result<WorkerCount, RunnerError> {
        self.validate()?;
        match self.max_workers {
            Some(max_workers) => WorkerCount::new(max_workers),
            None => WorkerCount::new(workers_by_percentage(
                available_units,
                self.thread_percentage,
            )),
        }
    }

    /// Resolve against the host's processing units.
    pub fn resolve(&self) -> Result<WorkerCount, RunnerError> {
        self.resolve_with(available_units())
    }
}
