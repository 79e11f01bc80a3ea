use std::any::Any;
use std::fmt;

use serde::Serialize;

use super::error::RunnerError;

/// Failure record for a single work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskFailure {
    pub message: String,
    /// The worker function panicked instead of returning an error.
    pub panicked: bool,
}

impl TaskFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            panicked: false,
        }
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "worker function panicked".to_string()
        };
        Self {
            message,
            panicked: true,
        }
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.panicked {
            write!(f, "panicked: {}", self.message)
        } else {
            f.write_str(&self.message)
        }
    }
}

impl std::error::Error for TaskFailure {}

/// One item together with what its worker function produced.
#[derive(Debug)]
pub struct TaskOutcome<T, R> {
    pub item: T,
    /// Slot that processed the item.
    pub worker_id: usize,
    pub result: Result<R, TaskFailure>,
}

impl<T, R> TaskOutcome<T, R> {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    #[inline]
    pub fn failure(&self) -> Option<&TaskFailure> {
        self.result.as_ref().err()
    }
}

/// Success/failure tally for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn of<T, R>(outcomes: &[TaskOutcome<T, R>]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
        }
    }

    /// A non-empty batch in which nothing succeeded.
    #[inline]
    pub fn all_failed(&self) -> bool {
        self.total > 0 && self.succeeded == 0
    }
}

/// Turn a batch where every item failed into [`RunnerError::AllTasksFailed`].
///
/// Partial failure is left to the caller; an empty batch passes through.
pub fn ensure_any_succeeded<T, R>(
    outcomes: Vec<TaskOutcome<T, R>>,
) -> Result<Vec<TaskOutcome<T, R>>, RunnerError> {
    let summary = BatchSummary::of(&outcomes);
    if summary.all_failed() {
        return Err(RunnerError::AllTasksFailed {
            total: summary.total,
        });
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(item: &'static str, ok: bool) -> TaskOutcome<&'static str, usize> {
        TaskOutcome {
            item,
            worker_id: 0,
            result: if ok {
                Ok(item.len())
            } else {
                Err(TaskFailure::new("boom"))
            },
        }
    }

    #[test]
    fn summary_counts_mixed_batch() {
        let outcomes = vec![outcome("a", true), outcome("b", false), outcome("c", true)];
        let summary = BatchSummary::of(&outcomes);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_failed());
    }

    #[test]
    fn empty_batch_is_not_all_failed() {
        let outcomes: Vec<TaskOutcome<&str, usize>> = Vec::new();
        assert!(!BatchSummary::of(&outcomes).all_failed());
        assert!(ensure_any_succeeded(outcomes).is_ok());
    }

    #[test]
    fn all_failed_batch_is_an_error() {
        let outcomes = vec![outcome("a", false), outcome("b", false)];
        let err = ensure_any_succeeded(outcomes).unwrap_err();
        assert!(matches!(err, RunnerError::AllTasksFailed { total: 2 }));
    }

    #[test]
    fn panic_payloads_become_messages() {
        let failure = TaskFailure::from_panic(Box::new("index out of bounds"));
        assert!(failure.panicked);
        assert_eq!(failure.message, "index out of bounds");
        assert_eq!(failure.to_string(), "panicked: index out of bounds");

        let failure = TaskFailure::from_panic(Box::new(String::from("owned")));
        assert_eq!(failure.message, "owned");

        let failure = TaskFailure::from_panic(Box::new(42_u8));
        assert_eq!(failure.message, "worker function panicked");
    }
}
