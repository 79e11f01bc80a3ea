use thiserror::Error;

/// Errors raised by the runner itself, never by a worker function.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid runner configuration: {0}")]
    InvalidConfiguration(String),
    #[error("all {total} tasks failed")]
    AllTasksFailed { total: usize },
    #[error("worker thread panicked outside of a task")]
    WorkerPanicked,
}

impl RunnerError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        RunnerError::InvalidConfiguration(msg.into())
    }
}
