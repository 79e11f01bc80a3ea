//! Command implementations for the seoscan CLI
//!
//! Each command lives in its own module and receives the shared
//! [`CommandContext`] built once in [`Cli::run`](super::Cli::run).

use anyhow::{Context, Result};
use serde::Serialize;

use super::{OutputFormat, Output};
use crate::config::SeoscanConfig;
use crate::parallel::{ParallelRunner, WorkerCount};

pub mod config;
pub mod keywords;
pub mod pages;
pub mod workers;

/// State shared by every command.
pub struct CommandContext {
    pub config: SeoscanConfig,
    pub output: Output,
    pub format: OutputFormat,
    /// Raw `--workers` value; validated on use.
    pub workers: Option<i64>,
}

impl CommandContext {
    /// `--workers` when given, otherwise the configured policy.
    pub fn worker_count(&self) -> Result<WorkerCount> {
        match self.workers {
            Some(requested) => WorkerCount::try_from(requested).context("Invalid --workers value"),
            None => self
                .config
                .worker_policy()
                .resolve()
                .context("Invalid worker policy"),
        }
    }

    pub fn runner(&self) -> Result<ParallelRunner> {
        let workers = self.worker_count()?;
        if !self.is_json() {
            self.output
                .verbose(&format!("Using {} worker thread(s)", workers.get()));
        }
        Ok(ParallelRunner::with_workers(workers))
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}
