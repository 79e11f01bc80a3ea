use anyhow::Result;
use serde::Serialize;

use super::CommandContext;
use crate::parallel::available_units;

#[derive(Debug, Serialize)]
struct WorkerInfo {
    available_units: usize,
    thread_percentage: u8,
    max_workers: Option<usize>,
    cli_override: Option<i64>,
    workers: usize,
}

pub fn execute(ctx: &CommandContext) -> Result<()> {
    let policy = ctx.config.worker_policy();
    let info = WorkerInfo {
        available_units: available_units(),
        thread_percentage: policy.thread_percentage,
        max_workers: policy.max_workers,
        cli_override: ctx.workers,
        workers: ctx.worker_count()?.get(),
    };

    if ctx.is_json() {
        return ctx.print_json(&info);
    }

    let output = &ctx.output;
    output.section_header("Worker pool");
    output.key_value("Processing units:", &info.available_units.to_string(), false);
    output.key_value("Thread percentage:", &format!("{}%", info.thread_percentage), false);
    if let Some(max) = info.max_workers {
        output.key_value("Configured cap:", &max.to_string(), false);
    }
    if let Some(requested) = info.cli_override {
        output.key_value("--workers:", &requested.to_string(), false);
    }
    output.key_value("Workers:", &info.workers.to_string(), true);
    Ok(())
}
