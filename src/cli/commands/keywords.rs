use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use serde_json::json;

use super::CommandContext;
use crate::cli::Output;
use crate::keywords::{KeywordExtractor, TextSource, Tokenizer};
use crate::parallel::{BatchSummary, ensure_any_succeeded};

#[derive(Args)]
pub struct KeywordsArgs {
    /// Text files to analyze
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Inline text to analyze (repeatable)
    #[arg(short, long = "text", value_name = "TEXT")]
    pub texts: Vec<String>,

    /// Number of keywords to report per text
    #[arg(short = 'n', long, value_name = "N")]
    pub top: Option<usize>,

    /// Tokenizer to use (overrides keywords.tokenizer)
    #[arg(long, value_enum)]
    pub tokenizer: Option<Tokenizer>,
}

impl KeywordsArgs {
    /// Work items in submission order: files first, then inline texts.
    fn sources(&self) -> Vec<(usize, TextSource)> {
        let files = self.files.iter().cloned().map(TextSource::File);
        let inline = self
            .texts
            .iter()
            .enumerate()
            .map(|(index, text)| TextSource::Inline {
                index,
                text: text.clone(),
            });
        files.chain(inline).enumerate().collect()
    }
}

pub fn execute(args: KeywordsArgs, ctx: &CommandContext) -> Result<()> {
    let sources = args.sources();
    if sources.is_empty() {
        bail!("Nothing to analyze: pass one or more files or --text");
    }

    let mut settings = ctx.config.keywords.clone();
    if let Some(top) = args.top {
        settings.top_n = top;
    }
    if let Some(tokenizer) = args.tokenizer {
        settings.tokenizer = tokenizer;
    }
    if settings.top_n == 0 {
        bail!("--top must be at least 1");
    }
    let extractor = KeywordExtractor::from_config(&settings);

    let runner = ctx.runner()?;
    tracing::info!(
        "Extracting keywords from {} text(s) with {} worker(s)",
        sources.len(),
        runner.workers()
    );

    let pb = if ctx.is_json() {
        indicatif::ProgressBar::hidden()
    } else {
        ctx.output.progress_bar(sources.len(), "Extracting keywords")
    };
    let mut outcomes = runner.run_with_progress(
        sources,
        |(_, source): &(usize, TextSource)| extractor.extract(source),
        Some(Output::progress_reporter(&pb)),
    )?;
    pb.finish_and_clear();

    outcomes.sort_by_key(|outcome| outcome.item.0);
    let summary = BatchSummary::of(&outcomes);

    if ctx.is_json() {
        let entries: Vec<_> = outcomes
            .iter()
            .map(|outcome| match &outcome.result {
                Ok(report) => json!({
                    "source": report.source,
                    "status": "success",
                    "total_tokens": report.total_tokens,
                    "keywords": report.keywords,
                }),
                Err(failure) => json!({
                    "source": outcome.item.1.label(),
                    "status": "error",
                    "error": failure.to_string(),
                }),
            })
            .collect();
        ctx.print_json(&entries)?;
    } else {
        let output = &ctx.output;
        for outcome in &outcomes {
            if let Ok(report) = &outcome.result {
                output.section_header(&format!(
                    "{} ({} tokens)",
                    report.source, report.total_tokens
                ));
                if report.keywords.is_empty() {
                    output.list_item("no keywords");
                }
                for (rank, keyword) in report.keywords.iter().enumerate() {
                    output.ranked_item(rank + 1, &keyword.keyword, keyword.count);
                }
            }
        }

        for outcome in outcomes.iter().filter(|o| !o.is_success()) {
            if let Some(failure) = outcome.failure() {
                output.error(&format!("{}: {}", outcome.item.1.label(), failure));
            }
        }

        output.section_header("Summary");
        output.summary_stats("Texts analyzed:", summary.succeeded);
        output.summary_stats("Failed:", summary.failed);
        if summary.failed > 0 && summary.succeeded > 0 {
            output.warning(&format!("{} of {} text(s) failed", summary.failed, summary.total));
        }
    }

    ensure_any_succeeded(outcomes)?;
    Ok(())
}
