use std::collections::HashSet;
use std::convert::Infallible;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;

use super::CommandContext;
use crate::cli::Output;
use crate::page::seo::MAX_SCORE;
use crate::page::{
    PageAnalyzer, PageReport, PageResult, ReqwestFetcher, SeoAudit, SitemapCollector, write_reports,
};
use crate::parallel::{RunnerError, TaskOutcome};

#[derive(Args)]
pub struct PagesArgs {
    /// URLs to fetch
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Read additional URLs from a file (one per line, '#' starts a comment)
    #[arg(long, value_name = "FILE")]
    pub url_file: Option<PathBuf>,

    /// Discover URLs from the sitemap of BASE_URL, crawling its links when it has none
    #[arg(long, value_name = "BASE_URL")]
    pub sitemap: Option<String>,

    /// Run the on-page SEO audit on every fetched page
    #[arg(long)]
    pub audit: bool,

    /// Also write seo_report_<host>.csv and seo_report_<host>.html into DIR
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,
}

pub fn execute(args: PagesArgs, ctx: &CommandContext) -> Result<()> {
    let fetcher = ReqwestFetcher::new(&ctx.config.http)?;

    let mut urls = args.urls.clone();
    if let Some(path) = &args.url_file {
        urls.extend(read_url_file(path)?);
    }
    if let Some(base) = &args.sitemap {
        let collector = SitemapCollector::new(&fetcher, ctx.config.sitemap.clone());
        let found = collector.gather(base)?;
        ctx.output
            .info(&format!("Found {} URL(s) in the sitemap of {}", found.len(), base));
        urls.extend(found);
    }

    let urls = dedupe(urls);
    if urls.is_empty() {
        bail!("No URLs to fetch: pass URLs, --url-file or --sitemap");
    }

    let runner = ctx.runner()?;
    tracing::info!("Fetching {} page(s) with {} worker(s)", urls.len(), runner.workers());

    let analyzer = PageAnalyzer::new(&fetcher);
    let keywords = &ctx.config.keywords;
    let audit = args.audit;

    let pb = if ctx.is_json() {
        indicatif::ProgressBar::hidden()
    } else {
        ctx.output.progress_bar(urls.len(), "Fetching pages")
    };
    let items: Vec<(usize, String)> = urls.into_iter().enumerate().collect();
    let mut outcomes = runner.run_with_progress(
        items,
        |(_, url): &(usize, String)| -> Result<PageResult, Infallible> {
            let report = analyzer.analyze(url);
            let audit = audit
                .then(|| report.content().map(|html| SeoAudit::from_html(url, html, keywords)))
                .flatten();
            Ok(PageResult { report, audit })
        },
        Some(Output::progress_reporter(&pb)),
    )?;
    pb.finish_and_clear();
    outcomes.sort_by_key(|outcome| outcome.item.0);

    let succeeded = outcomes.iter().filter(|o| page_succeeded(o)).count();
    let total = outcomes.len();

    let results: Vec<PageResult> = outcomes
        .into_iter()
        .map(|outcome| match outcome.result {
            Ok(result) => result,
            Err(failure) => PageResult {
                report: PageReport::error(outcome.item.1, failure.to_string()),
                audit: None,
            },
        })
        .collect();

    if ctx.is_json() {
        ctx.print_json(&results)?;
    } else {
        print_text(&ctx.output, &results);
        ctx.output.section_header("Summary");
        ctx.output.summary_stats("Succeeded:", succeeded);
        ctx.output.summary_stats("Failed:", total - succeeded);
    }

    if let Some(dir) = &args.report_dir {
        let files = write_reports(dir, &results)
            .with_context(|| format!("Failed to write reports to {}", dir.display()))?;
        if !ctx.is_json() {
            ctx.output.success(&format!("CSV report: {}", files.csv.display()));
            ctx.output.success(&format!("HTML report: {}", files.html.display()));
        }
    }

    if succeeded == 0 {
        return Err(RunnerError::AllTasksFailed { total }.into());
    }
    Ok(())
}

fn page_succeeded(outcome: &TaskOutcome<(usize, String), PageResult>) -> bool {
    outcome
        .result
        .as_ref()
        .map(|r| r.report.is_success())
        .unwrap_or(false)
}

fn print_text(output: &Output, results: &[PageResult]) {
    for result in results {
        let url = &result.report.url;
        match (result.report.content(), result.report.error_message()) {
            (Some(content), _) => output.success(&format!("{url} ({} bytes)", content.len())),
            (_, Some(error)) => output.error(&format!("{url}: {error}")),
            _ => {}
        }

        if let Some(audit) = &result.audit {
            output.key_value("Score:", &format!("{}/{}", audit.score, MAX_SCORE), true);
            output.key_value("Title:", &audit.title, false);
            output.key_value("Words:", &audit.word_count.to_string(), false);
            output.key_value(
                "Headings:",
                &format!("h1={} h2={} h3={}", audit.h1_count, audit.h2_count, audit.h3_count),
                false,
            );
            let keywords: Vec<String> = audit
                .keywords
                .iter()
                .map(|k| format!("{}({})", k.keyword, k.count))
                .collect();
            output.key_value("Keywords:", &keywords.join(", "), false);
            for recommendation in &audit.recommendations {
                output.list_item(recommendation);
            }
        }
    }
}

fn read_url_file(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read URL file {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn dedupe(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty() && seen.insert(u.clone()))
        .collect()
}
