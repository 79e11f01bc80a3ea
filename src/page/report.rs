use serde::Serialize;

use super::fetcher::HttpFetch;
use super::seo::SeoAudit;

/// Result of fetching one page.
///
/// Serializes flat: `{"url": …, "status": "success", "content": …}` or
/// `{"url": …, "status": "error", "error": …}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageReport {
    pub url: String,
    #[serde(flatten)]
    pub outcome: PageOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PageOutcome {
    Success { content: String },
    Error { error: String },
}

/// A page report with its optional SEO audit, as printed and exported by `pages`.
#[derive(Debug, Serialize)]
pub struct PageResult {
    #[serde(flatten)]
    pub report: PageReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit: Option<SeoAudit>,
}

impl PageReport {
    pub fn success(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            outcome: PageOutcome::Success {
                content: content.into(),
            },
        }
    }

    pub fn error(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            outcome: PageOutcome::Error {
                error: error.into(),
            },
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, PageOutcome::Success { .. })
    }

    pub fn content(&self) -> Option<&str> {
        match &self.outcome {
            PageOutcome::Success { content } => Some(content),
            PageOutcome::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            PageOutcome::Error { error } => Some(error),
            PageOutcome::Success { .. } => None,
        }
    }
}

/// Fetches pages and folds every failure into the report.
#[derive(Debug, Clone)]
pub struct PageAnalyzer<F> {
    fetcher: F,
}

impl<F: HttpFetch> PageAnalyzer<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Never fails; transport and status errors become an error report.
    pub fn analyze(&self, url: &str) -> PageReport {
        match self.fetcher.get(url) {
            Ok(body) => {
                tracing::info!("Fetched {} ({} bytes)", url, body.len());
                PageReport::success(url, body)
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", url, e);
                PageReport::error(url, e.to_string())
            }
        }
    }
}
