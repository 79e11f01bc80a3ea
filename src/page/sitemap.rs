//! Sitemap discovery
//!
//! Collects page URLs for a site from `/sitemap.xml` (then
//! `/sitemap_index.xml`), following nested sitemap indexes breadth-first.
//! Fetches are retried with exponential backoff; a sitemap that never loads
//! is skipped. When no sitemap yields anything, internal `<a href>` links are
//! crawled breadth-first up to `crawl_depth` hops from the base URL.

use std::collections::{HashSet, VecDeque};
use std::thread;
use std::time::Duration;

use lazy_static::lazy_static;
use quick_xml::Reader;
use quick_xml::events::Event;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use super::fetcher::{FetchError, HttpFetch};

/// Tried in order until one yields page URLs.
const SITEMAP_PATHS: &[&str] = &["/sitemap.xml", "/sitemap_index.xml"];

lazy_static! {
    static ref ANCHOR: Selector = Selector::parse("a[href]").unwrap();
}

#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("invalid base URL {url}: {reason}")]
    InvalidBase { url: String, reason: String },

    #[error("document is neither a <urlset> nor a <sitemapindex>")]
    UnrecognizedDocument,

    #[error("malformed sitemap XML: {0}")]
    Malformed(String),

    #[error("giving up on {url} after {attempts} attempt(s): {source}")]
    Exhausted {
        url: String,
        attempts: u32,
        #[source]
        source: FetchError,
    },
}

/// `[sitemap]` configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SitemapConfig {
    pub max_pages: usize,
    /// Attempts per sitemap document.
    pub retries: u32,
    /// First retry delay; doubled on every further attempt.
    pub backoff_ms: u64,
    pub ignored_extensions: Vec<String>,
    /// Links whose path contains one of these words are dropped.
    pub excluded_words: Vec<String>,
    pub respect_robots: bool,
    /// Link-crawl depth used when no sitemap is found; 0 disables crawling.
    pub crawl_depth: u32,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            max_pages: 100,
            retries: 3,
            backoff_ms: 1000,
            ignored_extensions: [
                ".jpg", ".jpeg", ".png", ".gif", ".svg", ".bmp", ".pdf", ".zip", ".exe", ".rar",
                ".gz", ".tgz", ".mp4", ".avi",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            excluded_words: ["terms", "privacy", "login", "signup"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            respect_robots: true,
            crawl_depth: 2,
        }
    }
}

/// Parsed sitemap: page URLs from a `<urlset>`, child sitemaps from a
/// `<sitemapindex>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapDocument {
    pub urls: Vec<String>,
    pub sitemaps: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SitemapKind {
    UrlSet,
    Index,
}

pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, SitemapError> {
    let malformed = |e: &dyn std::fmt::Display| SitemapError::Malformed(e.to_string());

    let mut reader = Reader::from_str(xml);
    let mut document = SitemapDocument::default();
    let mut kind: Option<SitemapKind> = None;
    let mut in_entry = false;
    let mut loc: Option<String> = None;

    loop {
        match reader.read_event().map_err(|e| malformed(&e))? {
            Event::Start(e) => {
                let name = e.local_name();
                match (kind, name.as_ref()) {
                    (None, b"urlset") => kind = Some(SitemapKind::UrlSet),
                    (None, b"sitemapindex") => kind = Some(SitemapKind::Index),
                    (None, _) => return Err(SitemapError::UnrecognizedDocument),
                    (Some(SitemapKind::UrlSet), b"url") | (Some(SitemapKind::Index), b"sitemap") => {
                        in_entry = true
                    }
                    (Some(_), b"loc") if in_entry => loc = Some(String::new()),
                    _ => {}
                }
            }
            Event::Text(text) => {
                if let Some(buf) = loc.as_mut() {
                    buf.push_str(&text.unescape().map_err(|e| malformed(&e))?);
                }
            }
            Event::CData(data) => {
                if let Some(buf) = loc.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"loc" => {
                    let value = loc.take().unwrap_or_default();
                    let value = value.trim();
                    if value.is_empty() {
                        continue;
                    }
                    match kind {
                        Some(SitemapKind::UrlSet) => document.urls.push(value.to_string()),
                        Some(SitemapKind::Index) => document.sitemaps.push(value.to_string()),
                        None => {}
                    }
                }
                b"url" | b"sitemap" => in_entry = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if kind.is_none() {
        return Err(SitemapError::UnrecognizedDocument);
    }
    Ok(document)
}

/// `Disallow:` rules of the groups addressed to `*`, resolved against `base`.
///
/// Consecutive `User-agent` lines share one group.
pub fn parse_robots(text: &str, base: &Url) -> Vec<String> {
    let mut disallowed = Vec::new();
    let mut applies = false;
    let mut reading_agents = false;

    for line in text.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "user-agent" => {
                if !reading_agents {
                    applies = false;
                }
                applies |= value == "*";
                reading_agents = true;
            }
            "disallow" => {
                reading_agents = false;
                if applies && !value.is_empty() {
                    if let Ok(url) = base.join(value) {
                        disallowed.push(url.to_string());
                    }
                }
            }
            _ => reading_agents = false,
        }
    }
    disallowed
}

/// Absolute http(s) targets of every `<a href>` in `html`, fragments removed.
pub fn page_links(html: &str, page_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| page_url.join(href.trim()).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(|mut url| {
            url.set_fragment(None);
            url
        })
        .collect()
}

/// Keep crawlable page links: http(s) only, no ignored file types, no
/// excluded words in the path, nothing under a disallowed prefix. Order is
/// preserved and duplicates are dropped.
pub fn filter_links<I, S>(links: I, config: &SitemapConfig, disallowed: &[String]) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter_map(|link| {
            let link = link.as_ref().trim();
            let parsed = Url::parse(link).ok()?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return None;
            }

            let path = parsed.path().to_lowercase();
            if config
                .ignored_extensions
                .iter()
                .any(|ext| path.ends_with(&ext.to_lowercase()))
            {
                return None;
            }
            if config
                .excluded_words
                .iter()
                .any(|word| path.contains(&word.to_lowercase()))
            {
                return None;
            }
            if disallowed.iter().any(|prefix| link.starts_with(prefix.as_str())) {
                return None;
            }
            Some(link.to_string())
        })
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

pub struct SitemapCollector<F> {
    fetcher: F,
    config: SitemapConfig,
}

impl<F: HttpFetch> SitemapCollector<F> {
    pub fn new(fetcher: F, config: SitemapConfig) -> Self {
        Self { fetcher, config }
    }

    /// Page URLs for `base_url`, at most `max_pages`.
    ///
    /// Only an unusable base URL is an error; unreachable or malformed
    /// sitemaps are logged and skipped.
    pub fn gather(&self, base_url: &str) -> Result<Vec<String>, SitemapError> {
        let invalid = |reason: String| SitemapError::InvalidBase {
            url: base_url.to_string(),
            reason,
        };
        let base = Url::parse(base_url.trim_end_matches('/')).map_err(|e| invalid(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid("not a hierarchical URL".to_string()));
        }

        let disallowed = if self.config.respect_robots {
            self.robots_rules(&base)
        } else {
            Vec::new()
        };

        let mut visited: HashSet<String> = HashSet::new();
        let mut links: Vec<String> = Vec::new();
        for path in SITEMAP_PATHS {
            let root = base.join(path).map_err(|e| invalid(e.to_string()))?;
            self.walk_sitemaps(root.to_string(), &mut visited, &mut links, &disallowed);
            if !links.is_empty() {
                break;
            }
        }

        if links.is_empty() && self.config.crawl_depth > 0 {
            tracing::warn!("No sitemap found for {}, falling back to link crawling", base);
            links = self.crawl(&base, &disallowed);
        }

        links.truncate(self.config.max_pages);
        tracing::info!("Collected {} page URL(s) from {}", links.len(), base);
        Ok(links)
    }

    fn walk_sitemaps(
        &self,
        root: String,
        visited: &mut HashSet<String>,
        links: &mut Vec<String>,
        disallowed: &[String],
    ) {
        let mut queue = VecDeque::from([root]);

        while let Some(sitemap_url) = queue.pop_front() {
            if links.len() >= self.config.max_pages {
                break;
            }
            if !visited.insert(sitemap_url.clone()) {
                continue;
            }

            tracing::info!("Fetching sitemap: {}", sitemap_url);
            let xml = match self.fetch_with_retry(&sitemap_url) {
                Ok(xml) => xml,
                Err(e) => {
                    tracing::error!("{}", e);
                    continue;
                }
            };

            let document = match parse_sitemap(&xml) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", sitemap_url, e);
                    continue;
                }
            };

            queue.extend(document.sitemaps);
            links.extend(document.urls);
            *links = filter_links(links.iter(), &self.config, disallowed);
        }
    }

    /// Breadth-first walk of same-host links starting at `base`.
    fn crawl(&self, base: &Url, disallowed: &[String]) -> Vec<String> {
        let mut queue = VecDeque::from([(base.clone(), 0_u32)]);
        let mut visited: HashSet<String> = HashSet::new();
        let mut pages: Vec<String> = Vec::new();

        while let Some((page, depth)) = queue.pop_front() {
            if pages.len() >= self.config.max_pages {
                break;
            }
            if !visited.insert(page.to_string()) {
                continue;
            }

            tracing::info!("Crawling {} (depth {})", page, depth);
            let html = match self.fetcher.get(page.as_str()) {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!("Error during crawl of {}: {}", page, e);
                    continue;
                }
            };
            pages.push(page.to_string());

            if depth >= self.config.crawl_depth {
                continue;
            }
            let internal: Vec<Url> = page_links(&html, &page)
                .into_iter()
                .filter(|link| link.host_str() == base.host_str())
                .collect();
            let kept = filter_links(internal.iter().map(Url::as_str), &self.config, disallowed);
            for link in kept {
                if let Ok(url) = Url::parse(&link) {
                    queue.push_back((url, depth + 1));
                }
            }
        }

        pages
    }

    fn fetch_with_retry(&self, url: &str) -> Result<String, SitemapError> {
        let attempts = self.config.retries.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            match self.fetcher.get(url) {
                Ok(body) => return Ok(body),
                Err(e) => {
                    tracing::warn!("Attempt {} for {} failed: {}", attempt + 1, url, e);
                    last_error = Some(e);
                    if attempt + 1 < attempts {
                        thread::sleep(self.backoff(attempt));
                    }
                }
            }
        }

        Err(SitemapError::Exhausted {
            url: url.to_string(),
            attempts,
            source: last_error.unwrap_or_else(|| FetchError::Transport {
                url: url.to_string(),
                message: "no attempt made".to_string(),
            }),
        })
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt);
        Duration::from_millis(self.config.backoff_ms.saturating_mul(factor))
    }

    fn robots_rules(&self, base: &Url) -> Vec<String> {
        let Ok(robots_url) = base.join("/robots.txt") else {
            return Vec::new();
        };
        match self.fetcher.get(robots_url.as_str()) {
            Ok(text) => {
                let rules = parse_robots(&text, base);
                tracing::info!("robots.txt parsed: {} disallowed path(s)", rules.len());
                rules
            }
            Err(e) => {
                tracing::warn!("Failed to fetch robots.txt: {}", e);
                Vec::new()
            }
        }
    }
}
