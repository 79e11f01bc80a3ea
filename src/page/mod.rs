//! Page fetching and on-page analysis
//!
//! [`PageAnalyzer`] is the worker function for URL batches: it performs one
//! bounded-timeout GET through an [`HttpFetch`] implementation and always
//! returns a [`PageReport`], never an error. [`SeoAudit`] scores the fetched
//! HTML, [`sitemap`] discovers URLs for a whole site and [`export`] writes
//! CSV and HTML report files.

pub mod export;
pub mod fetcher;
pub mod report;
pub mod seo;
pub mod sitemap;

pub use export::{ExportError, ReportFiles, write_reports};
pub use fetcher::{FetchError, HttpConfig, HttpFetch, ReqwestFetcher};
pub use report::{PageAnalyzer, PageOutcome, PageReport, PageResult};
pub use seo::SeoAudit;
pub use sitemap::{SitemapCollector, SitemapConfig, SitemapDocument, SitemapError};
