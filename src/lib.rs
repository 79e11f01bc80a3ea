//! # seoscan - parallel keyword extraction and page analysis
//!
//! seoscan runs independent work items (texts to tokenize, URLs to fetch) on a
//! bounded pool of worker threads and collects one outcome per item, whatever
//! happens to the others.
//!
//! ## Features
//!
//! - **Bounded parallelism**: at most N items in flight, N derived from the
//!   available processing units (75% by default) or set explicitly
//! - **Failure isolation**: errors and panics are recorded per item
//! - **Keyword ranking**: whitespace or SEO tokenization with stop words
//! - **Page analysis**: bounded-timeout fetches, sitemap discovery and an
//!   on-page SEO audit
//!
//! ## Quick Start
//!
//! ```bash
//! # Top keywords of a few files
//! seoscan keywords README.md CHANGELOG.md
//!
//! # Fetch and audit every page listed in a sitemap, 8 at a time
//! seoscan --workers 8 pages --sitemap https://example.com --audit
//! ```

pub mod cli;
pub mod config;
pub mod keywords;
pub mod logging;
pub mod page;
pub mod parallel;

pub use cli::{Cli, Output};
pub use config::SeoscanConfig;

/// Result type alias for seoscan operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
