//! Configuration management for seoscan
//!
//! Settings are merged from the embedded `default-config.toml`, the user and
//! repository config files, an optional `--config` file and `SEOSCAN_*`
//! environment variables, then deserialized into [`SeoscanConfig`].

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

pub mod core;

use crate::keywords::KeywordsConfig;
use crate::logging::LoggingSettings;
use crate::page::{HttpConfig, SitemapConfig};
use crate::parallel::WorkerPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoscanConfig {
    /// Worker-count policy for the parallel runner
    pub parallel: WorkerPolicy,

    /// Tokenizer and ranking settings
    pub keywords: KeywordsConfig,

    /// HTTP client settings for page fetches
    pub http: HttpConfig,

    /// Sitemap discovery settings
    pub sitemap: SitemapConfig,

    /// Log file location and format
    pub logging: LoggingSettings,
}

/// Output format for `config show`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl SeoscanConfig {
    pub fn load(custom_config: Option<&str>) -> Result<Self> {
        let config: SeoscanConfig = self::core::figment(custom_config)?
            .extract()
            .context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn worker_policy(&self) -> WorkerPolicy {
        self.parallel.clone()
    }

    pub fn validate(&self) -> Result<()> {
        self.parallel
            .validate()
            .context("Invalid [parallel] section")?;
        ensure!(self.keywords.top_n > 0, "keywords.top_n must be at least 1");
        ensure!(self.http.timeout_secs > 0, "http.timeout_secs must be at least 1");
        ensure!(self.sitemap.max_pages > 0, "sitemap.max_pages must be at least 1");
        ensure!(self.sitemap.retries > 0, "sitemap.retries must be at least 1");
        Ok(())
    }

    pub fn export(&self, format: ConfigFormat) -> Result<String> {
        Ok(match format {
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
        })
    }
}
