//! Keyword frequency extraction
//!
//! Turns a text into a ranked list of `(keyword, count)` pairs. Two tokenizers
//! are available: a plain whitespace split, and an SEO-oriented one that
//! lowercases, expands contractions and drops English stop words.
//!
//! Work items for the parallel runner are [`TextSource`]s, so reading a file
//! happens inside the worker and an unreadable file fails only its own item.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod extractor;
pub mod stopwords;

pub use extractor::{
    DEFAULT_TOP_N, KeywordCount, KeywordExtractor, Tokenizer, rank_tokens, top_keywords,
};

#[derive(Debug, Error)]
pub enum KeywordError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where a text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSource {
    File(PathBuf),
    /// Text passed on the command line; `index` is its position among them.
    Inline { index: usize, text: String },
}

impl TextSource {
    pub fn label(&self) -> String {
        match self {
            TextSource::File(path) => path.display().to_string(),
            TextSource::Inline { index, .. } => format!("text #{}", index + 1),
        }
    }

    pub fn read(&self) -> Result<String, KeywordError> {
        match self {
            TextSource::File(path) => fs::read_to_string(path).map_err(|source| KeywordError::Read {
                path: path.clone(),
                source,
            }),
            TextSource::Inline { text, .. } => Ok(text.clone()),
        }
    }
}

impl fmt::Display for TextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Keyword ranking for one text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordReport {
    pub source: String,
    pub total_tokens: usize,
    pub keywords: Vec<KeywordCount>,
}

impl KeywordExtractor {
    pub fn from_config(config: &KeywordsConfig) -> Self {
        KeywordExtractor::new(config.tokenizer)
            .with_top_n(config.top_n)
            .with_stop_words(&config.extra_stop_words)
    }

    pub fn report(&self, source: impl Into<String>, text: &str) -> KeywordReport {
        let ranked = self.count(text);
        let total_tokens = ranked.iter().map(|k| k.count).sum();
        KeywordReport {
            source: source.into(),
            total_tokens,
            keywords: ranked.into_iter().take(self.top_n()).collect(),
        }
    }

    /// Worker function for a [`TextSource`].
    pub fn extract(&self, source: &TextSource) -> Result<KeywordReport, KeywordError> {
        let text = source.read()?;
        Ok(self.report(source.label(), &text))
    }
}

/// `[keywords]` configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordsConfig {
    pub tokenizer: Tokenizer,
    pub top_n: usize,
    pub extra_stop_words: Vec<String>,
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            tokenizer: Tokenizer::default(),
            top_n: DEFAULT_TOP_N,
            extra_stop_words: Vec::new(),
        }
    }
}
