use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};

use super::stopwords::is_stop_word;

/// Number of keywords reported per text unless configured otherwise.
pub const DEFAULT_TOP_N: usize = 10;

lazy_static! {
    static ref POSSESSIVE: Regex = Regex::new(r"(?i)'s\b").unwrap();
    static ref CONTRACTIONS: [(Regex, &'static str); 6] = [
        (Regex::new(r"(?i)n't\b").unwrap(), " not"),
        (Regex::new(r"(?i)'re\b").unwrap(), " are"),
        (Regex::new(r"(?i)'ve\b").unwrap(), " have"),
        (Regex::new(r"(?i)'ll\b").unwrap(), " will"),
        (Regex::new(r"(?i)'d\b").unwrap(), " would"),
        (Regex::new(r"(?i)'m\b").unwrap(), " am"),
    ];
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s']").unwrap();
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// How text is split into tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Tokenizer {
    /// Split on whitespace, keep tokens verbatim
    #[default]
    Whitespace,
    /// Lowercase, expand contractions, drop stop words and non-alphabetic
    /// tokens, stem what is left
    Seo,
}

/// A token and how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: usize,
}

impl KeywordCount {
    pub fn as_pair(&self) -> (&str, usize) {
        (self.keyword.as_str(), self.count)
    }
}

/// Rank tokens by frequency, descending. Ties keep first-occurrence order.
pub fn rank_tokens<I>(tokens: I) -> Vec<KeywordCount>
where
    I: IntoIterator<Item = String>,
{
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<KeywordCount> = Vec::new();

    for token in tokens {
        match positions.get(&token) {
            Some(&pos) => counts[pos].count += 1,
            None => {
                positions.insert(token.clone(), counts.len());
                counts.push(KeywordCount {
                    keyword: token,
                    count: 1,
                });
            }
        }
    }

    // sort_by is stable
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// The `n` most frequent whitespace-separated tokens of `text`.
pub fn top_keywords(text: &str, n: usize) -> Vec<KeywordCount> {
    let mut ranked = rank_tokens(text.split_whitespace().map(str::to_string));
    ranked.truncate(n);
    ranked
}

#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    tokenizer: Tokenizer,
    top_n: usize,
    extra_stop_words: HashSet<String>,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(Tokenizer::default())
    }
}

impl KeywordExtractor {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            top_n: DEFAULT_TOP_N,
            extra_stop_words: HashSet::new(),
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Extra stop words, only applied by the SEO tokenizer.
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extra_stop_words
            .extend(words.into_iter().map(|w| w.as_ref().to_lowercase()));
        self
    }

    #[inline]
    pub fn tokenizer(&self) -> Tokenizer {
        self.tokenizer
    }

    #[inline]
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        match self.tokenizer {
            Tokenizer::Whitespace => text.split_whitespace().map(str::to_string).collect(),
            Tokenizer::Seo => self.seo_tokens(text),
        }
    }

    /// Every distinct token, ranked.
    pub fn count(&self, text: &str) -> Vec<KeywordCount> {
        rank_tokens(self.tokenize(text))
    }

    /// The first `top_n` ranked tokens.
    pub fn top_keywords(&self, text: &str) -> Vec<KeywordCount> {
        let mut ranked = self.count(text);
        ranked.truncate(self.top_n);
        ranked
    }

    pub fn word_count(&self, text: &str) -> usize {
        self.tokenize(text).len()
    }

    fn seo_tokens(&self, text: &str) -> Vec<String> {
        let mut cleaned = POSSESSIVE.replace_all(text, "").into_owned();
        for (pattern, expansion) in CONTRACTIONS.iter() {
            cleaned = pattern.replace_all(&cleaned, *expansion).into_owned();
        }
        let cleaned = NON_WORD.replace_all(&cleaned, " ");

        cleaned
            .split_whitespace()
            .map(|tok| tok.trim_matches('\'').to_lowercase())
            .filter(|tok| tok.chars().count() > 1 && tok.chars().all(char::is_alphabetic))
            .filter(|tok| !is_stop_word(tok) && !self.extra_stop_words.contains(tok))
            .map(|tok| STEMMER.stem(&tok).into_owned())
            .collect()
    }
}
