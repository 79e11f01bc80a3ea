//! On-page SEO audit of a fetched HTML document
//!
//! The document is parsed with `scraper`, so comments, entities and sloppy
//! markup are handled the way a browser would. The audit never fails;
//! missing elements simply score nothing.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Node, Selector};
use serde::Serialize;

use crate::keywords::{KeywordCount, KeywordExtractor, KeywordsConfig, Tokenizer};

pub const AUDIT_KEYWORDS: usize = 5;
pub const MAX_SCORE: u32 = 45;

const MIN_WORDS: usize = 300;

/// Elements whose text is never rendered.
const HIDDEN_ELEMENTS: &[&str] = &["head", "script", "style", "noscript", "template"];

lazy_static! {
    static ref TITLE: Selector = Selector::parse("title").unwrap();
    static ref META_NAMED: Selector = Selector::parse("meta[name]").unwrap();
    static ref H1: Selector = Selector::parse("h1").unwrap();
    static ref H2: Selector = Selector::parse("h2").unwrap();
    static ref H3: Selector = Selector::parse("h3").unwrap();
    static ref IMG: Selector = Selector::parse("img").unwrap();
    static ref LINK_REL: Selector = Selector::parse("link[rel]").unwrap();
    static ref SCRIPT_TYPED: Selector = Selector::parse("script[type]").unwrap();
}

/// Extractor used by the audit: SEO tokenization whatever `keywords.tokenizer`
/// says, with the configured extra stop words.
pub fn audit_extractor(keywords: &KeywordsConfig) -> KeywordExtractor {
    KeywordExtractor::new(Tokenizer::Seo)
        .with_top_n(AUDIT_KEYWORDS)
        .with_stop_words(&keywords.extra_stop_words)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeoAudit {
    pub url: String,
    pub title: String,
    pub meta_description: String,
    pub h1_count: usize,
    pub h2_count: usize,
    pub h3_count: usize,
    pub images_missing_alt: usize,
    pub has_canonical: bool,
    pub has_structured_data: bool,
    pub word_count: usize,
    pub keywords: Vec<KeywordCount>,
    pub score: u32,
    pub recommendations: Vec<String>,
}

impl SeoAudit {
    pub fn from_html(url: &str, html: &str, keywords: &KeywordsConfig) -> Self {
        let document = Html::parse_document(html);
        let extractor = audit_extractor(keywords);
        let text = document_text(&document);

        let mut audit = SeoAudit {
            url: url.to_string(),
            title: extract_title(&document),
            meta_description: extract_meta_description(&document),
            h1_count: document.select(&H1).count(),
            h2_count: document.select(&H2).count(),
            h3_count: document.select(&H3).count(),
            images_missing_alt: count_images_missing_alt(&document),
            has_canonical: has_canonical(&document),
            has_structured_data: has_json_ld(&document),
            word_count: extractor.word_count(&text),
            keywords: extractor.top_keywords(&text),
            score: 0,
            recommendations: Vec::new(),
        };
        audit.apply_scoring();
        audit
    }

    fn apply_scoring(&mut self) {
        let mut score = 0;
        let mut recommendations = Vec::new();

        if (50..=60).contains(&self.title.chars().count()) {
            score += 10;
        } else {
            recommendations.push("Title should be 50-60 characters.".to_string());
        }

        if (120..=160).contains(&self.meta_description.chars().count()) {
            score += 10;
        } else {
            recommendations.push("Meta description should be 120-160 characters.".to_string());
        }

        if self.word_count >= MIN_WORDS {
            score += 10;
        } else {
            recommendations.push(format!("Content should have at least {MIN_WORDS} words."));
        }

        if self.h1_count > 0 {
            score += 10;
        } else {
            recommendations.push("Add at least one H1 tag.".to_string());
        }

        if self.h2_count > 0 {
            score += 5;
        } else {
            recommendations.push("Add at least one H2 tag.".to_string());
        }

        if self.images_missing_alt > 0 {
            recommendations.push(format!(
                "Add alt text to {} image(s).",
                self.images_missing_alt
            ));
        }

        self.score = score;
        self.recommendations = recommendations;
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn extract_title(document: &Html) -> String {
    document
        .select(&TITLE)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

fn extract_meta_description(document: &Html) -> String {
    document
        .select(&META_NAMED)
        .find(|meta| {
            meta.value()
                .attr("name")
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("description"))
        })
        .and_then(|meta| meta.value().attr("content"))
        .map(collapse_whitespace)
        .unwrap_or_default()
}

fn count_images_missing_alt(document: &Html) -> usize {
    document
        .select(&IMG)
        .filter(|img| img.value().attr("alt").is_none_or(|alt| alt.trim().is_empty()))
        .count()
}

fn has_canonical(document: &Html) -> bool {
    document.select(&LINK_REL).any(|link| {
        link.value().attr("rel").is_some_and(|rel| {
            rel.split_ascii_whitespace()
                .any(|token| token.eq_ignore_ascii_case("canonical"))
        })
    })
}

fn has_json_ld(document: &Html) -> bool {
    document.select(&SCRIPT_TYPED).any(|script| {
        script
            .value()
            .attr("type")
            .is_some_and(|kind| kind.trim().eq_ignore_ascii_case("application/ld+json"))
    })
}

/// Rendered text of `document`: every text node outside head, scripts and
/// styles, whitespace collapsed.
fn document_text(document: &Html) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| HIDDEN_ELEMENTS.contains(&element.name()))
        });
        if !hidden {
            parts.push(text);
        }
    }
    collapse_whitespace(&parts.join(" "))
}

/// Body text with markup, scripts and styles removed and entities decoded.
pub fn visible_text(html: &str) -> String {
    document_text(&Html::parse_document(html))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
