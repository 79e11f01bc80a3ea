use std::collections::HashSet;

use lazy_static::lazy_static;

const RAW_STOP_WORDS: &str = "
a about above after again against all am an and any are as at be because been before
being below between both but by can could did do does doing down during each few for from
further had has have having he her here hers herself him himself his how i if in into is
it its itself just me more most my myself no nor not now of off on once only or other our
ours ourselves out over own same she should so some such than that the their theirs them
themselves then there these they this those through to too under until up very was we well were
what when where which while who whom why will with would you your yours yourself yourselves
also another
";

lazy_static! {
    /// English stop words filtered by the SEO tokenizer.
    pub static ref STOP_WORDS: HashSet<&'static str> = RAW_STOP_WORDS
        .split_whitespace()
        .chain(["s", "t", "u", "v", "w", "x", "y", "z"])
        .collect();
}

#[inline]
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_words_are_stop_words() {
        for word in ["the", "and", "is", "would", "also", "x"] {
            assert!(is_stop_word(word), "{word} should be a stop word");
        }
    }

    #[test]
    fn content_words_are_kept() {
        for word in ["rust", "keyword", "sitemap"] {
            assert!(!is_stop_word(word));
        }
    }
}
