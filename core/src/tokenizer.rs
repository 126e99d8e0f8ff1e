use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

/// Tokens shorter than this (in chars) are never indexed.
pub const MIN_TOKEN_LEN: usize = 3;

lazy_static! {
    static ref PUNCT: Regex = Regex::new(r"[^\w\s]").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    // Apostrophe forms ("don't") never survive punctuation replacement, so only
    // the bare stems are listed.
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a", "about", "above", "after", "again", "against", "ain", "all", "am", "an", "and",
            "any", "are", "aren", "as", "at", "be", "because", "been", "before", "being", "below",
            "between", "both", "but", "by", "can", "couldn", "d", "did", "didn", "do", "does",
            "doesn", "doing", "don", "down", "during", "each", "few", "for", "from", "further",
            "had", "hadn", "has", "hasn", "have", "haven", "having", "he", "her", "here", "hers",
            "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "isn", "it",
            "its", "itself", "just", "ll", "m", "ma", "me", "mightn", "more", "most", "mustn",
            "my", "myself", "needn", "no", "nor", "not", "now", "o", "of", "off", "on", "once",
            "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "re", "s",
            "same", "shan", "she", "should", "shouldn", "so", "some", "such", "t", "than", "that",
            "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they",
            "this", "those", "through", "to", "too", "under", "until", "up", "ve", "very", "was",
            "wasn", "we", "were", "weren", "what", "when", "where", "which", "while", "who",
            "whom", "why", "will", "with", "won", "wouldn", "y", "you", "your", "yours",
            "yourself", "yourselves"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Normalize text into index terms: NFKC, lowercase, punctuation to spaces,
/// whitespace split, stopword and length filtering, then English stemming.
///
/// Order is preserved and duplicates are kept, so the output length is the
/// document's token count used for tf normalization.
pub fn normalize(text: &str) -> Vec<String> {
    let lowered = text.nfkc().collect::<String>().to_lowercase();
    let cleaned = PUNCT.replace_all(&lowered, " ");
    cleaned
        .split_whitespace()
        .filter(|token| token.chars().count() >= MIN_TOKEN_LEN && !is_stopword(token))
        .map(|token| STEMMER.stem(token).into_owned())
        .collect()
}
