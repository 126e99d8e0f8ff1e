//! Inverted index: term -> posting list of raw term frequencies.

use crate::tokenizer::normalize;
use crate::{DocId, PostingList};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvertedIndex {
    postings: HashMap<String, PostingList>,
    /// Normalized token count per document, indexed by doc_id.
    doc_lengths: Vec<usize>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Build a fresh index. Document `i` of the corpus gets doc_id `i`.
    pub fn build<S: AsRef<str>>(corpus: &[S]) -> Self {
        let mut postings: HashMap<String, PostingList> = HashMap::new();
        let mut doc_lengths = Vec::with_capacity(corpus.len());

        for (position, text) in corpus.iter().enumerate() {
            let doc_id = position as DocId;
            let tokens = normalize(text.as_ref());
            doc_lengths.push(tokens.len());

            let mut tf_counts: HashMap<String, u32> = HashMap::new();
            for term in tokens {
                *tf_counts.entry(term).or_insert(0) += 1;
            }
            for (term, freq) in tf_counts {
                postings.entry(term).or_default().insert(doc_id, freq);
            }
        }

        Self { postings, doc_lengths }
    }

    pub fn postings(&self, term: &str) -> Option<&PostingList> {
        self.postings.get(term)
    }

    /// Number of documents containing `term`; 0 when unknown.
    pub fn document_frequency(&self, term: &str) -> usize {
        self.postings.get(term).map_or(0, |p| p.len())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PostingList)> {
        self.postings.iter()
    }

    /// All indexed terms, sorted.
    pub fn terms(&self) -> Vec<&str> {
        let mut terms: Vec<&str> = self.postings.keys().map(String::as_str).collect();
        terms.sort_unstable();
        terms
    }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn num_docs(&self) -> usize { self.doc_lengths.len() }

    pub fn doc_length(&self, doc_id: DocId) -> Option<usize> {
        self.doc_lengths.get(doc_id as usize).copied()
    }

    pub fn total_tokens(&self) -> usize { self.doc_lengths.iter().sum() }
}
