use crate::index::InvertedIndex;
use std::collections::HashMap;

/// Smoothed inverse document frequency per term.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdfTable {
    idf: HashMap<String, f64>,
}

impl IdfTable {
    /// `idf(t) = ln(N / (df(t) + 1)) + 1`. Empty when the index holds no documents.
    pub fn calculate(index: &InvertedIndex) -> Self {
        let n = index.num_docs();
        if n == 0 {
            return Self::default();
        }
        let idf = index
            .iter()
            .map(|(term, postings)| (term.clone(), smoothed_idf(n, postings.len())))
            .collect();
        Self { idf }
    }

    pub fn get(&self, term: &str) -> Option<f64> { self.idf.get(term).copied() }

    pub fn contains(&self, term: &str) -> bool { self.idf.contains_key(term) }

    pub fn len(&self) -> usize { self.idf.len() }

    pub fn is_empty(&self) -> bool { self.idf.is_empty() }
}

#[inline]
pub fn smoothed_idf(num_docs: usize, df: usize) -> f64 {
    (num_docs as f64 / (df as f64 + 1.0)).ln() + 1.0
}
