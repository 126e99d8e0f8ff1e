//! TF-IDF vectors and cosine similarity.
//!
//! Document vectors use length-normalized tf (`count / total_tokens`), query
//! vectors use the raw count. Both are scored against the same IDF table.

use crate::idf::IdfTable;
use crate::tokenizer::normalize;
use std::collections::{BTreeMap, HashMap};

/// Sparse term -> weight vector. Ordered so dot products sum in a fixed order.
pub type SparseVector = BTreeMap<String, f64>;

fn term_counts(tokens: Vec<String>) -> HashMap<String, u32> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for term in tokens {
        *counts.entry(term).or_insert(0) += 1;
    }
    counts
}

/// TF-IDF vector of one document. Terms unknown to `idf` are skipped.
pub fn document_vector(text: &str, idf: &IdfTable) -> SparseVector {
    let tokens = normalize(text);
    let total = tokens.len();
    if total == 0 {
        return SparseVector::new();
    }
    term_counts(tokens)
        .into_iter()
        .filter_map(|(term, tf)| {
            let weight = idf.get(&term)?;
            Some((term, (tf as f64 / total as f64) * weight))
        })
        .collect()
}

/// Vectors for a whole corpus; position in the result is the doc_id.
pub fn document_vectors<S: AsRef<str>>(documents: &[S], idf: &IdfTable) -> Vec<SparseVector> {
    documents.iter().map(|doc| document_vector(doc.as_ref(), idf)).collect()
}

/// Query vector with raw (not length-normalized) term frequency.
pub fn query_vector(query: &str, idf: &IdfTable) -> SparseVector {
    term_counts(normalize(query))
        .into_iter()
        .filter_map(|(term, tf)| {
            let weight = idf.get(&term)?;
            Some((term, tf as f64 * weight))
        })
        .collect()
}

pub fn norm(v: &SparseVector) -> f64 {
    v.values().map(|w| w * w).sum::<f64>().sqrt()
}

/// Cosine similarity over the union of both key sets. Missing terms weigh 0,
/// so only shared terms contribute to the dot product. Returns 0 when either
/// vector has zero norm.
pub fn cosine_similarity(u: &SparseVector, v: &SparseVector) -> f64 {
    let (nu, nv) = (norm(u), norm(v));
    if nu == 0.0 || nv == 0.0 {
        return 0.0;
    }
    let (small, large) = if u.len() <= v.len() { (u, v) } else { (v, u) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|x| w * x))
        .sum();
    dot / (nu * nv)
}

/// The `k` heaviest terms of a vector, heaviest first; ties keep term order.
pub fn top_terms(v: &SparseVector, k: usize) -> Vec<(String, f64)> {
    let mut terms: Vec<(String, f64)> = v.iter().map(|(t, w)| (t.clone(), *w)).collect();
    terms.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    terms.truncate(k);
    terms
}
