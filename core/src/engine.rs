//! Search engine: an atomically swapped snapshot of every derived structure.
//!
//! A build computes the index, the IDF table and the document vectors off-lock
//! and then replaces the current [`IndexSnapshot`] under the write lock.
//! Readers clone the `Arc` under a short read lock and work on that snapshot,
//! so they see either the previous build or the new one, never a mix.

use crate::error::{IndexError, Result};
use crate::idf::IdfTable;
use crate::index::InvertedIndex;
use crate::query::{evaluate, lex};
use crate::vector::{self, cosine_similarity, query_vector, SparseVector};
use crate::{DocId, PostingList};
use parking_lot::RwLock;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    pub total_terms: usize,
    pub total_documents: usize,
    pub avg_terms_per_document: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermInfo {
    pub term: String,
    pub document_frequency: usize,
    pub idf: f64,
    pub postings: PostingList,
}

/// Immutable result of one build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSnapshot {
    documents: Vec<String>,
    index: InvertedIndex,
    idf: IdfTable,
    vectors: Vec<SparseVector>,
}

impl IndexSnapshot {
    pub fn build<S: AsRef<str>>(corpus: &[S]) -> Self {
        let documents: Vec<String> = corpus.iter().map(|d| d.as_ref().to_owned()).collect();
        let index = InvertedIndex::build(&documents);
        let idf = IdfTable::calculate(&index);
        let vectors = vector::document_vectors(&documents, &idf);
        Self { documents, index, idf, vectors }
    }

    pub fn index(&self) -> &InvertedIndex { &self.index }

    pub fn idf(&self) -> &IdfTable { &self.idf }

    pub fn num_docs(&self) -> usize { self.documents.len() }

    fn check_doc_id(&self, doc_id: DocId) -> Result<usize> {
        let i = doc_id as usize;
        if i < self.documents.len() {
            Ok(i)
        } else {
            Err(IndexError::DocumentOutOfRange { doc_id, total: self.documents.len() as u32 })
        }
    }

    pub fn document(&self, doc_id: DocId) -> Result<&str> {
        let i = self.check_doc_id(doc_id)?;
        Ok(&self.documents[i])
    }

    pub fn document_vector(&self, doc_id: DocId) -> Result<&SparseVector> {
        let i = self.check_doc_id(doc_id)?;
        Ok(&self.vectors[i])
    }

    /// Boolean retrieval, ranked by cosine similarity between the literal
    /// query text and each matching document. Zero scores are kept.
    pub fn search_boolean(&self, query: &str) -> Vec<(DocId, f64)> {
        let matches = evaluate(&lex(query), &self.index);
        let qv = query_vector(&query.to_lowercase(), &self.idf);
        let mut results: Vec<(DocId, f64)> = matches
            .into_iter()
            .filter_map(|doc_id| {
                let dv = self.vectors.get(doc_id as usize)?;
                Some((doc_id, cosine_similarity(&qv, dv)))
            })
            .collect();
        sort_by_score(&mut results);
        tracing::debug!(query, hits = results.len(), "boolean search");
        results
    }

    /// Rank every document with positive cosine similarity to the query.
    pub fn search_vector(&self, query: &str) -> Vec<(DocId, f64)> {
        let qv = query_vector(query, &self.idf);
        if qv.is_empty() {
            tracing::debug!(query, hits = 0, "vector search");
            return Vec::new();
        }
        let mut results: Vec<(DocId, f64)> = self
            .vectors
            .iter()
            .enumerate()
            .filter_map(|(doc_id, dv)| {
                let score = cosine_similarity(&qv, dv);
                (score > 0.0).then_some((doc_id as DocId, score))
            })
            .collect();
        sort_by_score(&mut results);
        tracing::debug!(query, hits = results.len(), "vector search");
        results
    }

    pub fn statistics(&self) -> Statistics {
        let total_documents = self.index.num_docs();
        let avg_terms_per_document = if total_documents == 0 {
            0.0
        } else {
            self.index.total_tokens() as f64 / total_documents as f64
        };
        Statistics { total_terms: self.index.num_terms(), total_documents, avg_terms_per_document }
    }

    /// Postings, df and idf of an index term (an already normalized stem).
    pub fn inspect_term(&self, term: &str) -> Option<TermInfo> {
        let postings = self.index.postings(term)?;
        Some(TermInfo {
            term: term.to_string(),
            document_frequency: postings.len(),
            idf: self.idf.get(term).unwrap_or(0.0),
            postings: postings.clone(),
        })
    }

    /// A window of the sorted term listing.
    pub fn term_page(&self, offset: usize, limit: usize) -> Vec<TermInfo> {
        self.index
            .terms()
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|term| self.inspect_term(term))
            .collect()
    }

    /// The `k` highest-weighted terms of a document's TF-IDF vector.
    pub fn top_terms(&self, doc_id: DocId, k: usize) -> Result<Vec<(String, f64)>> {
        Ok(vector::top_terms(self.document_vector(doc_id)?, k))
    }
}

/// Descending by score; `sort_by` is stable so ties keep their input order.
fn sort_by_score(results: &mut [(DocId, f64)]) {
    results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
}

/// Owner of the current snapshot. Share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct SearchEngine {
    current: RwLock<Arc<IndexSnapshot>>,
}

impl SearchEngine {
    pub fn new() -> Self { Self::default() }

    /// Replace all state with an index of `corpus`. doc_ids from earlier
    /// builds are invalidated.
    pub fn build<S: AsRef<str>>(&self, corpus: &[S]) {
        let start = std::time::Instant::now();
        let snapshot = Arc::new(IndexSnapshot::build(corpus));
        let (num_docs, num_terms) = (snapshot.num_docs(), snapshot.index.num_terms());
        *self.current.write() = snapshot;
        tracing::info!(
            num_docs,
            num_terms,
            took_ms = start.elapsed().as_millis() as u64,
            "index build complete"
        );
    }

    /// Drop every document.
    pub fn clear(&self) {
        *self.current.write() = Arc::new(IndexSnapshot::default());
        tracing::info!("index cleared");
    }

    /// The current snapshot. Hold it to run several reads against one build.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.current.read().clone()
    }

    pub fn search_boolean(&self, query: &str) -> Vec<(DocId, f64)> {
        self.snapshot().search_boolean(query)
    }

    pub fn search_vector(&self, query: &str) -> Vec<(DocId, f64)> {
        self.snapshot().search_vector(query)
    }

    pub fn statistics(&self) -> Statistics {
        self.snapshot().statistics()
    }

    pub fn inspect_term(&self, term: &str) -> Option<TermInfo> {
        self.snapshot().inspect_term(term)
    }

    pub fn top_terms(&self, doc_id: DocId, k: usize) -> Result<Vec<(String, f64)>> {
        self.snapshot().top_terms(doc_id, k)
    }
}
