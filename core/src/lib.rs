use std::collections::BTreeMap;

pub mod corpus;
pub mod engine;
pub mod error;
pub mod idf;
pub mod index;
pub mod query;
pub mod tokenizer;
pub mod vector;

pub type DocId = u32;

/// Raw term frequency per document for a single term, ordered by doc_id.
pub type PostingList = BTreeMap<DocId, u32>;

pub use engine::{IndexSnapshot, SearchEngine, Statistics, TermInfo};
pub use error::{IndexError, Result};
pub use index::InvertedIndex;
