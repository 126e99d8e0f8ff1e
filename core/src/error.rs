//! Error types for the retrieval core.
//!
//! Search and statistics never fail: unknown terms and malformed boolean
//! queries produce empty results. Errors are reserved for out-of-range
//! document ids and for corpus input that is not text.

use crate::DocId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    /// A doc_id outside `[0, total)`, typically stale after a rebuild.
    #[error("document {doc_id} is out of range (index holds {total} documents)")]
    DocumentOutOfRange { doc_id: DocId, total: u32 },

    /// A corpus entry that cannot be read as document text.
    #[error("invalid document at position {position}: {reason}")]
    InvalidDocument { position: usize, reason: String },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl IndexError {
    pub fn invalid_document<S: Into<String>>(position: usize, reason: S) -> Self {
        IndexError::InvalidDocument { position, reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
