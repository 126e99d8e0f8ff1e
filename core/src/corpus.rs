//! Turning files and JSON payloads into an ordered list of document texts.
//!
//! A corpus item is either a JSON string or an object carrying the text in
//! `body` (or `content`). Anything else is rejected with
//! [`IndexError::InvalidDocument`] rather than skipped, because skipping would
//! silently shift every later doc_id.

use crate::error::{IndexError, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const TEXT_FIELDS: &[&str] = &["body", "content"];

/// Extract the text of one corpus item. `position` is reported on failure.
pub fn document_text(position: usize, item: &Value) -> Result<String> {
    match item {
        Value::String(s) => Ok(s.clone()),
        Value::Object(map) => {
            let field = TEXT_FIELDS.iter().find_map(|name| map.get(*name)).ok_or_else(|| {
                IndexError::invalid_document(position, "object has no `body` or `content` field")
            })?;
            match field {
                Value::String(s) => Ok(s.clone()),
                other => Err(IndexError::invalid_document(
                    position,
                    format!("text field is {}, not a string", kind(other)),
                )),
            }
        }
        other => Err(IndexError::invalid_document(
            position,
            format!("expected string or object, found {}", kind(other)),
        )),
    }
}

/// A JSON array of documents, or a single document.
pub fn corpus_from_json(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Array(items) => {
            items.iter().enumerate().map(|(i, item)| document_text(i, item)).collect()
        }
        single => Ok(vec![document_text(0, single)?]),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> IndexError + '_ {
    move |source| IndexError::Io { path: path.to_path_buf(), source }
}

fn json_err(path: &Path) -> impl FnOnce(serde_json::Error) -> IndexError + '_ {
    move |source| IndexError::Json { path: path.to_path_buf(), source }
}

/// Load a corpus from a file or a directory tree of `.json`, `.jsonl` and
/// `.txt` files. Files are read in sorted path order so doc_ids are stable
/// across runs over the same input.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let mut files: Vec<PathBuf> = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let p = e.path().unwrap_or(path).to_path_buf();
                IndexError::Io { path: p, source: e.into() }
            })?;
            if entry.file_type().is_file() && is_corpus_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
    } else {
        files.push(path.to_path_buf());
    }

    let mut corpus = Vec::new();
    for file in &files {
        let before = corpus.len();
        read_corpus_file(file, &mut corpus)?;
        tracing::debug!(
            file = %file.display(),
            documents = corpus.len() - before,
            "read corpus file"
        );
    }
    tracing::info!(files = files.len(), documents = corpus.len(), "corpus loaded");
    Ok(corpus)
}

fn is_corpus_file(path: &Path) -> bool {
    matches!(path.extension().and_then(|s| s.to_str()), Some("json" | "jsonl" | "txt"))
}

fn read_corpus_file(file: &Path, corpus: &mut Vec<String>) -> Result<()> {
    let raw = fs::read_to_string(file).map_err(io_err(file))?;
    match file.extension().and_then(|s| s.to_str()) {
        Some("jsonl") => {
            for line in raw.lines() {
                if line.trim().is_empty() { continue; }
                let value: Value = serde_json::from_str(line).map_err(json_err(file))?;
                let text = document_text(corpus.len(), &value)?;
                corpus.push(text);
            }
        }
        Some("json") => {
            let value: Value = serde_json::from_str(&raw).map_err(json_err(file))?;
            let offset = corpus.len();
            let docs = corpus_from_json(&value).map_err(|e| match e {
                IndexError::InvalidDocument { position, reason } => {
                    IndexError::InvalidDocument { position: position + offset, reason }
                }
                other => other,
            })?;
            corpus.extend(docs);
        }
        _ => corpus.push(raw),
    }
    Ok(())
}
