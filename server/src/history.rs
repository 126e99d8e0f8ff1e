//! Recent searches, newest first, capped at a fixed number of entries.

use crate::SearchMode;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub query: String,
    pub mode: SearchMode,
    pub total_hits: usize,
    pub searched_at: String,
}

#[derive(Debug)]
pub struct SearchHistory {
    entries: Mutex<VecDeque<HistoryEntry>>,
    capacity: usize,
}

impl Default for SearchHistory {
    fn default() -> Self { Self::with_capacity(DEFAULT_CAPACITY) }
}

impl SearchHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Mutex::new(VecDeque::with_capacity(capacity)), capacity }
    }

    pub fn record(&self, query: &str, mode: SearchMode, total_hits: usize) {
        if self.capacity == 0 {
            return;
        }
        let searched_at = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
        let entry = HistoryEntry { query: query.to_string(), mode, total_hits, searched_at };
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_back();
        }
        entries.push_front(entry);
    }

    /// Up to `limit` entries, most recent first.
    pub fn recent(&self, limit: usize) -> Vec<HistoryEntry> {
        self.entries.lock().iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize { self.entries.lock().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_first() {
        let history = SearchHistory::default();
        history.record("cat", SearchMode::Vector, 2);
        history.record("cat AND mat", SearchMode::Boolean, 1);
        let recent = history.recent(5);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].query, "cat AND mat");
        assert_eq!(recent[0].mode, SearchMode::Boolean);
        assert_eq!(recent[1].total_hits, 2);
        assert!(!recent[0].searched_at.is_empty());
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let history = SearchHistory::with_capacity(3);
        for q in ["a", "b", "c", "d"] {
            history.record(q, SearchMode::Vector, 0);
        }
        let queries: Vec<String> = history.recent(10).into_iter().map(|e| e.query).collect();
        assert_eq!(queries, vec!["d", "c", "b"]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let history = SearchHistory::with_capacity(0);
        history.record("cat", SearchMode::Vector, 1);
        assert!(history.is_empty());
    }
}
