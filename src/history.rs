//! Bounded undo/redo history.
//!
//! Full-scene snapshots in a ring capped at `MAX_HISTORY`, with a cursor
//! into the entry currently live. Recording after an undo drops the redo
//! tail; exceeding the cap evicts the oldest entry.

use crate::shapes::Shape;

pub const MAX_HISTORY: usize = 50;

/// Deep copy of the document state at one instant: shapes (including their
/// elements) plus the selection.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub shapes: Vec<Shape>,
    pub selected: Vec<String>,
}

#[derive(Debug)]
pub struct HistoryManager {
    entries: Vec<Snapshot>,
    cursor: usize,
    capacity: usize,
}

impl HistoryManager {
    pub fn new(capacity: usize) -> Self {
        Self { entries: Vec::new(), cursor: 0, capacity }
    }

    /// Record a new state. Any redo tail past the cursor is discarded
    /// first.
    pub fn record(&mut self, snapshot: Snapshot) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(snapshot);
        if self.entries.len() > self.capacity {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back one entry. No-op at the oldest entry.
    pub fn undo(&mut self) -> Option<Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).cloned()
    }

    /// Step forward one entry. No-op at the newest entry.
    pub fn redo(&mut self) -> Option<Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor).cloned()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.cursor < self.entries.len() - 1
    }

    /// Replace the whole history with a single entry. Imports use this so
    /// undo cannot cross a document boundary.
    pub fn reset(&mut self, snapshot: Snapshot) {
        self.entries.clear();
        self.entries.push(snapshot);
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(tag: &str) -> Snapshot {
        Snapshot { shapes: Vec::new(), selected: vec![tag.to_string()] }
    }

    fn tag(s: &Snapshot) -> &str {
        &s.selected[0]
    }

    #[test]
    fn undo_is_a_no_op_at_the_first_entry() {
        let mut h = HistoryManager::default();
        h.record(snap("a"));
        assert!(!h.can_undo());
        assert!(h.undo().is_none());
    }

    #[test]
    fn undo_then_redo_walks_the_cursor() {
        let mut h = HistoryManager::default();
        h.record(snap("a"));
        h.record(snap("b"));
        h.record(snap("c"));
        assert_eq!(tag(&h.undo().unwrap()), "b");
        assert_eq!(tag(&h.undo().unwrap()), "a");
        assert!(h.undo().is_none());
        assert_eq!(tag(&h.redo().unwrap()), "b");
        assert_eq!(tag(&h.redo().unwrap()), "c");
        assert!(h.redo().is_none());
    }

    #[test]
    fn recording_after_undo_truncates_the_future() {
        let mut h = HistoryManager::default();
        h.record(snap("a"));
        h.record(snap("b"));
        h.record(snap("c"));
        h.undo();
        h.undo();
        h.record(snap("d"));
        assert!(!h.can_redo());
        assert_eq!(h.len(), 2);
        assert_eq!(tag(&h.undo().unwrap()), "a");
        assert_eq!(tag(&h.redo().unwrap()), "d");
    }

    #[test]
    fn capacity_evicts_the_oldest_entry() {
        let mut h = HistoryManager::new(3);
        for name in ["a", "b", "c", "d"] {
            h.record(snap(name));
        }
        assert_eq!(h.len(), 3);
        assert_eq!(tag(&h.undo().unwrap()), "c");
        assert_eq!(tag(&h.undo().unwrap()), "b");
        // "a" fell off the ring.
        assert!(!h.can_undo());
    }

    #[test]
    fn reset_leaves_a_single_entry() {
        let mut h = HistoryManager::default();
        h.record(snap("a"));
        h.record(snap("b"));
        h.reset(snap("fresh"));
        assert_eq!(h.len(), 1);
        assert!(!h.can_undo());
        assert!(!h.can_redo());
    }
}
