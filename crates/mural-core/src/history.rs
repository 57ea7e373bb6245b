//! Snapshot-based undo/redo for the document's object map.

use std::collections::HashMap;

use crate::object::{ObjectId, SceneObject};

/// Maximum number of undo steps to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

/// A full copy of the object map at one point in time.
pub type Snapshot = HashMap<ObjectId, SceneObject>;

/// Undo/redo log holding whole-document snapshots.
///
/// Callers push a snapshot of the state *before* each local mutation.
/// `undo` and `redo` take the current live state so it can move to the
/// opposite stack; any new push clears the redo stack. Remote changes
/// are never recorded here, so undo only ever reverts local edits.
#[derive(Debug, Default)]
pub struct HistoryLog {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pre-mutation state. Clears the redo stack and drops
    /// the oldest entry once the capacity is reached.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.redo_stack.clear();
        if self.undo_stack.len() >= MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(snapshot);
    }

    /// Pop the most recent snapshot, moving `current` onto the redo
    /// stack. Returns `None` when there is nothing to undo.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let snapshot = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(snapshot)
    }

    /// Pop the most recently undone snapshot, moving `current` back
    /// onto the undo stack.
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let snapshot = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Drop all history, e.g. after loading a different document.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;

    fn state_with_object(x: f64) -> Snapshot {
        let obj = SceneObject::new(
            ObjectKind::Rectangle { corner_radius: 0.0 },
            x,
            0.0,
            10.0,
            10.0,
            0,
        );
        let mut map = HashMap::new();
        map.insert(obj.id, obj);
        map
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut log = HistoryLog::new();
        let before = state_with_object(0.0);
        let after = state_with_object(100.0);

        log.push(before.clone());
        assert!(log.can_undo());
        assert!(!log.can_redo());

        let restored = log.undo(after.clone()).unwrap();
        assert_eq!(restored.len(), 1);
        let x = restored.values().next().unwrap().x;
        assert_eq!(x, 0.0);
        assert!(log.can_redo());

        let replayed = log.redo(restored).unwrap();
        let x = replayed.values().next().unwrap().x;
        assert_eq!(x, 100.0);
        assert!(log.can_undo());
    }

    #[test]
    fn test_undo_empty_returns_none() {
        let mut log = HistoryLog::new();
        assert!(log.undo(Snapshot::new()).is_none());
        assert!(log.redo(Snapshot::new()).is_none());
    }

    #[test]
    fn test_push_clears_redo() {
        let mut log = HistoryLog::new();
        log.push(state_with_object(0.0));
        log.undo(state_with_object(1.0)).unwrap();
        assert!(log.can_redo());

        log.push(state_with_object(2.0));
        assert!(!log.can_redo());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut log = HistoryLog::new();
        for i in 0..(MAX_UNDO_HISTORY + 10) {
            log.push(state_with_object(i as f64));
        }

        // Unwind everything; the oldest reachable state is the one
        // pushed after the first ten were evicted.
        let mut last = Snapshot::new();
        let mut count = 0;
        while let Some(snapshot) = log.undo(last.clone()) {
            last = snapshot;
            count += 1;
        }
        assert_eq!(count, MAX_UNDO_HISTORY);
        assert_eq!(last.values().next().unwrap().x, 10.0);
    }
}
