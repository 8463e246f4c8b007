//! Snapshot stack for single-step undo.
//!
//! Stores full prior values, never inverse operations. One snapshot is
//! pushed per applied answer; undo pops one. There is no redo.

/// LIFO stack of full state snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotStack<T: Clone> {
    past: Vec<T>,
}

impl<T: Clone> Default for SnapshotStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> SnapshotStack<T> {
    pub fn new() -> Self {
        SnapshotStack { past: Vec::new() }
    }

    /// Record the value that is about to be replaced.
    pub fn push(&mut self, snapshot: T) {
        self.past.push(snapshot);
    }

    /// Most recent snapshot, removed from the stack.
    pub fn pop(&mut self) -> Option<T> {
        self.past.pop()
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.past.len()
    }

    pub fn clear(&mut self) {
        self.past.clear();
    }
}
