//! Undo/redo over full parameter-list snapshots.

use crate::models::ColorParameter;

/// Ordered snapshots plus a cursor pointing at the visible one.
///
/// There is always at least one snapshot, so the cursor is always valid.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Vec<ColorParameter>>,
    cursor: usize,
    limit: usize,
}

impl History {
    /// Creates a history holding `initial` as its only snapshot.
    ///
    /// `limit` caps the number of retained snapshots (0 keeps all of them).
    /// Once more than `limit - 1` edits are recorded the oldest snapshots,
    /// including `initial`, are dropped and can no longer be undone to.
    pub fn new(initial: Vec<ColorParameter>, limit: usize) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
            limit,
        }
    }

    /// Discards anything after the cursor, appends `state` and moves to it.
    pub fn record(&mut self, state: Vec<ColorParameter>) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(state);
        self.cursor = self.snapshots.len() - 1;

        if self.limit > 0 {
            let excess = self.snapshots.len().saturating_sub(self.limit);
            if excess > 0 {
                self.snapshots.drain(..excess);
                self.cursor -= excess;
            }
        }
    }

    /// Steps back one snapshot. Returns false at the oldest snapshot.
    pub fn undo(&mut self) -> bool {
        if self.can_undo() {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Steps forward one snapshot. Returns false at the newest snapshot.
    pub fn redo(&mut self) -> bool {
        if self.can_redo() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// True when an older snapshot exists.
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// True when a newer snapshot exists.
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// The visible parameter list.
    pub fn current(&self) -> &[ColorParameter] {
        &self.snapshots[self.cursor]
    }

    /// Number of retained snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false; a history is never empty.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Position of the visible snapshot.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(Vec::new(), 0)
    }
}
