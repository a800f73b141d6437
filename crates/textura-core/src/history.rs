//! Linear undo/redo over full-text snapshots.

use std::collections::VecDeque;

use tracing::trace;

/// Retention policy for the undo stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryLimit {
    #[default]
    Unbounded,
    /// Keep at most `n` undo snapshots, evicting the oldest first.
    Bounded(usize),
}

impl HistoryLimit {
    pub fn from_setting(limit: Option<usize>) -> Self {
        match limit {
            Some(n) if n > 0 => Self::Bounded(n),
            _ => Self::Unbounded,
        }
    }
}

/// Two LIFO stacks of snapshots. The back of each deque is the top.
#[derive(Debug, Clone, Default)]
pub struct History {
    undo: VecDeque<String>,
    redo: VecDeque<String>,
    limit: HistoryLimit,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: HistoryLimit) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn limit(&self) -> HistoryLimit {
        self.limit
    }

    /// File `prior` as the newest undo step; a fresh edit invalidates redo.
    pub fn record_edit(&mut self, prior: String) {
        self.undo.push_back(prior);
        self.redo.clear();
        self.enforce_limit();
    }

    /// Pop the newest undo snapshot, parking `current` on the redo stack.
    /// Returns `None` without touching either stack when there is nothing to undo.
    pub fn undo(&mut self, current: String) -> Option<String> {
        let restored = self.undo.pop_back()?;
        self.redo.push_back(current);
        trace!(undo = self.undo.len(), redo = self.redo.len(), "history undo");
        Some(restored)
    }

    /// Mirror of [`History::undo`].
    pub fn redo(&mut self, current: String) -> Option<String> {
        let restored = self.redo.pop_back()?;
        self.undo.push_back(current);
        self.enforce_limit();
        trace!(undo = self.undo.len(), redo = self.redo.len(), "history redo");
        Some(restored)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    fn enforce_limit(&mut self) {
        if let HistoryLimit::Bounded(max) = self.limit {
            while self.undo.len() > max {
                self.undo.pop_front();
            }
        }
    }
}
