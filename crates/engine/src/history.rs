//! Undo/redo history of recorded patch sets.

use std::collections::VecDeque;
use std::fmt;

use crate::patch::{Patch, PatchSet};

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryError {
    NothingToUndo,
    NothingToRedo,
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingToUndo => write!(f, "nothing to undo"),
            Self::NothingToRedo => write!(f, "nothing to redo"),
        }
    }
}

impl std::error::Error for HistoryError {}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Name of the operation that produced the patches.
    pub label: &'static str,
    pub patches: PatchSet,
}

/// Entries before `pointer` are undoable, entries at and after it redoable.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    pointer: usize,
    max_entries: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// A zero limit is raised to one.
    pub fn with_limit(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            pointer: 0,
            max_entries: max_entries.max(1),
        }
    }

    /// Record a mutation, discarding every redoable entry. Empty patch sets
    /// are not recorded.
    pub fn record(&mut self, label: &'static str, patches: PatchSet) {
        if patches.is_empty() {
            return;
        }

        self.entries.truncate(self.pointer);
        self.entries.push_back(HistoryEntry { label, patches });

        // Limit history size
        if self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
        self.pointer = self.entries.len();
        log::debug!("recorded '{label}' ({} undoable)", self.pointer);
    }

    /// Step back one entry and return the patches that revert it.
    pub fn undo(&mut self) -> Result<&[Patch], HistoryError> {
        if self.pointer == 0 {
            return Err(HistoryError::NothingToUndo);
        }
        self.pointer -= 1;
        Ok(&self.entries[self.pointer].patches.inverse)
    }

    /// Step forward one entry and return the patches that reapply it.
    pub fn redo(&mut self) -> Result<&[Patch], HistoryError> {
        if self.pointer == self.entries.len() {
            return Err(HistoryError::NothingToRedo);
        }
        self.pointer += 1;
        Ok(&self.entries[self.pointer - 1].patches.forward)
    }

    pub fn can_undo(&self) -> bool {
        self.pointer > 0
    }

    pub fn can_redo(&self) -> bool {
        self.pointer < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Label of the entry the next undo would revert.
    pub fn undo_label(&self) -> Option<&'static str> {
        self.pointer.checked_sub(1).map(|i| self.entries[i].label)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.pointer = 0;
    }
}
