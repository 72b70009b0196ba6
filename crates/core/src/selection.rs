use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::cell_key::{CellKey, ColumnId, RowId};

/// A set of selected ids. Presence means selected.
///
/// Updates are pure: `select_one` and `toggle` return a new set and leave
/// `self` alone, so a set handed out to a reader never changes under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSet<K: Ord> {
    ids: BTreeSet<K>,
}

impl<K: Ord> Default for SelectionSet<K> {
    fn default() -> Self {
        Self { ids: BTreeSet::new() }
    }
}

impl<K: Ord + Clone> SelectionSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-select: the result contains only `id`.
    pub fn select_one(&self, id: &K) -> Self {
        let mut ids = BTreeSet::new();
        ids.insert(id.clone());
        Self { ids }
    }

    /// Multi-select: remove `id` if present, add it otherwise.
    pub fn toggle(&self, id: &K) -> Self {
        let mut ids = self.ids.clone();
        if !ids.remove(id) {
            ids.insert(id.clone());
        }
        Self { ids }
    }

    pub fn is_selected(&self, id: &K) -> bool {
        self.ids.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.ids.iter()
    }

    /// Drop every id for which `keep` returns false.
    pub fn retain(&self, mut keep: impl FnMut(&K) -> bool) -> Self {
        Self {
            ids: self.ids.iter().filter(|id| keep(id)).cloned().collect(),
        }
    }
}

impl<K: Ord> FromIterator<K> for SelectionSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// The three independent selection sets of a table view.
///
/// Selecting a column says nothing about rows or cells; the sets are
/// orthogonal and only composed by readers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub columns: SelectionSet<ColumnId>,
    pub rows: SelectionSet<RowId>,
    pub cells: SelectionSet<CellKey>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column clicks always toggle, regardless of modifier keys.
    pub fn select_column(&mut self, id: &ColumnId) {
        self.columns = self.columns.toggle(id);
    }

    pub fn select_row(&mut self, id: &RowId, multi: bool) {
        self.rows = if multi {
            self.rows.toggle(id)
        } else {
            self.rows.select_one(id)
        };
    }

    pub fn select_cell(&mut self, key: &CellKey, multi: bool) {
        self.cells = if multi {
            self.cells.toggle(key)
        } else {
            self.cells.select_one(key)
        };
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when only rows are selected (no columns).
    pub fn only_rows_selected(&self) -> bool {
        !self.rows.is_empty() && self.columns.is_empty()
    }

    /// True when any row or column is selected.
    pub fn rows_or_columns_selected(&self) -> bool {
        !self.rows.is_empty() || !self.columns.is_empty()
    }
}
