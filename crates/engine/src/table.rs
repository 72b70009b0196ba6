//! Normalized table entities.
//!
//! Columns and rows live in flat id-indexed maps plus an ordering vector,
//! so lookups and patches are O(1) and ordering is tracked separately.

use std::collections::{BTreeMap, BTreeSet};
use std::hash::Hash;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use annotab_core::{CellKey, ColumnId, RowId};

use crate::cell::Cell;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableType {
    /// Freshly converted from a file, never annotated.
    #[default]
    Raw,
    Annotated,
}

/// Descriptor of the loaded table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInstance {
    /// Id assigned by the save backend; None until first saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub format: FileFormat,
    #[serde(rename = "type", default)]
    pub kind: TableType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<DateTime<Utc>>,
}

impl TableInstance {
    /// Refresh `last_modified_date`, keeping it strictly increasing so a
    /// save marker taken before this call never compares equal to it.
    pub fn touch(&mut self) {
        let now = Utc::now();
        self.last_modified_date = Some(match self.last_modified_date {
            Some(prev) if prev >= now => prev + chrono::Duration::microseconds(1),
            _ => now,
        });
    }
}

/// Aggregate reconciliation completeness of a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnStatus {
    /// No cell carries metadata.
    #[default]
    Empty,
    /// Some cells carry metadata but not every cell is matched.
    Pending,
    /// Every cell is matched.
    Reconciliated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub label: String,
    #[serde(default)]
    pub status: ColumnStatus,
    /// Ids of every reconciliator that produced metadata for this column.
    #[serde(default)]
    pub reconciliators: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Column {
    pub fn new(id: impl Into<ColumnId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            status: ColumnStatus::Empty,
            reconciliators: BTreeSet::new(),
            kind: None,
            role: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub cells: BTreeMap<ColumnId, Cell>,
}

impl Row {
    pub fn new(id: impl Into<RowId>) -> Self {
        Self {
            id: id.into(),
            cells: BTreeMap::new(),
        }
    }
}

/// Id-indexed records plus their display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(
    serialize = "K: Serialize + Eq + Hash, T: Serialize",
    deserialize = "K: Deserialize<'de> + Eq + Hash, T: Deserialize<'de>"
))]
pub struct EntityMap<K, T> {
    pub by_id: FxHashMap<K, T>,
    pub all_ids: Vec<K>,
}

impl<K: Eq + Hash, T: PartialEq> PartialEq for EntityMap<K, T> {
    fn eq(&self, other: &Self) -> bool {
        self.all_ids == other.all_ids && self.by_id == other.by_id
    }
}

impl<K, T> Default for EntityMap<K, T> {
    fn default() -> Self {
        Self {
            by_id: FxHashMap::default(),
            all_ids: Vec::new(),
        }
    }
}

impl<K: Clone + Eq + Hash, T> EntityMap<K, T> {
    pub fn get(&self, id: &K) -> Option<&T> {
        self.by_id.get(id)
    }

    pub fn get_mut(&mut self, id: &K) -> Option<&mut T> {
        self.by_id.get_mut(id)
    }

    pub fn contains(&self, id: &K) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.all_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_ids.is_empty()
    }

    /// Append a record at the end of the order. Replaces an existing record
    /// with the same id in place.
    pub fn push(&mut self, id: K, value: T) {
        if self.by_id.insert(id.clone(), value).is_none() {
            self.all_ids.push(id);
        }
    }

    pub fn remove(&mut self, id: &K) -> Option<T> {
        let removed = self.by_id.remove(id);
        if removed.is_some() {
            self.all_ids.retain(|x| x != id);
        }
        removed
    }

    /// Records in display order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.all_ids.iter().filter_map(|id| self.by_id.get(id))
    }
}

/// The normalized entity store: every column and row of the table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    pub columns: EntityMap<ColumnId, Column>,
    pub rows: EntityMap<RowId, Row>,
}

impl Entities {
    pub fn cell(&self, key: &CellKey) -> Option<&Cell> {
        self.rows.get(&key.row)?.cells.get(&key.column)
    }

    pub fn cell_mut(&mut self, key: &CellKey) -> Option<&mut Cell> {
        self.rows.get_mut(&key.row)?.cells.get_mut(&key.column)
    }

    /// Cells of one column, in row order.
    pub fn column_cells<'a>(&'a self, column: &'a ColumnId) -> impl Iterator<Item = &'a Cell> + 'a {
        self.rows.iter().filter_map(move |row| row.cells.get(column))
    }

    /// True when both the row and the column still exist and the row holds
    /// a cell for the column.
    pub fn has_cell(&self, key: &CellKey) -> bool {
        self.columns.contains(&key.column) && self.cell(key).is_some()
    }
}

/// A table as handed over by the backend or a format converter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedTable {
    pub table: TableInstance,
    pub columns: EntityMap<ColumnId, Column>,
    pub rows: EntityMap<RowId, Row>,
}

/// Everything a save backend needs to persist a table.
pub type TableSnapshot = LoadedTable;
