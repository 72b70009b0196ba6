//! Read-only views over the store.

use std::collections::BTreeSet;

use serde::Serialize;

use annotab_core::{CellKey, ColumnId, RowId};

use crate::cell::{Cell, CellMetadata};
use crate::store::TableStore;
use crate::table::{Column, ColumnStatus, Row, TableInstance};

/// A cell sent to a reconciliation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationCell {
    pub id: CellKey,
    pub label: String,
}

impl TableStore {
    pub fn table(&self) -> &TableInstance {
        &self.state.table
    }

    pub fn column(&self, id: &ColumnId) -> Option<&Column> {
        self.state.entities.columns.get(id)
    }

    pub fn row(&self, id: &RowId) -> Option<&Row> {
        self.state.entities.rows.get(id)
    }

    pub fn cell(&self, key: &CellKey) -> Option<&Cell> {
        self.state.entities.cell(key)
    }

    /// Columns in display order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.state.entities.columns.iter()
    }

    /// Rows in display order.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.state.entities.rows.iter()
    }

    pub fn is_column_selected(&self, id: &ColumnId) -> bool {
        self.state.ui.selection.columns.is_selected(id)
    }

    pub fn is_row_selected(&self, id: &RowId) -> bool {
        self.state.ui.selection.rows.is_selected(id)
    }

    pub fn is_cell_selected(&self, key: &CellKey) -> bool {
        self.state.ui.selection.cells.is_selected(key)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// True when the table changed since it was last saved or loaded from
    /// a saved copy.
    pub fn is_unsaved(&self) -> bool {
        self.state.ui.last_saved != self.state.table.last_modified_date
    }

    pub fn can_delete(&self) -> bool {
        self.state.ui.selection.rows_or_columns_selected()
    }

    pub fn column_status(&self, id: &ColumnId) -> Option<ColumnStatus> {
        self.column(id).map(|c| c.status)
    }

    pub fn column_reconciliators(&self, id: &ColumnId) -> Option<&BTreeSet<String>> {
        self.column(id).map(|c| &c.reconciliators)
    }

    pub fn cell_metadata(&self, key: &CellKey) -> Option<&CellMetadata> {
        self.cell(key).map(|c| &c.metadata)
    }

    /// Selected cells that still exist, in key order.
    pub fn selected_cells(&self) -> Vec<&CellKey> {
        self.state
            .ui
            .selection
            .cells
            .iter()
            .filter(|key| self.state.entities.has_cell(key))
            .collect()
    }

    /// Selected columns that still exist, in id order.
    pub fn selected_columns(&self) -> Vec<&ColumnId> {
        self.state
            .ui
            .selection
            .columns
            .iter()
            .filter(|id| self.state.entities.columns.contains(id))
            .collect()
    }

    /// Input for a reconciliation request: every selected cell with its label.
    pub fn reconciliation_cells(&self) -> Vec<ReconciliationCell> {
        self.selected_cells()
            .into_iter()
            .filter_map(|key| {
                self.cell(key).map(|cell| ReconciliationCell {
                    id: key.clone(),
                    label: cell.label.clone(),
                })
            })
            .collect()
    }

    /// The metadata dialog opens for exactly one selected cell with candidates.
    pub fn is_metadata_button_enabled(&self) -> bool {
        match self.selected_cells().as_slice() {
            [key] => self.cell(key).is_some_and(|c| c.has_metadata()),
            _ => false,
        }
    }
}
