//! Column and row removal.

use annotab_core::{ColumnId, RowId, SelectionSet};

use crate::error::StoreError;
use crate::status::refresh_all_statuses;
use crate::store::TableStore;
use crate::table::Entities;

fn remove_column(entities: &mut Entities, id: &ColumnId) {
    entities.columns.remove(id);
    for row in entities.rows.by_id.values_mut() {
        row.cells.remove(id);
    }
}

impl TableStore {
    /// Remove a column and its cells.
    pub fn delete_column(&mut self, id: &ColumnId, undoable: bool) -> Result<(), StoreError> {
        if !self.state.entities.columns.contains(id) {
            return Err(StoreError::UnknownColumn(id.clone()));
        }
        self.apply_undoable(
            "delete_column",
            undoable,
            |draft| {
                remove_column(&mut draft.entities, id);
                Ok(())
            },
            |draft, _| {
                let selection = &mut draft.ui.selection;
                selection.columns = SelectionSet::new();
                selection.cells = SelectionSet::new();
                draft.table.touch();
            },
        )
    }

    /// Remove a row. Column statuses are recomputed.
    pub fn delete_row(&mut self, id: &RowId, undoable: bool) -> Result<(), StoreError> {
        if !self.state.entities.rows.contains(id) {
            return Err(StoreError::UnknownRow(id.clone()));
        }
        self.apply_undoable(
            "delete_row",
            undoable,
            |draft| {
                draft.entities.rows.remove(id);
                refresh_all_statuses(&mut draft.entities);
                Ok(())
            },
            |draft, _| {
                let selection = &mut draft.ui.selection;
                selection.rows = SelectionSet::new();
                selection.cells = SelectionSet::new();
                draft.table.touch();
            },
        )
    }

    /// Remove the selected rows, or the selected columns and rows together
    /// when any column is selected. Does nothing without such a selection.
    pub fn delete_selected(&mut self, undoable: bool) -> Result<(), StoreError> {
        if !self.state.ui.selection.rows_or_columns_selected() {
            return Ok(());
        }
        self.apply_undoable(
            "delete_selected",
            undoable,
            |draft| {
                let selection = &draft.ui.selection;
                let columns: Vec<ColumnId> = if selection.only_rows_selected() {
                    Vec::new()
                } else {
                    selection.columns.iter().cloned().collect()
                };
                let rows: Vec<RowId> = selection.rows.iter().cloned().collect();

                for id in &columns {
                    remove_column(&mut draft.entities, id);
                }
                for id in &rows {
                    draft.entities.rows.remove(id);
                }
                if !rows.is_empty() {
                    refresh_all_statuses(&mut draft.entities);
                }
                Ok(())
            },
            |draft, _| {
                draft.ui.selection.clear();
                draft.table.touch();
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::MetadataCandidate;
    use crate::fixtures::sample_store;
    use crate::table::ColumnStatus;
    use annotab_core::CellKey;

    #[test]
    fn delete_column_then_undo_restores_in_place() {
        let mut store = sample_store();
        let before = store.state().entities.clone();

        store.delete_column(&ColumnId::from("c1"), true).unwrap();
        let entities = &store.state().entities;
        assert!(!entities.columns.contains(&ColumnId::from("c1")));
        assert!(entities.cell(&CellKey::new("r1", "c1")).is_none());

        store.undo().unwrap();
        assert_eq!(store.state().entities, before);
        assert_eq!(store.state().entities.columns.all_ids[0], ColumnId::from("c1"));
    }

    #[test]
    fn delete_unknown_column_fails() {
        let mut store = sample_store();
        let err = store.delete_column(&ColumnId::from("zz"), true).unwrap_err();
        assert_eq!(err, StoreError::UnknownColumn(ColumnId::from("zz")));
    }

    #[test]
    fn deleting_last_unmatched_row_promotes_column() {
        let mut store = sample_store();
        let mut q1 = MetadataCandidate::new("Q1", "Rome", 1.0);
        q1.matched = true;
        let key = CellKey::new("r1", "c1");
        store.state.entities.cell_mut(&key).unwrap().metadata.values = vec![q1];
        crate::status::refresh_all_statuses(&mut store.state.entities);
        assert_eq!(
            store.column_status(&ColumnId::from("c1")),
            Some(ColumnStatus::Pending)
        );

        store.delete_row(&RowId::from("r2"), true).unwrap();
        assert_eq!(
            store.column_status(&ColumnId::from("c1")),
            Some(ColumnStatus::Reconciliated)
        );
    }

    #[test]
    fn delete_selected_rows_only() {
        let mut store = sample_store();
        store.select_row(&RowId::from("r1"), false).unwrap();
        store.delete_selected(true).unwrap();

        let entities = &store.state().entities;
        assert_eq!(entities.rows.all_ids, vec![RowId::from("r2")]);
        assert_eq!(entities.columns.len(), 2);
        assert!(store.state().ui.selection.rows.is_empty());
    }

    #[test]
    fn delete_selected_columns_and_rows() {
        let mut store = sample_store();
        store.select_column(&ColumnId::from("c2")).unwrap();
        store.select_row(&RowId::from("r2"), false).unwrap();
        store.delete_selected(true).unwrap();

        let entities = &store.state().entities;
        assert_eq!(entities.columns.all_ids, vec![ColumnId::from("c1")]);
        assert_eq!(entities.rows.all_ids, vec![RowId::from("r1")]);

        store.undo().unwrap();
        assert_eq!(store.state().entities.columns.len(), 2);
        assert_eq!(store.state().entities.rows.len(), 2);
        // selection cleanup is not undone
        assert!(store.state().ui.selection.columns.is_empty());
    }

    #[test]
    fn delete_selected_without_selection_is_noop() {
        let mut store = sample_store();
        store.delete_selected(true).unwrap();
        assert!(!store.can_undo());
        assert_eq!(store.state().entities.rows.len(), 2);
    }

    #[test]
    fn undo_after_unrecorded_delete_keeps_order_consistent() {
        let mut store = sample_store();
        store.delete_row(&RowId::from("r1"), true).unwrap();
        store.delete_row(&RowId::from("r2"), false).unwrap();
        store.undo().unwrap();

        let rows = &store.state().entities.rows;
        assert_eq!(rows.all_ids, vec![RowId::from("r1")]);
        assert_eq!(rows.len(), 1);
        assert_eq!(store.rows().count(), 1);
    }
}
