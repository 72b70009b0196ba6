//! The table store: sole owner of the loaded table.
//!
//! Every mutation goes through [`TableStore::apply_undoable`]: the state is
//! cloned into a draft, the mutation runs on the draft, the entity maps are
//! diffed into a forward/inverse patch pair, and a side effect runs on the
//! draft after the diff so that its changes stay out of history. The draft
//! then replaces the state. A failing mutation leaves the store untouched.

use serde::{Deserialize, Serialize};

use annotab_core::{CellKey, ColumnId, RowId};

use crate::cell::MatchReason;
use crate::error::StoreError;
use crate::events::{EventCollector, StoreEvent};
use crate::history::{History, HistoryError};
use crate::matcher::set_matching_metadata;
use crate::patch::{self, Patch, PatchSet};
use crate::sink::TableSink;
use crate::status::refresh_column_status;
use crate::table::{Entities, FileFormat, LoadedTable, TableInstance, TableSnapshot, TableType};
use crate::ui::{TableUi, UiUpdate};

/// Name given to a raw table when it is first loaded.
pub const DEFAULT_TABLE_NAME: &str = "Table name";

/// Auto-matching threshold used when an operation does not name one.
pub const DEFAULT_MATCHING_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableState {
    pub table: TableInstance,
    pub entities: Entities,
    pub ui: TableUi,
}

/// Partial update of the table descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableUpdate {
    pub name: Option<String>,
    pub format: Option<FileFormat>,
    #[serde(rename = "type")]
    pub kind: Option<TableType>,
}

#[derive(Debug)]
pub struct TableStore {
    pub(crate) state: TableState,
    pub(crate) history: History,
    pub(crate) events: EventCollector,
    matching_threshold: f64,
}

impl Default for TableStore {
    fn default() -> Self {
        Self {
            state: TableState::default(),
            history: History::default(),
            events: EventCollector::default(),
            matching_threshold: DEFAULT_MATCHING_THRESHOLD,
        }
    }
}

impl TableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Threshold for [`StoreOp::AutoMatching`](crate::ops::StoreOp) without one.
    pub fn matching_threshold(&self) -> f64 {
        self.matching_threshold
    }

    pub fn set_matching_threshold(&mut self, threshold: f64) {
        self.matching_threshold = threshold;
    }

    /// An empty store whose history keeps at most `limit` entries.
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            history: History::with_limit(limit),
            ..Self::default()
        }
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn events(&self) -> &EventCollector {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<StoreEvent> {
        self.events.drain()
    }

    /// Run `mutate` on a draft copy of the state and commit it.
    ///
    /// With `undoable` the entity diff is recorded in history. `side_effect`
    /// runs on the draft after diffing and receives the mutation's result.
    pub(crate) fn apply_undoable<T, M, S>(
        &mut self,
        op: &'static str,
        undoable: bool,
        mutate: M,
        side_effect: S,
    ) -> Result<T, StoreError>
    where
        M: FnOnce(&mut TableState) -> Result<T, StoreError>,
        S: FnOnce(&mut TableState, &T),
    {
        let mut draft = self.state.clone();
        let out = mutate(&mut draft)?;

        if undoable {
            let patches = PatchSet::between(&self.state.entities, &draft.entities);
            self.history.record(op, patches);
        }

        side_effect(&mut draft, &out);
        self.state = draft;
        self.events.push(StoreEvent::Changed { op, undoable });
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Table lifecycle
    // ------------------------------------------------------------------

    /// Replace the store contents with a table from the backend.
    ///
    /// A raw table becomes an unsaved annotated JSON table. An annotated
    /// table is taken as-is and counts as saved. History and view state
    /// start fresh.
    pub fn load_table(&mut self, loaded: LoadedTable) {
        let LoadedTable { mut table, columns, rows } = loaded;

        let last_saved = match table.kind {
            TableType::Raw => {
                table.name = DEFAULT_TABLE_NAME.to_string();
                table.format = FileFormat::Json;
                table.kind = TableType::Annotated;
                table.touch();
                None
            }
            TableType::Annotated => table.last_modified_date,
        };

        log::info!(
            "loaded table '{}' ({} columns, {} rows)",
            table.name,
            columns.len(),
            rows.len()
        );
        self.events.push(StoreEvent::Loaded {
            rows: rows.len(),
            columns: columns.len(),
        });

        self.state = TableState {
            table,
            entities: Entities { columns, rows },
            ui: TableUi {
                last_saved,
                ..TableUi::default()
            },
        };
        self.history.clear();
    }

    /// Back to the empty store. The history limit is kept.
    pub fn restore_initial_state(&mut self) {
        self.state = TableState::default();
        self.history.clear();
        self.events.push(StoreEvent::Changed {
            op: "restore_initial_state",
            undoable: false,
        });
    }

    pub fn update_current_table(&mut self, update: TableUpdate) {
        let table = &mut self.state.table;
        if let Some(name) = update.name {
            table.name = name;
        }
        if let Some(format) = update.format {
            table.format = format;
        }
        if let Some(kind) = update.kind {
            table.kind = kind;
        }
        table.touch();
        self.events.push(StoreEvent::Changed {
            op: "update_current_table",
            undoable: false,
        });
    }

    /// Everything a save backend needs.
    pub fn snapshot(&self) -> TableSnapshot {
        LoadedTable {
            table: self.state.table.clone(),
            columns: self.state.entities.columns.clone(),
            rows: self.state.entities.rows.clone(),
        }
    }

    /// Persist the table and mark it saved. Returns the backend's id.
    pub fn save<K: TableSink>(&mut self, sink: &mut K) -> Result<String, StoreError> {
        let id = sink
            .save(&self.snapshot())
            .map_err(|e| StoreError::Sink(e.to_string()))?;

        self.state.table.id = Some(id.clone());
        self.state.ui.last_saved = self.state.table.last_modified_date;
        log::info!("saved table '{}' as {id}", self.state.table.name);
        self.events.push(StoreEvent::Saved { id: id.clone() });
        Ok(id)
    }

    pub fn update_ui(&mut self, update: UiUpdate) {
        self.state.ui.merge(update);
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Toggle a column in the selection.
    pub fn select_column(&mut self, id: &ColumnId) -> Result<(), StoreError> {
        if !self.state.entities.columns.contains(id) {
            return Err(StoreError::UnknownColumn(id.clone()));
        }
        self.state.ui.selection.select_column(id);
        Ok(())
    }

    pub fn select_row(&mut self, id: &RowId, multi: bool) -> Result<(), StoreError> {
        if !self.state.entities.rows.contains(id) {
            return Err(StoreError::UnknownRow(id.clone()));
        }
        self.state.ui.selection.select_row(id, multi);
        Ok(())
    }

    pub fn select_cell(&mut self, key: &CellKey, multi: bool) -> Result<(), StoreError> {
        self.require_cell(key)?;
        self.state.ui.selection.select_cell(key, multi);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.state.ui.selection.clear();
    }

    /// Drop selected ids whose entity no longer exists.
    fn prune_selection(&mut self) {
        let entities = &self.state.entities;
        let selection = &mut self.state.ui.selection;
        selection.columns = selection.columns.retain(|id| entities.columns.contains(id));
        selection.rows = selection.rows.retain(|id| entities.rows.contains(id));
        selection.cells = selection.cells.retain(|key| entities.has_cell(key));
    }

    // ------------------------------------------------------------------
    // Cell edits
    // ------------------------------------------------------------------

    pub(crate) fn require_cell(&self, key: &CellKey) -> Result<(), StoreError> {
        if self.state.entities.has_cell(key) {
            Ok(())
        } else {
            Err(StoreError::UnknownCell(key.clone()))
        }
    }

    /// Put a cell into edit mode. Not recorded in history.
    pub fn update_cell_editable(&mut self, key: &CellKey) -> Result<(), StoreError> {
        self.apply_undoable(
            "update_cell_editable",
            false,
            |draft| {
                let cell = draft
                    .entities
                    .cell_mut(key)
                    .ok_or_else(|| StoreError::UnknownCell(key.clone()))?;
                cell.editable = true;
                Ok(())
            },
            |_, _| {},
        )
    }

    /// Commit an edit. An unchanged value only leaves edit mode.
    pub fn update_cell_label(
        &mut self,
        key: &CellKey,
        value: impl Into<String>,
        undoable: bool,
    ) -> Result<(), StoreError> {
        let value = value.into();
        let unchanged = match self.state.entities.cell(key) {
            Some(cell) if self.state.entities.columns.contains(&key.column) => cell.label == value,
            _ => return Err(StoreError::UnknownCell(key.clone())),
        };

        if unchanged {
            if let Some(cell) = self.state.entities.cell_mut(key) {
                cell.editable = false;
            }
            return Ok(());
        }

        self.apply_undoable(
            "update_cell_label",
            undoable,
            |draft| {
                if let Some(cell) = draft.entities.cell_mut(key) {
                    cell.label = value;
                }
                Ok(())
            },
            |draft, _| {
                if let Some(cell) = draft.entities.cell_mut(key) {
                    cell.editable = false;
                }
                draft.table.touch();
            },
        )
    }

    /// Toggle the match flag of one candidate and clear its siblings.
    pub fn update_cell_metadata(
        &mut self,
        key: &CellKey,
        metadata_id: &str,
        undoable: bool,
    ) -> Result<(), StoreError> {
        self.require_cell(key)?;
        self.apply_undoable(
            "update_cell_metadata",
            undoable,
            |draft| {
                let cell = draft
                    .entities
                    .cell_mut(key)
                    .ok_or_else(|| StoreError::UnknownCell(key.clone()))?;
                if !cell.metadata.values.iter().any(|m| m.id == metadata_id) {
                    return Err(StoreError::UnknownCandidate {
                        key: key.clone(),
                        id: metadata_id.to_string(),
                    });
                }
                for m in &mut cell.metadata.values {
                    m.matched = m.id == metadata_id && !m.matched;
                }
                cell.refresh_annotation(MatchReason::Manual);
                refresh_column_status(&mut draft.entities, &key.column);
                Ok(())
            },
            |draft, _| draft.table.touch(),
        )
    }

    /// Match every selected cell by score and refresh the columns involved.
    pub fn auto_matching(&mut self, threshold: f64, undoable: bool) -> Result<(), StoreError> {
        self.apply_undoable(
            "auto_matching",
            undoable,
            |draft| {
                let keys: Vec<CellKey> = draft.ui.selection.cells.iter().cloned().collect();
                let mut columns: Vec<ColumnId> = Vec::new();
                for key in &keys {
                    let Some(cell) = draft.entities.cell_mut(key) else {
                        continue;
                    };
                    set_matching_metadata(cell, threshold);
                    if !columns.contains(&key.column) {
                        columns.push(key.column.clone());
                    }
                }
                for column in &columns {
                    refresh_column_status(&mut draft.entities, column);
                }
                Ok(())
            },
            |draft, _| draft.table.touch(),
        )
    }

    /// Toggle `expanded` on every selected cell. Not recorded in history.
    pub fn update_selected_cell_expanded(&mut self) -> Result<(), StoreError> {
        self.apply_undoable(
            "update_selected_cell_expanded",
            false,
            |draft| {
                let keys: Vec<CellKey> = draft.ui.selection.cells.iter().cloned().collect();
                for key in &keys {
                    if let Some(cell) = draft.entities.cell_mut(key) {
                        cell.expanded = !cell.expanded;
                    }
                }
                Ok(())
            },
            |_, _| {},
        )
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn undo(&mut self) -> Result<(), HistoryError> {
        let op = self.history.undo_label().unwrap_or("unknown");
        let patches = match self.history.undo() {
            Ok(patches) => patches,
            Err(e) => {
                log::debug!("undo: {e}");
                return Err(e);
            }
        };
        apply_patches(&mut self.state.entities, patches, "undo");
        self.after_history_step();
        self.events.push(StoreEvent::Undone { op });
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), HistoryError> {
        let patches = match self.history.redo() {
            Ok(patches) => patches,
            Err(e) => {
                log::debug!("redo: {e}");
                return Err(e);
            }
        };
        apply_patches(&mut self.state.entities, patches, "redo");
        let op = self.history.undo_label().unwrap_or("unknown");
        self.after_history_step();
        self.events.push(StoreEvent::Redone { op });
        Ok(())
    }

    fn after_history_step(&mut self) {
        self.state.table.touch();
        self.prune_selection();
    }
}

fn apply_patches(entities: &mut Entities, patches: &[Patch], direction: &str) {
    let skipped = patch::apply(entities, patches);
    if skipped > 0 {
        log::warn!("{direction}: skipped {skipped} patch(es) addressing missing rows");
    }
}
