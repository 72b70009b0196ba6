use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use annotab_core::Selection;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchState {
    pub filter: String,
    pub value: String,
}

/// View state of the loaded table. Never part of undo history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableUi {
    /// `lastModifiedDate` of the table at its last save.
    pub last_saved: Option<DateTime<Utc>>,
    pub search: SearchState,
    pub dense_view: bool,
    pub open_reconcile_dialog: bool,
    pub open_metadata_dialog: bool,
    pub open_export_dialog: bool,
    pub selection: Selection,
}

/// Partial update of [`TableUi`]; unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiUpdate {
    pub search: Option<SearchState>,
    pub dense_view: Option<bool>,
    pub open_reconcile_dialog: Option<bool>,
    pub open_metadata_dialog: Option<bool>,
    pub open_export_dialog: Option<bool>,
    pub selection: Option<Selection>,
}

impl TableUi {
    pub fn merge(&mut self, update: UiUpdate) {
        if let Some(search) = update.search {
            self.search = search;
        }
        if let Some(v) = update.dense_view {
            self.dense_view = v;
        }
        if let Some(v) = update.open_reconcile_dialog {
            self.open_reconcile_dialog = v;
        }
        if let Some(v) = update.open_metadata_dialog {
            self.open_metadata_dialog = v;
        }
        if let Some(v) = update.open_export_dialog {
            self.open_export_dialog = v;
        }
        if let Some(selection) = update.selection {
            self.selection = selection;
        }
    }
}
