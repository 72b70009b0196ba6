pub mod cell;
pub mod delete;
pub mod error;
pub mod events;
pub mod extension;
pub mod history;
pub mod matcher;
pub mod ops;
pub mod patch;
pub mod reconcile;
pub mod selectors;
pub mod sink;
pub mod status;
pub mod store;
pub mod table;
pub mod ui;

#[cfg(test)]
mod fixtures;

pub use cell::{AnnotationMeta, Cell, CellMetadata, MatchReason, MetadataCandidate, ReconciliatorRef};
pub use error::StoreError;
pub use events::{EventCollector, StoreEvent};
pub use extension::{ExtendedColumn, ExtensionBatch, ExtensionCell};
pub use history::{History, HistoryError};
pub use ops::{OpOutcome, StoreOp};
pub use reconcile::{CellUpdate, MergeReport, ReconciliationBatch};
pub use selectors::ReconciliationCell;
pub use sink::{MemorySink, TableSink};
pub use store::{TableState, TableStore, TableUpdate, DEFAULT_MATCHING_THRESHOLD};
pub use table::{
    Column, ColumnStatus, Entities, FileFormat, LoadedTable, Row, TableInstance, TableSnapshot,
    TableType,
};
pub use ui::{SearchState, TableUi, UiUpdate};
