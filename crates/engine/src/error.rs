use std::fmt;

use annotab_core::{CellKey, CellKeyError, ColumnId, RowId, SEPARATOR};

/// Data-integrity failure of a store operation. The store is left unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    MalformedKey(CellKeyError),
    UnknownCell(CellKey),
    UnknownRow(RowId),
    UnknownColumn(ColumnId),
    /// The cell has no candidate with this id.
    UnknownCandidate { key: CellKey, id: String },
    /// An extension tried to add a column that already exists.
    DuplicateColumn(ColumnId),
    /// A new column id is empty or contains the cell-key separator.
    InvalidColumnId(ColumnId),
    /// The save backend rejected the table.
    Sink(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedKey(e) => write!(f, "{e}"),
            Self::UnknownCell(key) => write!(f, "unknown cell: {key}"),
            Self::UnknownRow(id) => write!(f, "unknown row: {id}"),
            Self::UnknownColumn(id) => write!(f, "unknown column: {id}"),
            Self::UnknownCandidate { key, id } => {
                write!(f, "cell {key} has no candidate '{id}'")
            }
            Self::DuplicateColumn(id) => write!(f, "column already exists: {id}"),
            Self::InvalidColumnId(id) => {
                write!(f, "invalid column id '{id}': must be non-empty and without '{SEPARATOR}'")
            }
            Self::Sink(msg) => write!(f, "save failed: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<CellKeyError> for StoreError {
    fn from(e: CellKeyError) -> Self {
        Self::MalformedKey(e)
    }
}
