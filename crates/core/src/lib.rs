//! `annotab-core`: identifiers and selection sets shared by every other crate.

pub mod cell_key;
pub mod selection;

pub use cell_key::{CellKey, CellKeyError, ColumnId, RowId, SEPARATOR};
pub use selection::{Selection, SelectionSet};
