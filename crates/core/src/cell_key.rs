//! Identifiers for rows, columns and cells.
//!
//! Rows and columns carry opaque string ids handed out by the format
//! converter. A cell is addressed by the pair, encoded as `row$column`.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separator between the row and column halves of an encoded cell key.
/// Raw row/column ids never contain it.
pub const SEPARATOR: char = '$';

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Stable id of a row.
    RowId
);

string_id!(
    /// Stable id of a column.
    ColumnId
);

/// Error decoding an encoded cell key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellKeyError {
    /// The key does not contain exactly one separator, or one side is empty.
    Malformed(String),
}

impl fmt::Display for CellKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(key) => write!(f, "malformed cell key '{key}'"),
        }
    }
}

impl std::error::Error for CellKeyError {}

/// Address of one cell: the row it lives in and the column it belongs to.
///
/// Serialized as the encoded `row$column` string.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellKey {
    pub row: RowId,
    pub column: ColumnId,
}

impl CellKey {
    pub fn new(row: impl Into<RowId>, column: impl Into<ColumnId>) -> Self {
        Self {
            row: row.into(),
            column: column.into(),
        }
    }

    /// Decode a `row$column` key.
    pub fn parse(key: &str) -> Result<Self, CellKeyError> {
        let (row, column) = decode(key)?;
        Ok(Self { row, column })
    }

    pub fn encode(&self) -> String {
        encode(&self.row, &self.column)
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.row, SEPARATOR, self.column)
    }
}

impl FromStr for CellKey {
    type Err = CellKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CellKey {
    type Error = CellKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CellKey> for String {
    fn from(key: CellKey) -> Self {
        key.encode()
    }
}

/// Join a row id and a column id into a cell key.
pub fn encode(row: &RowId, column: &ColumnId) -> String {
    debug_assert!(!row.as_str().contains(SEPARATOR));
    debug_assert!(!column.as_str().contains(SEPARATOR));
    format!("{row}{SEPARATOR}{column}")
}

/// Split a cell key into its row and column ids.
pub fn decode(key: &str) -> Result<(RowId, ColumnId), CellKeyError> {
    let mut parts = key.split(SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(row), Some(column), None) if !row.is_empty() && !column.is_empty() => {
            Ok((RowId::from(row), ColumnId::from(column)))
        }
        _ => Err(CellKeyError::Malformed(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_joins_with_separator() {
        let key = encode(&RowId::from("r1"), &ColumnId::from("c1"));
        assert_eq!(key, "r1$c1");
    }

    #[test]
    fn decode_splits_key() {
        let (row, col) = decode("r12$name").unwrap();
        assert_eq!(row.as_str(), "r12");
        assert_eq!(col.as_str(), "name");
    }

    #[test]
    fn decode_rejects_wrong_separator_count() {
        assert_eq!(decode("r1c1"), Err(CellKeyError::Malformed("r1c1".into())));
        assert!(decode("r1$c1$x").is_err());
        assert!(decode("").is_err());
    }

    #[test]
    fn decode_rejects_empty_halves() {
        assert!(decode("$c1").is_err());
        assert!(decode("r1$").is_err());
    }

    #[test]
    fn cell_key_display_round_trips() {
        let key = CellKey::new("r3", "city");
        assert_eq!(key.to_string(), "r3$city");
        assert_eq!("r3$city".parse::<CellKey>().unwrap(), key);
    }

    #[test]
    fn cell_key_serializes_as_string() {
        let key = CellKey::new("r1", "c2");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"r1$c2\"");

        let back: CellKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);

        let bad: Result<CellKey, _> = serde_json::from_str("\"r1c2\"");
        assert!(bad.is_err());
    }

    #[test]
    fn ids_borrow_as_str() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(RowId::from("r1"), 1);
        assert_eq!(map.get("r1"), Some(&1));
    }
}
