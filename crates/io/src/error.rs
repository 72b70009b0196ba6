use std::fmt;

#[derive(Debug)]
pub enum IoError {
    /// File system error.
    Io(String),
    /// Malformed delimited text.
    Csv(String),
    /// Malformed or mismatched JSON.
    Json(String),
    /// SQLite failure.
    Sqlite(String),
    /// No saved table with this id.
    NotFound(String),
    /// Input that parses but cannot become a table.
    Invalid(String),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Json(msg) => write!(f, "JSON error: {msg}"),
            Self::Sqlite(msg) => write!(f, "SQLite error: {msg}"),
            Self::NotFound(id) => write!(f, "no saved table with id '{id}'"),
            Self::Invalid(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for IoError {}

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<::csv::Error> for IoError {
    fn from(e: ::csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

impl From<rusqlite::Error> for IoError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e.to_string())
    }
}
