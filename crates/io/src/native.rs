// Saved tables in a SQLite file

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use annotab_engine::{LoadedTable, TableSink, TableSnapshot};

use crate::{IoError, NATIVE_FORMAT_VERSION};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tables (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    last_modified TEXT,           -- RFC 3339, NULL when never modified
    payload TEXT NOT NULL         -- JSON snapshot
);

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// One row of [`SqliteSink::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedTable {
    pub id: String,
    pub name: String,
    pub last_modified: Option<String>,
}

/// A table store backed by one SQLite file. Each table is kept as an opaque
/// JSON snapshot keyed by id.
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    pub fn open(path: &Path) -> Result<Self, IoError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, IoError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, IoError> {
        conn.execute_batch(SCHEMA)?;

        let version: Option<String> = conn
            .query_row("SELECT value FROM meta WHERE key = 'format_version'", [], |row| row.get(0))
            .optional()?;
        match version {
            None => {
                conn.execute(
                    "INSERT INTO meta (key, value) VALUES ('format_version', ?1)",
                    params![NATIVE_FORMAT_VERSION.to_string()],
                )?;
            }
            Some(v) if v.parse::<u32>().ok() > Some(NATIVE_FORMAT_VERSION) => {
                return Err(IoError::Invalid(format!(
                    "table store format {v} is newer than supported ({NATIVE_FORMAT_VERSION})"
                )));
            }
            Some(_) => {}
        }

        Ok(Self { conn })
    }

    pub fn load(&self, id: &str) -> Result<LoadedTable, IoError> {
        let payload: Option<String> = self
            .conn
            .query_row("SELECT payload FROM tables WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?;
        let payload = payload.ok_or_else(|| IoError::NotFound(id.to_string()))?;
        Ok(serde_json::from_str(&payload)?)
    }

    /// Saved tables, most recently modified first.
    pub fn list(&self) -> Result<Vec<SavedTable>, IoError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, last_modified FROM tables ORDER BY last_modified DESC, id")?;
        let rows = stmt.query_map([], |row| {
            Ok(SavedTable {
                id: row.get(0)?,
                name: row.get(1)?,
                last_modified: row.get(2)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Returns false when no table had this id.
    pub fn remove(&self, id: &str) -> Result<bool, IoError> {
        let n = self.conn.execute("DELETE FROM tables WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }
}

impl TableSink for SqliteSink {
    type Error = IoError;

    fn save(&mut self, snapshot: &TableSnapshot) -> Result<String, IoError> {
        let id = snapshot
            .table
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut stored = snapshot.clone();
        stored.table.id = Some(id.clone());
        let payload = serde_json::to_string(&stored)?;
        let last_modified = stored.table.last_modified_date.map(|d| d.to_rfc3339());

        self.conn.execute(
            "INSERT OR REPLACE INTO tables (id, name, last_modified, payload) VALUES (?1, ?2, ?3, ?4)",
            params![id, stored.table.name, last_modified, payload],
        )?;
        log::debug!("stored table {id} ({} bytes)", payload.len());
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::convert_from_csv;
    use tempfile::NamedTempFile;

    #[test]
    fn save_assigns_id_and_load_returns_snapshot() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        let table = convert_from_csv("City\nRome\n", None).unwrap();

        let id = sink.save(&table).unwrap();
        assert_eq!(id.len(), 36);

        let loaded = sink.load(&id).unwrap();
        assert_eq!(loaded.table.id.as_deref(), Some(id.as_str()));
        assert_eq!(loaded.rows, table.rows);
        assert_eq!(loaded.columns, table.columns);
    }

    #[test]
    fn saving_with_id_overwrites() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        let mut table = convert_from_csv("City\nRome\n", None).unwrap();
        table.table.id = Some("t1".into());
        table.table.name = "first".into();
        sink.save(&table).unwrap();
        table.table.name = "second".into();
        sink.save(&table).unwrap();

        let list = sink.list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "second");
    }

    #[test]
    fn unknown_id_is_not_found() {
        let sink = SqliteSink::open_in_memory().unwrap();
        assert!(matches!(sink.load("nope"), Err(IoError::NotFound(_))));
        assert!(!sink.remove("nope").unwrap());
    }

    #[test]
    fn file_store_persists_across_connections() {
        let file = NamedTempFile::new().unwrap();
        let id = {
            let mut sink = SqliteSink::open(file.path()).unwrap();
            let table = convert_from_csv("City\nRome\n", None).unwrap();
            sink.save(&table).unwrap()
        };
        let sink = SqliteSink::open(file.path()).unwrap();
        assert!(sink.load(&id).is_ok());
    }
}
