use crate::table::TableSnapshot;

/// A backend that persists table snapshots.
pub trait TableSink {
    type Error: std::fmt::Display;

    /// Persist `snapshot` and return its id. A snapshot whose table already
    /// carries an id should be stored under that id.
    fn save(&mut self, snapshot: &TableSnapshot) -> Result<String, Self::Error>;
}

/// Keeps saved snapshots in memory. Handy for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub saved: Vec<(String, TableSnapshot)>,
}

impl TableSink for MemorySink {
    type Error = std::convert::Infallible;

    fn save(&mut self, snapshot: &TableSnapshot) -> Result<String, Self::Error> {
        let id = match &snapshot.table.id {
            Some(id) => id.clone(),
            None => format!("mem-{}", self.saved.len() + 1),
        };
        self.saved.retain(|(existing, _)| existing != &id);
        self.saved.push((id.clone(), snapshot.clone()));
        Ok(id)
    }
}
