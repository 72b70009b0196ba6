//! Change notifications emitted by the table store.
//!
//! Front-ends drain these after each operation instead of diffing state
//! themselves. Tests use them to check which operations touched history.

use annotab_core::CellKey;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// An operation changed the store.
    Changed {
        op: &'static str,
        /// Whether the change was recorded in history.
        undoable: bool,
    },
    /// The most recent history entry was reverted.
    Undone { op: &'static str },
    /// A reverted history entry was reapplied.
    Redone { op: &'static str },
    /// A table replaced the store contents.
    Loaded { rows: usize, columns: usize },
    /// The table was persisted under this id.
    Saved { id: String },
    /// A merge skipped a cell that no longer exists.
    StaleSkipped { key: CellKey },
}

/// Collects store events until drained.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<StoreEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: StoreEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[StoreEvent] {
        &self.events
    }

    /// Take every collected event, leaving the collector empty.
    pub fn drain(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Operation names of the `Changed` events, in order.
    pub fn changed(&self) -> Vec<&'static str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                StoreEvent::Changed { op, .. } => Some(*op),
                _ => None,
            })
            .collect()
    }

    /// Keys skipped as stale by merges.
    pub fn stale_skipped(&self) -> Vec<&CellKey> {
        self.events
            .iter()
            .filter_map(|e| match e {
                StoreEvent::StaleSkipped { key } => Some(key),
                _ => None,
            })
            .collect()
    }
}
