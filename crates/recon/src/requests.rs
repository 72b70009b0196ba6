//! Lifecycle of outstanding service requests.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Reconcile,
    Extend,
    Save,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    Done,
    Failed(String),
    /// Dropped by the user. A late completion is discarded.
    Cancelled,
}

/// Aggregate view of one request kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestStatus {
    /// Some request of this kind is still pending.
    pub loading: bool,
    /// Message of the last finished request of this kind, when it failed.
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
struct Entry {
    kind: RequestKind,
    state: RequestState,
}

/// Pending and cancelled requests plus the last finished request of each
/// kind. Older finished entries are pruned.
#[derive(Debug, Default)]
pub struct RequestTracker {
    by_id: BTreeMap<RequestId, Entry>,
    /// Finished requests in completion order, at most one per kind.
    finished: Vec<RequestId>,
    next_id: u64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending request.
    pub fn begin(&mut self, kind: RequestKind) -> RequestId {
        self.next_id += 1;
        let id = RequestId(self.next_id);
        self.by_id.insert(
            id,
            Entry {
                kind,
                state: RequestState::Pending,
            },
        );
        id
    }

    pub fn complete(&mut self, id: RequestId) {
        self.finish(id, RequestState::Done);
    }

    pub fn fail(&mut self, id: RequestId, message: impl Into<String>) {
        self.finish(id, RequestState::Failed(message.into()));
    }

    /// Stop waiting for a pending request. Loading clears and no error is
    /// recorded. Returns false when the request is not pending.
    pub fn cancel(&mut self, id: RequestId) -> bool {
        match self.by_id.get_mut(&id) {
            Some(entry) if entry.state == RequestState::Pending => {
                entry.state = RequestState::Cancelled;
                log::debug!("request {id} cancelled");
                true
            }
            _ => false,
        }
    }

    /// True when `id` was cancelled; its completion must be discarded. The
    /// entry is forgotten.
    pub fn take_cancelled(&mut self, id: RequestId) -> bool {
        match self.by_id.get(&id) {
            Some(entry) if entry.state == RequestState::Cancelled => {
                self.by_id.remove(&id);
                true
            }
            _ => false,
        }
    }

    fn finish(&mut self, id: RequestId, state: RequestState) {
        let kind = match self.by_id.get_mut(&id) {
            Some(entry) if entry.state == RequestState::Pending => {
                entry.state = state;
                entry.kind
            }
            Some(entry) if entry.state == RequestState::Cancelled => {
                log::debug!("request {id} finished after cancel; ignored");
                return;
            }
            Some(_) => {
                log::warn!("request {id} finished twice");
                return;
            }
            None => {
                log::warn!("unknown request {id}");
                return;
            }
        };

        let by_id = &mut self.by_id;
        self.finished.retain(|old| match by_id.get(old) {
            Some(entry) if entry.kind == kind => {
                by_id.remove(old);
                false
            }
            _ => true,
        });
        self.finished.push(id);
    }

    /// Number of requests still remembered.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn state(&self, id: RequestId) -> Option<&RequestState> {
        self.by_id.get(&id).map(|e| &e.state)
    }

    pub fn status(&self, kind: RequestKind) -> RequestStatus {
        let loading = self
            .by_id
            .values()
            .any(|e| e.kind == kind && e.state == RequestState::Pending);
        let error = self
            .finished
            .iter()
            .rev()
            .filter_map(|id| self.by_id.get(id))
            .find(|e| e.kind == kind)
            .and_then(|e| match &e.state {
                RequestState::Failed(msg) => Some(msg.clone()),
                _ => None,
            });
        RequestStatus { loading, error }
    }
}
