use std::fmt;

use annotab_core::CellKeyError;
use annotab_engine::StoreError;

use crate::requests::RequestId;
use crate::service::ServiceError;

#[derive(Debug)]
pub enum ReconError {
    /// No reconciliator or extender with this id is configured.
    UnknownService(String),
    /// The request would be empty.
    NothingSelected,
    /// The service call failed. The store was not touched.
    Service(ServiceError),
    /// The service returned an id that is not a cell key.
    MalformedKey(CellKeyError),
    /// The store rejected the merge.
    Store(StoreError),
    /// The request was cancelled; its completion was discarded.
    Cancelled(RequestId),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownService(id) => write!(f, "unknown service: {id}"),
            Self::NothingSelected => write!(f, "nothing selected"),
            Self::Service(e) => write!(f, "service error: {e}"),
            Self::MalformedKey(e) => write!(f, "service returned {e}"),
            Self::Store(e) => write!(f, "merge failed: {e}"),
            Self::Cancelled(id) => write!(f, "request {id} was cancelled"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<ServiceError> for ReconError {
    fn from(e: ServiceError) -> Self {
        Self::Service(e)
    }
}

impl From<CellKeyError> for ReconError {
    fn from(e: CellKeyError) -> Self {
        Self::MalformedKey(e)
    }
}

impl From<StoreError> for ReconError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}
