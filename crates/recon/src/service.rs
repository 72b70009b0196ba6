use std::collections::BTreeMap;
use std::fmt;

use annotab_core::ColumnId;
use annotab_engine::ExtensionBatch;

use crate::model::{MatchedCell, ReconRequestItem, ServiceResultItem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The request never got an answer.
    Transport(String),
    /// The service answered with a failure status.
    Status { code: u16, message: String },
    /// The answer could not be decoded.
    Decode(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::Status { code, message } => write!(f, "status {code}: {message}"),
            Self::Decode(msg) => write!(f, "decode: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {}

/// An entity-linking backend.
#[allow(async_fn_in_trait)]
pub trait ReconciliationService {
    async fn reconcile(
        &self,
        endpoint: &str,
        items: &[ReconRequestItem],
    ) -> Result<Vec<ServiceResultItem>, ServiceError>;
}

/// A backend that derives new columns from matched entities.
#[allow(async_fn_in_trait)]
pub trait ExtensionService {
    async fn extend(
        &self,
        endpoint: &str,
        params: &serde_json::Value,
        columns: &BTreeMap<ColumnId, Vec<MatchedCell>>,
    ) -> Result<ExtensionBatch, ServiceError>;
}
