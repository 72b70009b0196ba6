//! `annotab-recon`: drives reconciliation and extension services.
//!
//! Requests are built from a read-only look at the store, the service is
//! awaited without holding the store, and completions are delivered back
//! in whatever order they finish.

pub mod error;
pub mod model;
pub mod reconciler;
pub mod requests;
pub mod service;

pub use error::ReconError;
pub use model::{decode_results, MatchedCell, ReconRequestItem, ServiceResultItem};
pub use reconciler::{
    Completion, ExtendRequest, ExtensionCompletion, ReconcileRequest, Reconciler,
};
pub use requests::{RequestId, RequestKind, RequestState, RequestStatus, RequestTracker};
pub use service::{ExtensionService, ReconciliationService, ServiceError};
