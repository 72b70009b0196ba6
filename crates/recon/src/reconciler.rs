//! Request building, service calls and completion delivery.
//!
//! `prepare_*` reads the store, `run_*` awaits the service with nothing
//! borrowed, and `deliver_*` merges the answer. Completions may be
//! delivered in any order; keys that went stale meanwhile are skipped by
//! the store.

use std::collections::BTreeMap;

use annotab_config::Settings;
use annotab_core::{CellKey, ColumnId};
use annotab_engine::{
    ExtensionBatch, MergeReport, ReconciliationBatch, ReconciliatorRef, TableStore,
};

use crate::error::ReconError;
use crate::model::{decode_results, MatchedCell, ReconRequestItem, ServiceResultItem};
use crate::requests::{RequestId, RequestKind, RequestTracker};
use crate::service::{ExtensionService, ReconciliationService, ServiceError};

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileRequest {
    pub id: RequestId,
    pub reconciliator: ReconciliatorRef,
    pub endpoint: String,
    pub items: Vec<ReconRequestItem>,
}

/// Answer to a [`ReconcileRequest`], ready for delivery.
#[derive(Debug, Clone)]
pub struct Completion {
    pub request: RequestId,
    pub reconciliator: ReconciliatorRef,
    pub result: Result<Vec<ServiceResultItem>, ServiceError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtendRequest {
    pub id: RequestId,
    pub endpoint: String,
    pub params: serde_json::Value,
    pub columns: BTreeMap<ColumnId, Vec<MatchedCell>>,
}

#[derive(Debug, Clone)]
pub struct ExtensionCompletion {
    pub request: RequestId,
    pub result: Result<ExtensionBatch, ServiceError>,
}

/// Drives reconciliation and extension requests against the store.
#[derive(Debug, Default)]
pub struct Reconciler {
    requests: RequestTracker,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> &RequestTracker {
        &self.requests
    }

    /// Give up on a pending request. Its completion, if it ever arrives,
    /// is discarded without touching the store.
    pub fn cancel(&mut self, id: RequestId) -> bool {
        self.requests.cancel(id)
    }

    // ------------------------------------------------------------------
    // Reconciliation
    // ------------------------------------------------------------------

    /// Build a request for the selected cells and register it as pending.
    pub fn prepare(
        &mut self,
        store: &TableStore,
        settings: &Settings,
        reconciliator_id: &str,
    ) -> Result<ReconcileRequest, ReconError> {
        let service = settings
            .services
            .reconciliator(reconciliator_id)
            .ok_or_else(|| ReconError::UnknownService(reconciliator_id.to_string()))?;

        let items: Vec<ReconRequestItem> = store
            .reconciliation_cells()
            .into_iter()
            .map(|c| ReconRequestItem { id: c.id, label: c.label })
            .collect();
        if items.is_empty() {
            return Err(ReconError::NothingSelected);
        }

        let id = self.requests.begin(RequestKind::Reconcile);
        log::debug!("reconcile {id}: {} cell(s) via {}", items.len(), service.id);
        Ok(ReconcileRequest {
            id,
            reconciliator: ReconciliatorRef::new(service.id.clone(), service.name.clone()),
            endpoint: settings.endpoint(&service.relative_url),
            items,
        })
    }

    pub async fn run<S: ReconciliationService>(service: &S, request: ReconcileRequest) -> Completion {
        let result = service.reconcile(&request.endpoint, &request.items).await;
        Completion {
            request: request.id,
            reconciliator: request.reconciliator,
            result,
        }
    }

    /// Merge a completion into the store as one undoable step.
    pub fn deliver(
        &mut self,
        store: &mut TableStore,
        completion: Completion,
    ) -> Result<MergeReport, ReconError> {
        let Completion { request, reconciliator, result } = completion;
        if self.requests.take_cancelled(request) {
            return Err(ReconError::Cancelled(request));
        }

        let items = match result {
            Ok(items) => items,
            Err(e) => {
                self.requests.fail(request, e.to_string());
                return Err(e.into());
            }
        };

        let items = match decode_results(items) {
            Ok(items) => items,
            Err(e) => {
                self.requests.fail(request, e.to_string());
                return Err(e.into());
            }
        };

        match store.apply_reconciliation(ReconciliationBatch { reconciliator, items }, true) {
            Ok(report) => {
                self.requests.complete(request);
                Ok(report)
            }
            Err(e) => {
                self.requests.fail(request, e.to_string());
                Err(e.into())
            }
        }
    }

    /// Prepare, run and deliver in one go.
    pub async fn reconcile<S: ReconciliationService>(
        &mut self,
        service: &S,
        store: &mut TableStore,
        settings: &Settings,
        reconciliator_id: &str,
    ) -> Result<MergeReport, ReconError> {
        let request = self.prepare(store, settings, reconciliator_id)?;
        let completion = Self::run(service, request).await;
        self.deliver(store, completion)
    }

    // ------------------------------------------------------------------
    // Extension
    // ------------------------------------------------------------------

    /// Build an extension request from the matched cells of the selected
    /// columns.
    pub fn prepare_extension(
        &mut self,
        store: &TableStore,
        settings: &Settings,
        extender_id: &str,
        params: serde_json::Value,
    ) -> Result<ExtendRequest, ReconError> {
        let service = settings
            .services
            .extender(extender_id)
            .ok_or_else(|| ReconError::UnknownService(extender_id.to_string()))?;

        let selected = store.selected_columns();
        if selected.is_empty() {
            return Err(ReconError::NothingSelected);
        }

        let mut columns = BTreeMap::new();
        for column in selected {
            let matched: Vec<MatchedCell> = store
                .rows()
                .filter_map(|row| {
                    let entity = row.cells.get(column)?.metadata.matched()?;
                    Some(MatchedCell {
                        id: CellKey::new(row.id.clone(), column.clone()),
                        entity: entity.id.clone(),
                    })
                })
                .collect();
            columns.insert(column.clone(), matched);
        }

        let id = self.requests.begin(RequestKind::Extend);
        log::debug!("extend {id}: {} column(s) via {}", columns.len(), service.id);
        Ok(ExtendRequest {
            id,
            endpoint: settings.endpoint(&service.relative_url),
            params,
            columns,
        })
    }

    pub async fn run_extension<S: ExtensionService>(
        service: &S,
        request: ExtendRequest,
    ) -> ExtensionCompletion {
        let result = service
            .extend(&request.endpoint, &request.params, &request.columns)
            .await;
        ExtensionCompletion {
            request: request.id,
            result,
        }
    }

    pub fn deliver_extension(
        &mut self,
        store: &mut TableStore,
        completion: ExtensionCompletion,
    ) -> Result<MergeReport, ReconError> {
        if self.requests.take_cancelled(completion.request) {
            return Err(ReconError::Cancelled(completion.request));
        }
        let outcome = completion
            .result
            .map_err(ReconError::from)
            .and_then(|batch| store.apply_extension(batch, true).map_err(ReconError::from));
        match &outcome {
            Ok(_) => self.requests.complete(completion.request),
            Err(e) => self.requests.fail(completion.request, e.to_string()),
        }
        outcome
    }

    pub async fn extend<S: ExtensionService>(
        &mut self,
        service: &S,
        store: &mut TableStore,
        settings: &Settings,
        extender_id: &str,
        params: serde_json::Value,
    ) -> Result<MergeReport, ReconError> {
        let request = self.prepare_extension(store, settings, extender_id, params)?;
        let completion = Self::run_extension(service, request).await;
        self.deliver_extension(store, completion)
    }
}
