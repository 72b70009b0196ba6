use serde::{Deserialize, Serialize};

use annotab_core::{CellKey, CellKeyError};
use annotab_engine::{CellUpdate, MetadataCandidate};

/// One cell sent to a reconciliation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconRequestItem {
    pub id: CellKey,
    pub label: String,
}

/// One entry of a reconciliation response, as the service sent it.
///
/// `id` stays a plain string until delivery so that a malformed key can be
/// reported instead of failing the whole response decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResultItem {
    pub id: String,
    #[serde(default)]
    pub metadata: Vec<MetadataCandidate>,
}

/// A matched cell handed to an extension service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedCell {
    pub id: CellKey,
    /// Id of the matched entity.
    pub entity: String,
}

/// Turn raw service entries into store updates. The first malformed key
/// fails the whole response.
pub fn decode_results(items: Vec<ServiceResultItem>) -> Result<Vec<CellUpdate>, CellKeyError> {
    items
        .into_iter()
        .map(|item| {
            CellKey::parse(&item.id).map(|key| CellUpdate {
                key,
                metadata: item.metadata,
            })
        })
        .collect()
}
