use serde::{Deserialize, Serialize};

use annotab_core::RowId;

/// A candidate entity proposed for a cell by a reconciliation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataCandidate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    pub score: f64,
    #[serde(rename = "match", default)]
    pub matched: bool,
}

impl MetadataCandidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>, score: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: String::new(),
            score,
            matched: false,
        }
    }
}

/// The service that produced a cell's candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliatorRef {
    pub id: String,
    pub name: String,
}

impl ReconciliatorRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconciliator: Option<ReconciliatorRef>,
    #[serde(default)]
    pub values: Vec<MetadataCandidate>,
}

impl CellMetadata {
    pub fn matched(&self) -> Option<&MetadataCandidate> {
        self.values.iter().find(|m| m.matched)
    }

    pub fn has_match(&self) -> bool {
        self.values.iter().any(|m| m.matched)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// How a cell's current match was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    /// Picked by the user.
    Manual,
    /// Picked by auto-matching against a score threshold.
    Threshold,
    /// Marked as matched by the reconciliation service itself.
    Reconciliator,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    pub value: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<MatchReason>,
}

/// Summary of a cell's annotation, derived from its metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationMeta {
    pub annotated: bool,
    #[serde(rename = "match")]
    pub match_info: MatchInfo,
    pub highest_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub row_id: RowId,
    pub label: String,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub expanded: bool,
    #[serde(default)]
    pub annotation_meta: AnnotationMeta,
    #[serde(default)]
    pub metadata: CellMetadata,
}

impl Cell {
    pub fn new(row_id: RowId, label: impl Into<String>) -> Self {
        Self {
            row_id,
            label: label.into(),
            editable: false,
            expanded: false,
            annotation_meta: AnnotationMeta::default(),
            metadata: CellMetadata::default(),
        }
    }

    pub fn is_matched(&self) -> bool {
        self.metadata.has_match()
    }

    pub fn has_metadata(&self) -> bool {
        !self.metadata.is_empty()
    }

    /// Recompute `annotation_meta` after the candidates changed.
    /// `reason` is recorded only when a candidate ends up matched.
    pub fn refresh_annotation(&mut self, reason: MatchReason) {
        let matched = self.metadata.has_match();
        let highest_score = self
            .metadata
            .values
            .iter()
            .map(|m| m.score)
            .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))))
            .unwrap_or(0.0);
        self.annotation_meta = AnnotationMeta {
            annotated: !self.metadata.is_empty(),
            match_info: MatchInfo {
                value: matched,
                reason: matched.then_some(reason),
            },
            highest_score,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_with(values: Vec<MetadataCandidate>) -> Cell {
        let mut cell = Cell::new(RowId::from("r1"), "Rome");
        cell.metadata.values = values;
        cell
    }

    #[test]
    fn refresh_annotation_tracks_metadata() {
        let mut q1 = MetadataCandidate::new("Q1", "Rome", 0.9);
        q1.matched = true;
        let mut cell = cell_with(vec![q1, MetadataCandidate::new("Q2", "Roma", 0.4)]);
        cell.refresh_annotation(MatchReason::Manual);

        assert!(cell.annotation_meta.annotated);
        assert!(cell.annotation_meta.match_info.value);
        assert_eq!(cell.annotation_meta.match_info.reason, Some(MatchReason::Manual));
        assert_eq!(cell.annotation_meta.highest_score, 0.9);
    }

    #[test]
    fn refresh_annotation_without_match_has_no_reason() {
        let mut cell = cell_with(vec![MetadataCandidate::new("Q2", "Roma", 0.4)]);
        cell.refresh_annotation(MatchReason::Threshold);
        assert!(cell.annotation_meta.annotated);
        assert!(!cell.annotation_meta.match_info.value);
        assert_eq!(cell.annotation_meta.match_info.reason, None);
    }

    #[test]
    fn empty_metadata_resets_annotation() {
        let mut cell = cell_with(vec![]);
        cell.refresh_annotation(MatchReason::Reconciliator);
        assert_eq!(cell.annotation_meta, AnnotationMeta::default());
    }

    #[test]
    fn candidate_serializes_match_field() {
        let mut m = MetadataCandidate::new("Q1", "Rome", 0.5);
        m.matched = true;
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["match"], true);
        assert_eq!(json["score"], 0.5);
    }
}
