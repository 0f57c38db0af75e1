//! Evidence items: the unit of support behind a mechanism path or candidate.

use serde::{Deserialize, Serialize};

use crate::citation::Citation;

/// What kind of support an `Evidence` item represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Literature,
    GraphPath,
    ClinicalTrial,
    Mechanism,
}

impl EvidenceKind {
    /// Canonical lowercase wire name (§3), e.g. for the submit-query
    /// response projection (§6).
    pub fn as_str(self) -> &'static str {
        match self {
            EvidenceKind::Literature => "literature",
            EvidenceKind::GraphPath => "graph_path",
            EvidenceKind::ClinicalTrial => "clinical_trial",
            EvidenceKind::Mechanism => "mechanism",
        }
    }
}

/// One piece of support for a candidate: a literature finding, a graph path,
/// a clinical trial record, or a mechanistic rationale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub id: String,
    pub kind: EvidenceKind,
    pub description: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation: Option<Citation>,
    /// Set when this evidence item supports a specific mechanism path,
    /// referenced by that path's id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mechanism_path_id: Option<String>,
    /// Normalized entity names this evidence item mentions, used by the
    /// pathway simulator's evidence-support scoring (§4.F).
    #[serde(default)]
    pub entities_mentioned: Vec<String>,
}
