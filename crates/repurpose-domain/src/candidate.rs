//! Drug-repurposing candidates: the workflow's terminal hypothesis type.

use serde::{Deserialize, Serialize};

use crate::citation::Citation;
use crate::entity::Entity;
use crate::evidence::Evidence;
use crate::path::PathwayPath;

/// A (drug, disease) repurposing hypothesis, backed by zero or more
/// mechanism paths and pieces of evidence, carrying scores and an optional
/// rank assigned by the ranking stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub drug: Entity,
    pub disease: Entity,
    pub hypothesis: String,
    pub mechanism_summary: String,
    pub overall_score: f64,
    pub confidence: f64,
    pub novelty: f64,
    pub mechanism_paths: Vec<PathwayPath>,
    pub evidence: Vec<Evidence>,
    pub citations: Vec<Citation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

impl Candidate {
    /// §3 invariant: confidence must not exceed overall_score whenever the
    /// score includes a simulation term. Callers that compute overall_score
    /// from `plausibility` should clamp confidence accordingly before
    /// constructing the candidate; this just checks the invariant holds.
    pub fn confidence_within_score(&self) -> bool {
        self.confidence <= self.overall_score + f64::EPSILON
    }

    pub fn evidence_count(&self) -> usize {
        self.evidence.len()
    }
}
