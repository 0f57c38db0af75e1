//! The scoring model contract (§4.B).

use async_trait::async_trait;

use repurpose_domain::error::RepurposeResult;

/// Three pairwise semantic scores plus an aggregate, all in `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct RelationScore {
    pub drug_target_score: f64,
    pub target_disease_score: f64,
    pub drug_disease_score: f64,
    pub aggregate: f64,
}

/// Black-box semantic scoring, treated as an opaque model by the core.
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Score how plausible a drug → target → disease mechanism is, given
    /// optional free-text context (e.g. an evidence snippet).
    async fn score_relation(
        &self,
        drug: &str,
        target: &str,
        disease: &str,
        context: Option<&str>,
    ) -> RepurposeResult<RelationScore>;

    /// Score how well a piece of evidence text supports a hypothesis.
    async fn score_evidence(&self, text: &str, hypothesis: &str) -> RepurposeResult<f64>;
}
